//! Reference ellipsoids and the conformal-latitude helpers shared by the
//! ellipsoidal projections.

use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

/// Reference ellipsoid defined by semi-major axis and flattening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ellipsoid {
    pub name: &'static str,
    /// Semi-major axis (meters)
    pub a: f64,
    /// Flattening
    pub f: f64,
    /// First eccentricity squared: 2f - f^2
    pub e2: f64,
    /// Third flattening: f / (2 - f)
    pub n: f64,
}

impl Ellipsoid {
    pub const fn new(name: &'static str, a: f64, f: f64) -> Self {
        Self {
            name,
            a,
            f,
            e2: 2.0 * f - f * f,
            n: f / (2.0 - f),
        }
    }

    /// First eccentricity. `sqrt` is not const, so it is derived on demand.
    pub fn eccentricity(&self) -> f64 {
        self.e2.sqrt()
    }

    /// Semi-minor axis (meters).
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f)
    }
}

pub const WGS84: Ellipsoid = Ellipsoid::new("WGS 84", 6_378_137.0, 1.0 / 298.257_223_563);
pub const GRS80: Ellipsoid = Ellipsoid::new("GRS 1980", 6_378_137.0, 1.0 / 298.257_222_101);
pub const WGS72: Ellipsoid = Ellipsoid::new("WGS 72", 6_378_135.0, 1.0 / 298.26);
pub const CLARKE_1866: Ellipsoid = Ellipsoid::new("Clarke 1866", 6_378_206.4, 1.0 / 294.978_698_213_898);
pub const INTERNATIONAL_1924: Ellipsoid = Ellipsoid::new("International 1924", 6_378_388.0, 1.0 / 297.0);

/// `m = cos(phi) / sqrt(1 - e^2 sin^2(phi))`.
pub fn msfn(phi: f64, e2: f64) -> f64 {
    let sin_phi = phi.sin();
    phi.cos() / (1.0 - e2 * sin_phi * sin_phi).sqrt()
}

/// Isometric-latitude helper `t = tan(pi/4 - phi/2) / ((1 - e sin phi)/(1 + e sin phi))^(e/2)`.
pub fn tsfn(phi: f64, e: f64) -> f64 {
    let e_sin = e * phi.sin();
    (0.5 * (FRAC_PI_2 - phi)).tan() / ((1.0 - e_sin) / (1.0 + e_sin)).powf(0.5 * e)
}

/// Invert [`tsfn`] by fixed-point iteration.
pub fn phi_from_ts(ts: f64, e: f64) -> f64 {
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..15 {
        let e_sin = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - e_sin) / (1.0 + e_sin)).powf(half_e)).atan();
        let delta = (next - phi).abs();
        phi = next;
        if delta < 1e-14 {
            break;
        }
    }
    phi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_constants() {
        assert!((WGS84.b() - 6_356_752.314_245).abs() < 0.001);
        assert!((WGS84.eccentricity() - 0.081_819_190_842_622).abs() < 1e-12);
        assert!((WGS84.n - 0.001_679_220_386_383_705).abs() < 1e-12);
    }

    #[test]
    fn test_tsfn_roundtrip() {
        let e = GRS80.eccentricity();
        for deg in [-80.0_f64, -45.0, 0.0, 12.5, 46.5, 89.0] {
            let phi = deg.to_radians();
            let back = phi_from_ts(tsfn(phi, e), e);
            assert!((back - phi).abs() < 1e-12, "{deg}: {back} vs {phi}");
        }
    }

    #[test]
    fn test_msfn_equator_is_one() {
        assert!((msfn(0.0, WGS84.e2) - 1.0).abs() < 1e-15);
    }
}
