//! Lambert Conformal Conic projection.
//!
//! Used for national and continental grids such as Lambert-93 (EPSG:2154)
//! and ETRS89 LCC Europe (EPSG:3034). It maps a cone secant to the ellipsoid
//! onto a flat plane.
//!
//! The projection parameters include:
//! - Latitude of false origin (lat0)
//! - Longitude of false origin / central meridian (lon0)
//! - Standard parallel(s): lat1 and lat2 (equal for a tangent cone)
//! - False easting and northing in meters

use crate::ellipsoid::{msfn, phi_from_ts, tsfn, Ellipsoid};
use crate::{finite_or_err, normalize_dlon, Projection};
use overlay_common::OverlayResult;

/// Ellipsoidal Lambert Conformal Conic with two standard parallels.
#[derive(Debug, Clone)]
pub struct LambertConformalConic {
    ellipsoid: Ellipsoid,
    /// Central meridian in radians
    lon0: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the latitude of origin
    rho0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl LambertConformalConic {
    /// Create a two-standard-parallel projection. All angles are in degrees.
    pub fn new_2sp(
        ellipsoid: Ellipsoid,
        lat0_deg: f64,
        lon0_deg: f64,
        lat1_deg: f64,
        lat2_deg: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let lat0 = lat0_deg.to_radians();
        let lat1 = lat1_deg.to_radians();
        let lat2 = lat2_deg.to_radians();
        let e = ellipsoid.eccentricity();

        let m1 = msfn(lat1, ellipsoid.e2);
        let t1 = tsfn(lat1, e);

        // Compute cone constant n
        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            lat1.sin()
        } else {
            // Secant cone (two standard parallels)
            let m2 = msfn(lat2, ellipsoid.e2);
            let t2 = tsfn(lat2, e);
            (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
        };

        let f = m1 / (n * t1.powf(n));
        let rho0 = ellipsoid.a * f * tsfn(lat0, e).powf(n);

        Self {
            ellipsoid,
            lon0: lon0_deg.to_radians(),
            n,
            f,
            rho0,
            false_easting,
            false_northing,
        }
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }
}

impl Projection for LambertConformalConic {
    fn forward(&self, lon: f64, lat: f64) -> OverlayResult<(f64, f64)> {
        let e = self.ellipsoid.eccentricity();
        let rho = self.ellipsoid.a * self.f * tsfn(lat, e).powf(self.n);
        let theta = self.n * normalize_dlon(lon - self.lon0);

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        finite_or_err(x, y, "Lambert conformal conic forward")
    }

    fn inverse(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)> {
        let mut dx = x - self.false_easting;
        let mut dy = self.rho0 - (y - self.false_northing);
        if self.n < 0.0 {
            dx = -dx;
            dy = -dy;
        }

        let rho = dx.hypot(dy);
        let theta = dx.atan2(dy);

        let ts = (rho / (self.ellipsoid.a * self.f)).powf(1.0 / self.n);
        let lat = phi_from_ts(ts, self.ellipsoid.eccentricity());
        let lon = self.lon0 + theta / self.n;
        finite_or_err(lon, lat, "Lambert conformal conic inverse")
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipsoid::GRS80;

    fn lambert93() -> LambertConformalConic {
        LambertConformalConic::new_2sp(GRS80, 46.5, 3.0, 49.0, 44.0, 700_000.0, 6_600_000.0)
    }

    #[test]
    fn test_lambert93_false_origin() {
        let proj = lambert93();
        let (x, y) = proj
            .forward(3f64.to_radians(), 46.5f64.to_radians())
            .unwrap();
        assert!((x - 700_000.0).abs() < 1e-6, "x = {x}");
        assert!((y - 6_600_000.0).abs() < 1e-6, "y = {y}");
    }

    #[test]
    fn test_lambert93_roundtrip() {
        let proj = lambert93();
        // Paris, Brest, Nice, Strasbourg
        for (lon_deg, lat_deg) in [(2.3522, 48.8566), (-4.486, 48.390), (7.262, 43.710), (7.752, 48.573)] {
            let lon = f64::to_radians(lon_deg);
            let lat = f64::to_radians(lat_deg);
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert!((lon2 - lon).abs() < 1e-10, "lon roundtrip failed for {lon_deg}");
            assert!((lat2 - lat).abs() < 1e-10, "lat roundtrip failed for {lat_deg}");
        }
    }

    #[test]
    fn test_tangent_cone_uses_sine_of_parallel() {
        let proj = LambertConformalConic::new_2sp(GRS80, 45.0, 0.0, 45.0, 45.0, 0.0, 0.0);
        assert!((proj.cone_constant() - 45f64.to_radians().sin()).abs() < 1e-12);
    }

    #[test]
    fn test_east_of_meridian_is_positive_x() {
        let proj = lambert93();
        let (x, _) = proj.forward(5f64.to_radians(), 46.5f64.to_radians()).unwrap();
        assert!(x > 700_000.0);
    }
}
