//! Transverse Mercator projection (Krüger series, 6th order).
//!
//! This is the projection underlying all UTM zones. Accuracy is well below a
//! millimeter within a zone and degrades gracefully further from the central
//! meridian.

use crate::ellipsoid::{Ellipsoid, WGS84};
use crate::{finite_or_err, normalize_dlon, Projection};
use overlay_common::OverlayResult;

#[derive(Debug, Clone)]
pub struct TransverseMercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    /// Rectifying radius A = a/(1+n) * (1 + n^2/4 + n^4/64)
    a_hat: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
    /// Rectifying latitude of the origin
    xi0: f64,
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = ellipsoid.n;
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5
                + 7891.0 / 37800.0 * n6,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
                - 1983433.0 / 1935360.0 * n6,
            61.0 / 240.0 * n3 - 103.0 / 140.0 * n4 + 15061.0 / 26880.0 * n5
                + 167603.0 / 181440.0 * n6,
            49561.0 / 161280.0 * n4 - 179.0 / 168.0 * n5 + 6601661.0 / 7257600.0 * n6,
            34729.0 / 80640.0 * n5 - 3418889.0 / 1995840.0 * n6,
            212378941.0 / 319334400.0 * n6,
        ];
        let beta = [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
                + 96199.0 / 604800.0 * n6,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                - 1118711.0 / 3870720.0 * n6,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
            4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5 - 830251.0 / 7257600.0 * n6,
            4583.0 / 161280.0 * n5 - 108847.0 / 3991680.0 * n6,
            20648693.0 / 638668800.0 * n6,
        ];

        // Rectifying latitude of the origin, from the meridional arc series
        let xi0 = lat0
            + (-3.0 / 2.0 * n + 9.0 / 16.0 * n3) * (2.0 * lat0).sin()
            + (15.0 / 16.0 * n2 - 15.0 / 32.0 * n4) * (4.0 * lat0).sin()
            + (-35.0 / 48.0 * n3) * (6.0 * lat0).sin()
            + (315.0 / 512.0 * n4) * (8.0 * lat0).sin();

        Self {
            ellipsoid,
            lon0,
            k0,
            false_easting,
            false_northing,
            a_hat: ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0),
            alpha,
            beta,
            xi0,
        }
    }

    /// UTM zone on the given ellipsoid (zones 1-60).
    pub fn utm(ellipsoid: Ellipsoid, zone: u8, north: bool) -> Self {
        let lon0 = (zone as f64 * 6.0 - 183.0).to_radians();
        let false_northing = if north { 0.0 } else { 10_000_000.0 };
        Self::new(ellipsoid, lon0, 0.0, 0.9996, 500_000.0, false_northing)
    }

    /// WGS84 UTM zone.
    pub fn utm_zone(zone: u8, north: bool) -> Self {
        Self::utm(WGS84, zone, north)
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    pub fn scale_factor(&self) -> f64 {
        self.k0
    }

    /// Geodetic tangent to conformal tangent.
    fn conformal_tangent(&self, tau: f64) -> f64 {
        let e = self.ellipsoid.eccentricity();
        let tau1 = tau.hypot(1.0);
        let sigma = (e * (e * tau / tau1).atanh()).sinh();
        tau * sigma.hypot(1.0) - sigma * tau1
    }

    /// Conformal tangent back to geodetic tangent (Newton iteration).
    fn geodetic_tangent(&self, tau_prime: f64) -> f64 {
        let e2 = self.ellipsoid.e2;
        let mut tau = tau_prime;
        for _ in 0..15 {
            let tau1 = tau.hypot(1.0);
            let estimate = self.conformal_tangent(tau);
            let dtau = (tau_prime - estimate) * (1.0 + (1.0 - e2) * tau * tau)
                / ((1.0 - e2) * tau1 * estimate.hypot(1.0));
            tau += dtau;
            if dtau.abs() < 1e-12 * (1.0 + tau.abs()) {
                break;
            }
        }
        tau
    }
}

impl Projection for TransverseMercator {
    fn forward(&self, lon: f64, lat: f64) -> OverlayResult<(f64, f64)> {
        let dlam = normalize_dlon(lon - self.lon0);
        let tau_prime = self.conformal_tangent(lat.tan());

        let xi_prime = tau_prime.atan2(dlam.cos());
        let eta_prime = (dlam.sin() / tau_prime.hypot(dlam.cos())).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += a * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        let x = self.k0 * self.a_hat * eta + self.false_easting;
        let y = self.k0 * self.a_hat * (xi - self.xi0) + self.false_northing;
        finite_or_err(x, y, "transverse Mercator forward")
    }

    fn inverse(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)> {
        let eta = (x - self.false_easting) / (self.k0 * self.a_hat);
        let xi = (y - self.false_northing) / (self.k0 * self.a_hat) + self.xi0;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_prime -= b * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let cos_xi = xi_prime.cos();
        let tau_prime = xi_prime.sin() / sinh_eta.hypot(cos_xi);
        let lat = self.geodetic_tangent(tau_prime).atan();
        let lon = self.lon0 + sinh_eta.atan2(cos_xi);
        finite_or_err(lon, lat, "transverse Mercator inverse")
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_meridian_at_equator() {
        let tm = TransverseMercator::utm_zone(33, true);
        let (x, y) = tm.forward(15f64.to_radians(), 0.0).unwrap();
        assert!((x - 500_000.0).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_southern_false_northing() {
        let tm = TransverseMercator::utm_zone(33, false);
        let (_, y) = tm.forward(15f64.to_radians(), 0.0).unwrap();
        assert!((y - 10_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_utm33_roundtrip() {
        let tm = TransverseMercator::utm_zone(33, true);
        for (lon_deg, lat_deg) in [(15.0, 52.0), (12.0, 50.0), (18.0, 50.0), (13.5, 80.0)] {
            let lon = f64::to_radians(lon_deg);
            let lat = f64::to_radians(lat_deg);
            let (x, y) = tm.forward(lon, lat).unwrap();
            let (lon2, lat2) = tm.inverse(x, y).unwrap();
            assert!((lon2 - lon).abs() < 1e-9, "lon {lon_deg}");
            assert!((lat2 - lat).abs() < 1e-9, "lat {lat_deg}");
        }
    }

    #[test]
    fn test_known_utm_coordinate() {
        // Zone 32 has its central meridian at 9E
        let tm = TransverseMercator::utm_zone(32, true);
        let (x, y) = tm.forward(9f64.to_radians(), 48f64.to_radians()).unwrap();
        assert!((x - 500_000.0).abs() < 1e-6);
        // Meridian arc to 48N times k0
        assert!((y - 5_316_300.22).abs() < 0.5, "y = {y}");
    }
}
