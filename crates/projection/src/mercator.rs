//! Mercator projections.
//!
//! [`WebMercator`] is the spherical variant used by web maps (EPSG:3857):
//! WGS84 longitudes/latitudes are projected as if the Earth were a sphere of
//! radius `a`. [`Mercator`] is the ellipsoidal variant (EPSG:3395).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::ellipsoid::{msfn, phi_from_ts, tsfn, Ellipsoid, WGS84};
use crate::{finite_or_err, Projection};
use overlay_common::OverlayResult;

/// Latitude where Web Mercator y equals x at 180 degrees: atan(sinh(PI)).
const MAX_LAT_3857: f64 = 1.484_422_229_745_332_4;

#[derive(Debug, Clone)]
pub struct Mercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Mercator {
    /// Mercator with the scale given by a latitude of true scale (radians).
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat_ts: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        Self {
            ellipsoid,
            lon0,
            k0: msfn(lat_ts, ellipsoid.e2),
            false_easting,
            false_northing,
        }
    }

    /// World Mercator (EPSG:3395).
    pub fn world() -> Self {
        Self::new(WGS84, 0.0, 0.0, 0.0, 0.0)
    }
}

impl Projection for Mercator {
    fn forward(&self, lon: f64, lat: f64) -> OverlayResult<(f64, f64)> {
        let e = self.ellipsoid.eccentricity();
        let ak0 = self.ellipsoid.a * self.k0;
        let x = ak0 * (lon - self.lon0) + self.false_easting;
        let y = ak0 * -tsfn(lat, e).ln() + self.false_northing;
        finite_or_err(x, y, "Mercator forward")
    }

    fn inverse(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)> {
        let e = self.ellipsoid.eccentricity();
        let ak0 = self.ellipsoid.a * self.k0;
        let lon = self.lon0 + (x - self.false_easting) / ak0;
        let ts = (-(y - self.false_northing) / ak0).exp();
        finite_or_err(lon, phi_from_ts(ts, e), "Mercator inverse")
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

/// Spherical (pseudo) Mercator, EPSG:3857.
#[derive(Debug, Clone)]
pub struct WebMercator {
    ellipsoid: Ellipsoid,
}

impl WebMercator {
    pub fn new() -> Self {
        Self { ellipsoid: WGS84 }
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new()
    }
}

impl Projection for WebMercator {
    fn forward(&self, lon: f64, lat: f64) -> OverlayResult<(f64, f64)> {
        let lat = lat.clamp(-MAX_LAT_3857, MAX_LAT_3857);
        let x = self.ellipsoid.a * lon;
        let y = self.ellipsoid.a * (FRAC_PI_4 + lat / 2.0).tan().ln();
        finite_or_err(x, y, "Web Mercator forward")
    }

    fn inverse(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)> {
        let lon = x / self.ellipsoid.a;
        let lat = 2.0 * (y / self.ellipsoid.a).exp().atan() - FRAC_PI_2;
        finite_or_err(lon, lat, "Web Mercator inverse")
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}
