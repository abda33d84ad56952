//! Geographic (longitude/latitude) coordinate systems.
//!
//! Native units are decimal degrees with longitude as x and latitude as y.

use crate::ellipsoid::Ellipsoid;
use crate::{finite_or_err, Projection};
use overlay_common::OverlayResult;

#[derive(Debug, Clone)]
pub struct Geographic {
    ellipsoid: Ellipsoid,
}

impl Geographic {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self { ellipsoid }
    }
}

impl Projection for Geographic {
    fn forward(&self, lon: f64, lat: f64) -> OverlayResult<(f64, f64)> {
        finite_or_err(lon.to_degrees(), lat.to_degrees(), "geographic forward")
    }

    fn inverse(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)> {
        finite_or_err(x.to_radians(), y.to_radians(), "geographic inverse")
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipsoid::WGS84;

    #[test]
    fn test_degrees_passthrough() {
        let geo = Geographic::new(WGS84);
        let (x, y) = geo.forward(10f64.to_radians(), (-45f64).to_radians()).unwrap();
        assert!((x - 10.0).abs() < 1e-12);
        assert!((y + 45.0).abs() < 1e-12);
        let (lon, lat) = geo.inverse(x, y).unwrap();
        assert!((lon.to_degrees() - 10.0).abs() < 1e-12);
        assert!((lat.to_degrees() + 45.0).abs() < 1e-12);
    }
}
