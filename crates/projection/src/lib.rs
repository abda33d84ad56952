//! Coordinate reference system transformations.
//!
//! Implements the affine pixel geotransform, the map projections needed for
//! common display and source CRSs, and CRS resolution from EPSG codes.
//! Projections are implemented from scratch without external dependencies.

pub mod crs;
pub mod ellipsoid;
pub mod gcp;
pub mod geographic;
pub mod geotransform;
pub mod lambert;
pub mod mercator;
pub mod transform;
pub mod transverse_mercator;

pub use crs::{resolve_crs, CrsDefinition, ProjectionMethod};
pub use ellipsoid::Ellipsoid;
pub use gcp::{fit_affine, GroundControlPoint};
pub use geographic::Geographic;
pub use geotransform::GeoTransform;
pub use lambert::LambertConformalConic;
pub use mercator::{Mercator, WebMercator};
pub use transform::CrsTransform;
pub use transverse_mercator::TransverseMercator;

use overlay_common::{OverlayError, OverlayResult};

/// A map projection between geodetic coordinates and native CRS units.
pub trait Projection: Send + Sync {
    /// Forward: (lon_rad, lat_rad) -> (x, y) in native units
    fn forward(&self, lon: f64, lat: f64) -> OverlayResult<(f64, f64)>;

    /// Inverse: (x, y) in native units -> (lon_rad, lat_rad)
    fn inverse(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)>;

    fn ellipsoid(&self) -> &Ellipsoid;
}

/// Reject results that left the projection's domain.
pub(crate) fn finite_or_err(x: f64, y: f64, what: &str) -> OverlayResult<(f64, f64)> {
    if x.is_finite() && y.is_finite() {
        Ok((x, y))
    } else {
        Err(OverlayError::TransformFailed(format!(
            "{} produced a non-finite coordinate",
            what
        )))
    }
}

/// Wrap a longitude difference into [-PI, PI].
pub(crate) fn normalize_dlon(mut dlon: f64) -> f64 {
    use std::f64::consts::PI;
    while dlon > PI {
        dlon -= 2.0 * PI;
    }
    while dlon < -PI {
        dlon += 2.0 * PI;
    }
    dlon
}
