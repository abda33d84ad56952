//! Ground control points and first-order (affine) fitting.

use nalgebra::{DMatrix, DVector};
use overlay_common::{OverlayError, OverlayResult};
use serde::{Deserialize, Serialize};

use crate::geotransform::GeoTransform;

/// Known correspondence between a pixel location and a CRS coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundControlPoint {
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
}

impl GroundControlPoint {
    pub fn new(pixel: f64, line: f64, x: f64, y: f64) -> Self {
        Self { pixel, line, x, y }
    }
}

/// Least-squares affine transform through the control points.
///
/// Requires at least three points that are not collinear in pixel space.
pub fn fit_affine(gcps: &[GroundControlPoint]) -> OverlayResult<GeoTransform> {
    if gcps.len() < 3 {
        return Err(OverlayError::NotGeoreferenced(format!(
            "{} ground control points, at least 3 are required",
            gcps.len()
        )));
    }

    let n = gcps.len();
    let design = DMatrix::from_fn(n, 3, |row, col| match col {
        0 => 1.0,
        1 => gcps[row].pixel,
        _ => gcps[row].line,
    });
    let xs = DVector::from_iterator(n, gcps.iter().map(|g| g.x));
    let ys = DVector::from_iterator(n, gcps.iter().map(|g| g.y));

    let svd = design.svd(true, true);
    let max_sv = svd.singular_values.max();
    let min_sv = svd.singular_values.min();
    if max_sv == 0.0 || min_sv / max_sv < 1e-10 {
        return Err(OverlayError::NotGeoreferenced(
            "ground control points are collinear".to_string(),
        ));
    }

    let eps = max_sv * 1e-12;
    let cx = svd
        .solve(&xs, eps)
        .map_err(|e| OverlayError::NotGeoreferenced(e.to_string()))?;
    let cy = svd
        .solve(&ys, eps)
        .map_err(|e| OverlayError::NotGeoreferenced(e.to_string()))?;

    Ok(GeoTransform::new([cx[0], cx[1], cx[2], cy[0], cy[1], cy[2]]))
}
