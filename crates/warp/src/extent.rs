//! Suggested output grid for a reprojection.
//!
//! The source footprint is sampled along its edges and on a coarse interior
//! lattice, transformed into the target CRS, and bounded. The output pixel
//! size keeps roughly the same number of pixels along the diagonal as the
//! source, with square pixels.

use overlay_common::{BoundingBox, OverlayError, OverlayResult};
use projection::{CrsTransform, GeoTransform};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Interior lattice points per axis, on top of the edge samples.
const INTERIOR_STEPS: usize = 10;

/// A north-up output raster grid in the target CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputGrid {
    pub width: usize,
    pub height: usize,
    pub geo_transform: GeoTransform,
    pub bounds: BoundingBox,
}

/// Compute the output grid for warping a `width` x `height` raster with
/// geotransform `src_gt` through `transform` (source CRS to target CRS).
pub fn suggest_output_grid(
    width: usize,
    height: usize,
    src_gt: &GeoTransform,
    transform: &CrsTransform,
    edge_samples: usize,
) -> OverlayResult<OutputGrid> {
    if width == 0 || height == 0 {
        return Err(OverlayError::InvalidRaster(format!(
            "cannot warp an empty {}x{} raster",
            width, height
        )));
    }

    let (w, h) = (width as f64, height as f64);
    let n = edge_samples.max(2);
    let mut pixels = Vec::with_capacity(4 * n + (INTERIOR_STEPS + 1).pow(2));
    for k in 0..n {
        let t = k as f64 / (n - 1) as f64;
        pixels.push((t * w, 0.0));
        pixels.push((t * w, h));
        pixels.push((0.0, t * h));
        pixels.push((w, t * h));
    }
    for j in 1..INTERIOR_STEPS {
        for i in 1..INTERIOR_STEPS {
            let s = INTERIOR_STEPS as f64;
            pixels.push((i as f64 / s * w, j as f64 / s * h));
        }
    }

    let total = pixels.len();
    let projected = pixels.into_iter().filter_map(|(px, py)| {
        let (x, y) = src_gt.forward(px, py);
        transform.transform(x, y).ok()
    });
    let Some(bounds) = BoundingBox::from_points(projected) else {
        return Err(OverlayError::TransformFailed(format!(
            "no part of the raster maps into {}",
            transform.target().code()
        )));
    };

    let diagonal = bounds.width().hypot(bounds.height());
    let pixel_size = diagonal / w.hypot(h);
    if !(pixel_size.is_finite() && pixel_size > 0.0) {
        return Err(OverlayError::TransformFailed(format!(
            "raster collapses to a point in {}",
            transform.target().code()
        )));
    }

    let out_width = ((bounds.width() / pixel_size).round() as usize).max(1);
    let out_height = ((bounds.height() / pixel_size).round() as usize).max(1);
    let geo_transform = GeoTransform::north_up(bounds.min_x, bounds.max_y, pixel_size, pixel_size);

    debug!(
        samples = total,
        out_width,
        out_height,
        pixel_size,
        "Suggested warp output grid"
    );

    Ok(OutputGrid {
        width: out_width,
        height: out_height,
        geo_transform,
        bounds,
    })
}
