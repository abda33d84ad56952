//! Screen placement of a reprojected image.
//!
//! Each paint call recomputes where the image lands on screen from three
//! reference pixels (origin, upper right, bottom right) pushed through the
//! geotransform and the viewport mapper:
//!
//! ```text
//! screen_x = translate_x + px * scale_x
//! screen_y = translate_y + py * scale_y
//! ```
//!
//! Only translation and independent axis scales are modeled; rotation and
//! shear between the display CRS and the screen are not.

use projection::GeoTransform;
use raster::DrawableImage;
use serde::{Deserialize, Serialize};

/// Maps projected coordinates of the display CRS to screen pixels.
pub trait ProjectedToScreen {
    fn projected_to_screen(&self, x: f64, y: f64) -> (f64, f64);
}

impl<F> ProjectedToScreen for F
where
    F: Fn(f64, f64) -> (f64, f64),
{
    fn projected_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        self(x, y)
    }
}

/// Translation and per-axis scale from image pixels to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPlacement {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ScreenPlacement {
    /// Screen position of image pixel coordinate (px, py).
    pub fn to_screen(&self, px: f64, py: f64) -> (f64, f64) {
        (
            self.translate_x + px * self.scale_x,
            self.translate_y + py * self.scale_y,
        )
    }

    /// Image pixel coordinate under screen position (sx, sy).
    ///
    /// `None` when an axis has zero scale.
    pub fn to_image(&self, sx: f64, sy: f64) -> Option<(f64, f64)> {
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return None;
        }
        Some((
            (sx - self.translate_x) / self.scale_x,
            (sy - self.translate_y) / self.scale_y,
        ))
    }

    pub fn is_finite(&self) -> bool {
        self.translate_x.is_finite()
            && self.translate_y.is_finite()
            && self.scale_x.is_finite()
            && self.scale_y.is_finite()
    }
}

/// Placement for a `width` x `height` image with geotransform `gt`.
///
/// A single-column image gets `scale_x == 0` and a single-row image
/// `scale_y == 0`; such images collapse to a line or point on screen.
pub fn compute_placement<M>(
    width: usize,
    height: usize,
    gt: &GeoTransform,
    mapper: &M,
) -> ScreenPlacement
where
    M: ProjectedToScreen + ?Sized,
{
    let last_col = width.saturating_sub(1) as f64;
    let last_row = height.saturating_sub(1) as f64;

    let (ox, oy) = gt.forward(0.0, 0.0);
    let (origin_x, origin_y) = mapper.projected_to_screen(ox, oy);

    let (ux, uy) = gt.forward(last_col, 0.0);
    let (upper_right_x, upper_right_y) = mapper.projected_to_screen(ux, uy);

    let (bx, by) = gt.forward(last_col, last_row);
    let (_, bottom_right_y) = mapper.projected_to_screen(bx, by);

    let scale_x = if width > 1 {
        (upper_right_x - origin_x) / last_col
    } else {
        0.0
    };
    let scale_y = if height > 1 {
        (bottom_right_y - upper_right_y) / last_row
    } else {
        0.0
    };

    ScreenPlacement {
        translate_x: origin_x,
        translate_y: origin_y,
        scale_x,
        scale_y,
    }
}

/// [`compute_placement`] using the image's own dimensions.
pub fn place_image<M>(image: &DrawableImage, gt: &GeoTransform, mapper: &M) -> ScreenPlacement
where
    M: ProjectedToScreen + ?Sized,
{
    compute_placement(image.width(), image.height(), gt, mapper)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }

    #[test]
    fn test_identity_mapper() {
        let gt = GeoTransform::new([500.0, 2.0, 0.0, 1000.0, 0.0, -2.0]);
        let placement = compute_placement(101, 101, &gt, &identity);

        assert_eq!(placement.translate_x, 500.0);
        assert_eq!(placement.translate_y, 1000.0);
        assert_eq!(placement.scale_x, 2.0);
        assert_eq!(placement.scale_y, -2.0);
    }

    #[test]
    fn test_flipping_mapper() {
        // y grows downward on screen, 10 units per pixel
        let mapper = |x: f64, y: f64| ((x - 500.0) / 10.0, (1000.0 - y) / 10.0);
        let gt = GeoTransform::new([500.0, 20.0, 0.0, 1000.0, 0.0, -20.0]);
        let placement = compute_placement(11, 6, &gt, &mapper);

        assert_eq!(placement.translate_x, 0.0);
        assert_eq!(placement.translate_y, 0.0);
        assert_eq!(placement.scale_x, 2.0);
        assert_eq!(placement.scale_y, 2.0);
        assert_eq!(placement.to_screen(10.0, 5.0), (20.0, 10.0));
    }

    #[test]
    fn test_single_column_and_row_collapse() {
        let gt = GeoTransform::new([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);

        let column = compute_placement(1, 10, &gt, &identity);
        assert_eq!(column.scale_x, 0.0);
        assert_eq!(column.scale_y, -1.0);

        let row = compute_placement(10, 1, &gt, &identity);
        assert_eq!(row.scale_x, 1.0);
        assert_eq!(row.scale_y, 0.0);

        let point = compute_placement(1, 1, &gt, &identity);
        assert_eq!((point.scale_x, point.scale_y), (0.0, 0.0));
        assert!(point.is_finite());
        assert!(point.to_image(0.0, 0.0).is_none());
    }

    #[test]
    fn test_to_image_inverts_to_screen() {
        let placement = ScreenPlacement {
            translate_x: 12.0,
            translate_y: -4.0,
            scale_x: 0.5,
            scale_y: 3.0,
        };
        let (sx, sy) = placement.to_screen(7.0, 9.0);
        assert_eq!(placement.to_image(sx, sy), Some((7.0, 9.0)));
    }
}
