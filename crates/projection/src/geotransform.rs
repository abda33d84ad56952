//! Affine mapping between raster pixel space and projected space.
//!
//! A geotransform is six ordered coefficients `[c0..c5]`:
//!
//! ```text
//! geo_x = c0 + px * c1 + py * c2
//! geo_y = c3 + px * c4 + py * c5
//! ```
//!
//! `c0`/`c3` locate the outer corner of the top-left pixel, `c1`/`c5` are the
//! pixel size along each axis (`c5` is usually negative for north-up images)
//! and `c2`/`c4` are rotation/shear terms.

use overlay_common::{OverlayError, OverlayResult};
use serde::{Deserialize, Serialize};

/// Relative tolerance under which a determinant is considered zero.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Six-coefficient affine pixel-to-projected transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform([f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    /// North-up transform with square-or-rectangular pixels and no rotation.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, -pixel_height])
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.0
    }

    /// `c1*c5 - c2*c4`; zero means the transform has no inverse.
    pub fn determinant(&self) -> f64 {
        let c = &self.0;
        c[1] * c[5] - c[2] * c[4]
    }

    /// Whether the determinant is zero within a tolerance relative to the
    /// magnitude of the linear coefficients.
    pub fn is_singular(&self) -> bool {
        let c = &self.0;
        let scale = (c[1] * c[5]).abs().max((c[2] * c[4]).abs());
        let det = self.determinant();
        !det.is_finite() || det == 0.0 || det.abs() <= SINGULAR_EPSILON * scale
    }

    /// Pixel/line to projected coordinates. No rounding is applied.
    #[inline]
    pub fn forward(&self, px: f64, py: f64) -> (f64, f64) {
        let c = &self.0;
        (c[0] + px * c[1] + py * c[2], c[3] + px * c[4] + py * c[5])
    }

    /// Projected coordinates to fractional pixel/line by Cramer's rule.
    pub fn inverse(&self, geo_x: f64, geo_y: f64) -> OverlayResult<(f64, f64)> {
        if self.is_singular() {
            return Err(OverlayError::SingularTransform {
                determinant: self.determinant(),
            });
        }
        let c = &self.0;
        let d = self.determinant();
        let dx = geo_x - c[0];
        let dy = geo_y - c[3];
        let px = (c[5] * dx - c[2] * dy) / d;
        let py = (c[1] * dy - c[4] * dx) / d;
        Ok((px, py))
    }

    /// The inverse affine transform, mapping projected coordinates to pixels.
    pub fn inverted(&self) -> OverlayResult<GeoTransform> {
        if self.is_singular() {
            return Err(OverlayError::SingularTransform {
                determinant: self.determinant(),
            });
        }
        let c = &self.0;
        let inv_det = 1.0 / self.determinant();
        let i1 = c[5] * inv_det;
        let i2 = -c[2] * inv_det;
        let i4 = -c[4] * inv_det;
        let i5 = c[1] * inv_det;
        let i0 = -(i1 * c[0] + i2 * c[3]);
        let i3 = -(i4 * c[0] + i5 * c[3]);
        Ok(GeoTransform([i0, i1, i2, i3, i4, i5]))
    }

    /// Projected coordinates of the outer corner of pixel (0, 0).
    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    /// Signed pixel size along x and y (`c1`, `c5`).
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.0[1], self.0[5])
    }

    /// Whether the rotation/shear terms are zero.
    pub fn is_axis_aligned(&self) -> bool {
        self.0[2] == 0.0 && self.0[4] == 0.0
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_exact() {
        let gt = GeoTransform::new([100.0, 1.0, 0.0, 200.0, 0.0, -1.0]);
        assert_eq!(gt.forward(0.0, 0.0), (100.0, 200.0));
        assert_eq!(gt.forward(1.0, 1.0), (101.0, 199.0));
        assert_eq!(gt.forward(0.5, 0.25), (100.5, 199.75));
    }

    #[test]
    fn test_inverse_of_rotated_transform() {
        let gt = GeoTransform::new([10.0, 0.5, 0.25, -3.0, -0.1, -0.75]);
        let (x, y) = gt.forward(17.0, 42.0);
        let (px, py) = gt.inverse(x, y).unwrap();
        assert!((px - 17.0).abs() < 1e-9);
        assert!((py - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_detection() {
        assert!(GeoTransform::new([0.0, 1.0, 2.0, 0.0, 2.0, 4.0]).is_singular());
        assert!(GeoTransform::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).is_singular());
        assert!(!GeoTransform::new([0.0, 1e-7, 0.0, 0.0, 0.0, -1e-7]).is_singular());
    }

    #[test]
    fn test_inverted_matches_inverse() {
        let gt = GeoTransform::new([500.0, 2.0, 0.3, 1000.0, 0.1, -2.0]);
        let inv = gt.inverted().unwrap();
        let (x, y) = gt.forward(12.5, 7.25);
        let (a, b) = inv.forward(x, y);
        let (c, d) = gt.inverse(x, y).unwrap();
        assert!((a - c).abs() < 1e-9 && (b - d).abs() < 1e-9);
        assert!((a - 12.5).abs() < 1e-9 && (b - 7.25).abs() < 1e-9);
    }
}
