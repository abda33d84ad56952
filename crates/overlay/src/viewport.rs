//! A north-up map viewport.
//!
//! Screen pixel (0, 0) is the top-left corner and y grows downward; the
//! viewport center sits at the middle of the screen.

use overlay_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::placement::ProjectedToScreen;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Projected coordinates at the screen center.
    pub center_x: f64,
    pub center_y: f64,
    /// Projected units covered by one screen pixel.
    pub units_per_pixel: f64,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(
        center_x: f64,
        center_y: f64,
        units_per_pixel: f64,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            center_x,
            center_y,
            units_per_pixel,
            width,
            height,
        }
    }

    /// Viewport of `width` x `height` pixels showing all of `bbox`, leaving
    /// `margin` pixels free on every side.
    pub fn fit_bounds(bbox: &BoundingBox, width: usize, height: usize, margin: usize) -> Self {
        let usable_w = width.saturating_sub(2 * margin).max(1) as f64;
        let usable_h = height.saturating_sub(2 * margin).max(1) as f64;

        let scale = (bbox.width() / usable_w).max(bbox.height() / usable_h);
        // A point-sized box still needs a usable zoom level
        let units_per_pixel = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };

        let (center_x, center_y) = bbox.center();
        Self::new(center_x, center_y, units_per_pixel, width, height)
    }

    pub fn projected_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.center_x) / self.units_per_pixel + self.width as f64 / 2.0,
            (self.center_y - y) / self.units_per_pixel + self.height as f64 / 2.0,
        )
    }

    pub fn screen_to_projected(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            self.center_x + (sx - self.width as f64 / 2.0) * self.units_per_pixel,
            self.center_y - (sy - self.height as f64 / 2.0) * self.units_per_pixel,
        )
    }

    /// Projected extent covered by the screen.
    pub fn visible_bounds(&self) -> BoundingBox {
        let (min_x, max_y) = self.screen_to_projected(0.0, 0.0);
        let (max_x, min_y) = self.screen_to_projected(self.width as f64, self.height as f64);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

impl ProjectedToScreen for Viewport {
    fn projected_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        Viewport::projected_to_screen(self, x, y)
    }
}
