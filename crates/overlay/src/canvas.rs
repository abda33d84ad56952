//! RGBA painting surface.
//!
//! Stands in for the host map canvas: images are painted through a
//! [`ScreenPlacement`] by inverse mapping each covered screen pixel back to
//! an image pixel (nearest neighbour) and compositing with alpha-over.

use std::ops::Range;

use raster::png::{encode_png, PngError};
use raster::DrawableImage;
use rayon::prelude::*;

use crate::placement::ScreenPlacement;

/// Frame and cross color of the error indicator.
pub const INDICATOR_COLOR: [u8; 4] = [255, 0, 0, 255];

/// Interleaved RGBA pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Fully transparent canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    pub fn filled(width: usize, height: usize, color: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Pixel at (x, y), or `None` outside the canvas.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[i..i + 4]);
        Some(px)
    }

    /// Paint `image` at `placement`.
    ///
    /// Image pixel (i, j) covers the screen rectangle from
    /// `placement.to_screen(i, j)` to `placement.to_screen(i + 1, j + 1)`.
    /// A zero scale along an axis paints a one pixel wide line there.
    pub fn draw_image(&mut self, image: &DrawableImage, placement: &ScreenPlacement) {
        if !placement.is_finite() || image.width() == 0 || image.height() == 0 {
            return;
        }
        let cols = screen_span(placement.translate_x, placement.scale_x, image.width(), self.width);
        let rows = screen_span(placement.translate_y, placement.scale_y, image.height(), self.height);
        if cols.is_empty() || rows.is_empty() {
            return;
        }

        let src_cols: Vec<Option<usize>> = cols
            .clone()
            .map(|sx| image_index(placement.translate_x, placement.scale_x, image.width(), sx))
            .collect();
        let row_stride = self.width * 4;

        self.pixels
            .par_chunks_mut(row_stride)
            .enumerate()
            .skip(rows.start)
            .take(rows.len())
            .for_each(|(sy, row)| {
                let Some(iy) =
                    image_index(placement.translate_y, placement.scale_y, image.height(), sy)
                else {
                    return;
                };
                for (sx, ix) in cols.clone().zip(&src_cols) {
                    if let Some(ix) = ix {
                        let px = &mut row[sx * 4..sx * 4 + 4];
                        blend_over(px, image.rgba_at(*ix, iy));
                    }
                }
            });
    }

    /// Paint a red frame with a diagonal cross over the whole canvas.
    pub fn draw_error_indicator(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let thickness = (self.width.min(self.height) / 50).max(2);

        for y in 0..self.height {
            for x in 0..self.width {
                let on_frame = x < thickness
                    || y < thickness
                    || x + thickness >= self.width
                    || y + thickness >= self.height;
                if on_frame || self.on_diagonal(x, y, thickness) {
                    self.put(x, y, INDICATOR_COLOR);
                }
            }
        }
    }

    fn on_diagonal(&self, x: usize, y: usize, thickness: usize) -> bool {
        // Distance in x from the two diagonals at row y
        let w = self.width as f64;
        let h = self.height as f64;
        let cx = x as f64 + 0.5;
        let along = (y as f64 + 0.5) / h * w;
        let half = thickness as f64 / 2.0;
        (cx - along).abs() <= half || (cx - (w - along)).abs() <= half
    }

    fn put(&mut self, x: usize, y: usize, color: [u8; 4]) {
        let i = (y * self.width + x) * 4;
        self.pixels[i..i + 4].copy_from_slice(&color);
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, PngError> {
        encode_png(&self.pixels, self.width, self.height)
    }
}

/// Screen pixels covered along one axis, clipped to `[0, limit)`.
fn screen_span(translate: f64, scale: f64, len: usize, limit: usize) -> Range<usize> {
    let (lo, hi) = if scale == 0.0 {
        (translate.floor(), translate.floor() + 1.0)
    } else {
        let end = translate + len as f64 * scale;
        (translate.min(end).floor(), translate.max(end).ceil())
    };
    let start = lo.max(0.0).min(limit as f64) as usize;
    let end = hi.max(0.0).min(limit as f64) as usize;
    start..end
}

/// Image pixel under the center of screen pixel `screen` along one axis.
fn image_index(translate: f64, scale: f64, len: usize, screen: usize) -> Option<usize> {
    if scale == 0.0 {
        return Some(0);
    }
    let t = ((screen as f64 + 0.5 - translate) / scale).floor();
    if t >= 0.0 && t < len as f64 {
        Some(t as usize)
    } else {
        None
    }
}

/// Straight-alpha "source over destination".
fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    match src[3] {
        0 => {}
        255 => dst.copy_from_slice(&src),
        sa => {
            let sa = sa as f32 / 255.0;
            let da = dst[3] as f32 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            for c in 0..3 {
                let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
                dst[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_a * 255.0).round() as u8;
        }
    }
}
