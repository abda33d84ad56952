//! Drawable images: banded pixel buffers plus a color model.
//!
//! Pixels are stored banded, one contiguous row-major array per band, never
//! interleaved. A `DrawableImage` is immutable once built.

use rayon::prelude::*;

use crate::buffer::SampleBuffer;
use crate::source::ColorTable;

/// How band samples become display colors.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorModel {
    /// Single band of palette indices.
    Indexed(ColorTable),
    /// Single band of gray levels, 8 or 16 bits deep.
    Gray { bits: u32 },
    /// Red, green, blue and optionally alpha bands.
    Rgb { has_alpha: bool },
    /// Samples without a native display mapping, stretched from
    /// `[min, max]` to 8-bit gray.
    Generic { min: f64, max: f64 },
}

impl ColorModel {
    pub fn name(&self) -> &'static str {
        match self {
            ColorModel::Indexed(_) => "indexed",
            ColorModel::Gray { .. } => "grayscale",
            ColorModel::Rgb { has_alpha: false } => "RGB",
            ColorModel::Rgb { has_alpha: true } => "RGBA",
            ColorModel::Generic { .. } => "generic",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawableImage {
    width: usize,
    height: usize,
    bands: Vec<SampleBuffer>,
    color_model: ColorModel,
}

impl DrawableImage {
    /// Callers guarantee every band holds `width * height` samples.
    pub(crate) fn new(
        width: usize,
        height: usize,
        bands: Vec<SampleBuffer>,
        color_model: ColorModel,
    ) -> Self {
        Self {
            width,
            height,
            bands,
            color_model,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> Option<&SampleBuffer> {
        self.bands.get(index)
    }

    pub fn bands(&self) -> &[SampleBuffer] {
        &self.bands
    }

    pub fn color_model(&self) -> &ColorModel {
        &self.color_model
    }

    /// Display color of pixel (x, y). Panics if out of bounds.
    #[inline]
    pub fn rgba_at(&self, x: usize, y: usize) -> [u8; 4] {
        let i = y * self.width + x;
        match &self.color_model {
            ColorModel::Indexed(table) => {
                let index = self.bands[0].get_f64(i);
                if index < 0.0 {
                    return [0, 0, 0, 0];
                }
                table.lookup(index as usize).to_array()
            }
            ColorModel::Gray { .. } => {
                let v = to_display_byte(&self.bands[0], i);
                [v, v, v, 255]
            }
            ColorModel::Rgb { has_alpha } => {
                let alpha = if *has_alpha {
                    to_display_byte(&self.bands[3], i)
                } else {
                    255
                };
                [
                    to_display_byte(&self.bands[0], i),
                    to_display_byte(&self.bands[1], i),
                    to_display_byte(&self.bands[2], i),
                    alpha,
                ]
            }
            ColorModel::Generic { min, max } => {
                let v = stretch(self.bands[0].get_f64(i), *min, *max);
                [v, v, v, 255]
            }
        }
    }

    /// Interleaved RGBA bytes for the whole image.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.width * self.height * 4];
        if self.width == 0 {
            return out;
        }
        out.par_chunks_mut(self.width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    px.copy_from_slice(&self.rgba_at(x, y));
                }
            });
        out
    }
}

/// Reduce a sample to 8 bits: 16-bit samples keep their high byte, wider
/// integers saturate.
#[inline]
fn to_display_byte(band: &SampleBuffer, i: usize) -> u8 {
    match band {
        SampleBuffer::U8(v) => v[i],
        SampleBuffer::U16(v) => (v[i] >> 8) as u8,
        SampleBuffer::I16(v) => (v[i].max(0) >> 7) as u8,
        other => other.get_f64(i).clamp(0.0, 255.0) as u8,
    }
}

#[inline]
fn stretch(value: f64, min: f64, max: f64) -> u8 {
    if !value.is_finite() || max <= min {
        return 0;
    }
    (((value - min) / (max - min)) * 255.0).round().clamp(0.0, 255.0) as u8
}
