//! Conversion of per-band sample buffers into a [`DrawableImage`].
//!
//! Supported sample types are 8-bit unsigned, 16-bit unsigned and 32-bit
//! signed. The color model is chosen in priority order:
//!
//! 1. palette-index interpretation: indexed model built from the color table
//! 2. more than two bands: RGB, with the fourth band as alpha when present
//! 3. one or two bands: 8/16-bit grayscale from the first band, or a generic
//!    min/max-stretched model for 32-bit samples

use overlay_common::{OverlayError, OverlayResult};
use tracing::debug;

use crate::buffer::{SampleBuffer, SampleType};
use crate::image::{ColorModel, DrawableImage};
use crate::source::{ColorInterpretation, ColorTable, RasterSource};

/// Everything the assembler needs, detached from any raster source.
#[derive(Debug, Clone)]
pub struct BandSet {
    pub width: usize,
    pub height: usize,
    pub bands: Vec<SampleBuffer>,
    pub color_interpretation: ColorInterpretation,
    pub color_table: Option<ColorTable>,
}

impl BandSet {
    pub fn new(width: usize, height: usize, bands: Vec<SampleBuffer>) -> Self {
        Self {
            width,
            height,
            bands,
            color_interpretation: ColorInterpretation::Gray,
            color_table: None,
        }
    }

    pub fn with_interpretation(mut self, interpretation: ColorInterpretation) -> Self {
        self.color_interpretation = interpretation;
        self
    }

    pub fn with_color_table(mut self, table: ColorTable) -> Self {
        self.color_table = Some(table);
        self
    }
}

/// Read every band of `source` and assemble a drawable image.
///
/// A failed band read aborts the whole assembly; no partial image is
/// returned. The color interpretation of the first band drives model
/// selection.
pub fn assemble_image(source: &dyn RasterSource) -> OverlayResult<DrawableImage> {
    check_sample_type(source.sample_type())?;

    let bands = (0..source.band_count())
        .map(|band| source.read_band(band))
        .collect::<OverlayResult<Vec<_>>>()?;

    let input = BandSet {
        width: source.width(),
        height: source.height(),
        bands,
        color_interpretation: source.color_interpretation(0),
        color_table: source.color_table().cloned(),
    };
    assemble_from_bands(input)
}

/// Assemble a drawable image from already-read band buffers.
pub fn assemble_from_bands(input: BandSet) -> OverlayResult<DrawableImage> {
    let BandSet {
        width,
        height,
        mut bands,
        color_interpretation,
        color_table,
    } = input;

    let Some(first) = bands.first() else {
        return Err(OverlayError::InvalidRaster("raster has no bands".to_string()));
    };
    let sample_type = first.sample_type();
    check_sample_type(sample_type)?;

    for (i, band) in bands.iter().enumerate() {
        if band.sample_type() != sample_type {
            return Err(OverlayError::InvalidRaster(format!(
                "band {} is {} but band 0 is {}",
                i,
                band.sample_type(),
                sample_type
            )));
        }
        if band.len() != width * height {
            return Err(OverlayError::InvalidRaster(format!(
                "band {} holds {} samples, expected {}x{}",
                i,
                band.len(),
                width,
                height
            )));
        }
    }

    let color_model = if color_interpretation == ColorInterpretation::PaletteIndex {
        let table = color_table.ok_or_else(|| {
            OverlayError::InvalidRaster("palette-indexed raster without a color table".to_string())
        })?;
        bands.truncate(1);
        ColorModel::Indexed(table)
    } else if bands.len() > 2 {
        let has_alpha = bands.len() >= 4;
        bands.truncate(if has_alpha { 4 } else { 3 });
        ColorModel::Rgb { has_alpha }
    } else {
        bands.truncate(1);
        match sample_type {
            SampleType::U8 => ColorModel::Gray { bits: 8 },
            SampleType::U16 => ColorModel::Gray { bits: 16 },
            _ => {
                let (min, max) = bands[0].min_max().unwrap_or((0.0, 0.0));
                ColorModel::Generic { min, max }
            }
        }
    };

    debug!(
        width,
        height,
        bands = bands.len(),
        sample_type = %sample_type,
        color_model = color_model.name(),
        "Assembled drawable image"
    );

    Ok(DrawableImage::new(width, height, bands, color_model))
}

fn check_sample_type(sample_type: SampleType) -> OverlayResult<()> {
    match sample_type {
        SampleType::U8 | SampleType::U16 | SampleType::I32 => Ok(()),
        other => Err(OverlayError::UnsupportedSampleType(other.name().to_string())),
    }
}
