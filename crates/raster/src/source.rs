//! The read-only raster handle consumed by assembly and reprojection.

use overlay_common::{OverlayError, OverlayResult};
use projection::{GeoTransform, GroundControlPoint};
use serde::{Deserialize, Serialize};

use crate::buffer::{SampleBuffer, SampleType};

/// How the samples of a band are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorInterpretation {
    Undefined,
    Gray,
    PaletteIndex,
    Red,
    Green,
    Blue,
    Alpha,
}

impl ColorInterpretation {
    pub fn name(&self) -> &'static str {
        match self {
            ColorInterpretation::Undefined => "Undefined",
            ColorInterpretation::Gray => "Gray",
            ColorInterpretation::PaletteIndex => "Palette",
            ColorInterpretation::Red => "Red",
            ColorInterpretation::Green => "Green",
            ColorInterpretation::Blue => "Blue",
            ColorInterpretation::Alpha => "Alpha",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PaletteEntry {
    pub const TRANSPARENT: PaletteEntry = PaletteEntry::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Ordered palette for palette-indexed bands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTable {
    entries: Vec<PaletteEntry>,
}

impl ColorTable {
    pub fn new(entries: Vec<PaletteEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for an index; indices past the end are transparent.
    #[inline]
    pub fn lookup(&self, index: usize) -> PaletteEntry {
        self.entries
            .get(index)
            .copied()
            .unwrap_or(PaletteEntry::TRANSPARENT)
    }
}

/// Opaque handle to a decoded multi-band dataset.
///
/// Implementations are read-only from the overlay's perspective. Band
/// indices are 0-based.
pub trait RasterSource: Send + Sync {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn band_count(&self) -> usize;

    /// Sample type shared by all bands.
    fn sample_type(&self) -> SampleType;

    fn color_interpretation(&self, band: usize) -> ColorInterpretation;

    fn color_table(&self) -> Option<&ColorTable>;

    /// CRS code of the source, e.g. `EPSG:32633`.
    fn crs_code(&self) -> Option<&str>;

    fn geo_transform(&self) -> Option<GeoTransform>;

    fn gcps(&self) -> &[GroundControlPoint] {
        &[]
    }

    /// Read all samples of a band. Fails with `RasterRead`.
    fn read_band(&self, band: usize) -> OverlayResult<SampleBuffer>;

    /// File path or other description of where the data came from.
    fn description(&self) -> Option<&str> {
        None
    }
}

/// In-memory raster source.
#[derive(Debug, Clone)]
pub struct MemRaster {
    width: usize,
    height: usize,
    bands: Vec<SampleBuffer>,
    interpretations: Vec<ColorInterpretation>,
    color_table: Option<ColorTable>,
    crs_code: Option<String>,
    geo_transform: Option<GeoTransform>,
    gcps: Vec<GroundControlPoint>,
    description: Option<String>,
}

impl MemRaster {
    /// Create a raster from band buffers.
    ///
    /// All bands must share one sample type and hold `width * height`
    /// samples. Interpretations default to gray for 1-2 bands and
    /// red/green/blue/alpha otherwise.
    pub fn new(width: usize, height: usize, bands: Vec<SampleBuffer>) -> OverlayResult<Self> {
        if bands.is_empty() {
            return Err(OverlayError::InvalidRaster("raster has no bands".to_string()));
        }
        let sample_type = bands[0].sample_type();
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

        let interpretations = default_interpretations(bands.len());
        Ok(Self {
            width,
            height,
            bands,
            interpretations,
            color_table: None,
            crs_code: None,
            geo_transform: None,
            gcps: Vec::new(),
            description: None,
        })
    }

    /// Single-band palette raster.
    pub fn paletted(
        width: usize,
        height: usize,
        indices: SampleBuffer,
        table: ColorTable,
    ) -> OverlayResult<Self> {
        let mut raster = Self::new(width, height, vec![indices])?;
        raster.interpretations = vec![ColorInterpretation::PaletteIndex];
        raster.color_table = Some(table);
        Ok(raster)
    }

    pub fn with_crs(mut self, code: impl Into<String>) -> Self {
        self.crs_code = Some(code.into());
        self
    }

    pub fn with_geo_transform(mut self, gt: GeoTransform) -> Self {
        self.geo_transform = Some(gt);
        self
    }

    pub fn with_gcps(mut self, gcps: Vec<GroundControlPoint>) -> Self {
        self.gcps = gcps;
        self
    }

    pub fn with_color_table(mut self, table: ColorTable) -> Self {
        self.color_table = Some(table);
        self
    }

    pub fn with_interpretations(mut self, interpretations: Vec<ColorInterpretation>) -> Self {
        self.interpretations = interpretations;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn bands(&self) -> &[SampleBuffer] {
        &self.bands
    }

    pub fn into_bands(self) -> Vec<SampleBuffer> {
        self.bands
    }
}

pub(crate) fn default_interpretations(band_count: usize) -> Vec<ColorInterpretation> {
    if band_count <= 2 {
        return vec![ColorInterpretation::Gray; band_count];
    }
    (0..band_count)
        .map(|i| match i {
            0 => ColorInterpretation::Red,
            1 => ColorInterpretation::Green,
            2 => ColorInterpretation::Blue,
            3 => ColorInterpretation::Alpha,
            _ => ColorInterpretation::Undefined,
        })
        .collect()
}

impl RasterSource for MemRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn sample_type(&self) -> SampleType {
        self.bands[0].sample_type()
    }

    fn color_interpretation(&self, band: usize) -> ColorInterpretation {
        self.interpretations
            .get(band)
            .copied()
            .unwrap_or(ColorInterpretation::Undefined)
    }

    fn color_table(&self) -> Option<&ColorTable> {
        self.color_table.as_ref()
    }

    fn crs_code(&self) -> Option<&str> {
        self.crs_code.as_deref()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn gcps(&self) -> &[GroundControlPoint] {
        &self.gcps
    }

    fn read_band(&self, band: usize) -> OverlayResult<SampleBuffer> {
        self.bands.get(band).cloned().ok_or_else(|| {
            OverlayError::RasterRead(format!(
                "band {} out of range (raster has {} bands)",
                band,
                self.bands.len()
            ))
        })
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_length_mismatch_rejected() {
        let result = MemRaster::new(2, 2, vec![SampleBuffer::U8(vec![1, 2, 3])]);
        assert!(matches!(result, Err(OverlayError::InvalidRaster(_))));
    }

    #[test]
    fn test_mixed_sample_types_rejected() {
        let result = MemRaster::new(
            1,
            1,
            vec![SampleBuffer::U8(vec![1]), SampleBuffer::U16(vec![1])],
        );
        assert!(matches!(result, Err(OverlayError::InvalidRaster(_))));
    }

    #[test]
    fn test_read_band_out_of_range() {
        let raster = MemRaster::new(1, 1, vec![SampleBuffer::U8(vec![7])]).unwrap();
        assert_eq!(raster.read_band(0).unwrap(), SampleBuffer::U8(vec![7]));
        assert!(matches!(raster.read_band(1), Err(OverlayError::RasterRead(_))));
    }

    #[test]
    fn test_default_interpretations() {
        assert_eq!(default_interpretations(1), vec![ColorInterpretation::Gray]);
        assert_eq!(
            default_interpretations(4),
            vec![
                ColorInterpretation::Red,
                ColorInterpretation::Green,
                ColorInterpretation::Blue,
                ColorInterpretation::Alpha
            ]
        );
    }

    #[test]
    fn test_color_table_lookup_out_of_range_is_transparent() {
        let table = ColorTable::new(vec![PaletteEntry::rgb(1, 2, 3)]);
        assert_eq!(table.lookup(0), PaletteEntry::rgb(1, 2, 3));
        assert_eq!(table.lookup(5), PaletteEntry::TRANSPARENT);
    }
}
