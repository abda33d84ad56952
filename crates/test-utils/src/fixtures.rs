//! Common test fixtures.
//!
//! Pre-built rasters in the situations the overlay has to handle, plus a
//! minimal GeoTIFF writer so decoding can be tested without binary files
//! checked into the repository.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use overlay_common::BoundingBox;
use projection::crs::lookup_epsg;
use projection::{GeoTransform, GroundControlPoint};
use raster::{ColorTable, MemRaster, PaletteEntry, SampleBuffer};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tiff::TiffResult;

use crate::generators::{gradient_u16, gradient_u8, index_pattern};

/// Common geotransforms.
pub mod transforms {
    /// 30 m pixels in UTM zone 33N, origin at (500000, 5000000).
    pub const UTM33_30M: [f64; 6] = [500_000.0, 30.0, 0.0, 5_000_000.0, 0.0, -30.0];

    /// Quarter-degree global grid, origin at the north-west corner.
    pub const GLOBAL_QUARTER_DEGREE: [f64; 6] = [-180.0, 0.25, 0.0, 90.0, 0.0, -0.25];

    /// Unit pixels with the origin at (100, 200).
    pub const UNIT_100_200: [f64; 6] = [100.0, 1.0, 0.0, 200.0, 0.0, -1.0];

    /// Rotated by 30 degrees.
    pub const ROTATED: [f64; 6] = [1000.0, 0.866_025_403_784_438_6, 0.5, 2000.0, 0.5, -0.866_025_403_784_438_6];

    /// Collapsed: both axes map onto the same line.
    pub const SINGULAR: [f64; 6] = [0.0, 2.0, 3.0, 0.0, 4.0, 6.0];
}

/// Common CRS codes.
pub mod crs {
    pub const WGS84: &str = "EPSG:4326";
    pub const WEB_MERCATOR: &str = "EPSG:3857";
    pub const UTM_33N: &str = "EPSG:32633";
    pub const LAMBERT_93: &str = "EPSG:2154";
}

/// Viewport covering central Europe in Web Mercator meters.
pub fn europe_web_mercator_bounds() -> BoundingBox {
    BoundingBox::new(1_000_000.0, 5_000_000.0, 2_500_000.0, 6_500_000.0)
}

/// 8-bit gray ramp in UTM 33N with 30 m pixels.
pub fn utm_gray_raster(width: usize, height: usize) -> MemRaster {
    MemRaster::new(width, height, vec![SampleBuffer::U8(gradient_u8(width, height))])
        .expect("valid gray fixture")
        .with_crs(crs::UTM_33N)
        .with_geo_transform(GeoTransform::new(transforms::UTM33_30M))
        .with_description("utm-gray")
}

/// 16-bit gray ramp on the quarter-degree global grid.
pub fn global_gray16_raster(width: usize, height: usize) -> MemRaster {
    MemRaster::new(width, height, vec![SampleBuffer::U16(gradient_u16(width, height))])
        .expect("valid gray16 fixture")
        .with_crs(crs::WGS84)
        .with_geo_transform(GeoTransform::new(transforms::GLOBAL_QUARTER_DEGREE))
}

/// Solid-color RGB or RGBA raster in UTM 33N.
pub fn utm_rgb_raster(width: usize, height: usize, rgba: [u8; 4], with_alpha: bool) -> MemRaster {
    let bands = rgba
        .iter()
        .take(if with_alpha { 4 } else { 3 })
        .map(|&v| SampleBuffer::U8(vec![v; width * height]))
        .collect();
    MemRaster::new(width, height, bands)
        .expect("valid rgb fixture")
        .with_crs(crs::UTM_33N)
        .with_geo_transform(GeoTransform::new(transforms::UTM33_30M))
}

/// Four-color palette: red, green, blue and fully transparent.
pub fn four_color_table() -> ColorTable {
    ColorTable::new(vec![
        PaletteEntry::rgb(255, 0, 0),
        PaletteEntry::rgb(0, 255, 0),
        PaletteEntry::rgb(0, 0, 255),
        PaletteEntry::TRANSPARENT,
    ])
}

/// Palette raster cycling through [`four_color_table`], in UTM 33N.
pub fn utm_paletted_raster(width: usize, height: usize) -> MemRaster {
    MemRaster::paletted(
        width,
        height,
        SampleBuffer::U8(index_pattern(width, height, 4)),
        four_color_table(),
    )
    .expect("valid palette fixture")
    .with_crs(crs::UTM_33N)
    .with_geo_transform(GeoTransform::new(transforms::UTM33_30M))
}

/// Single-band 32-bit raster with unit pixels at (100, 200), no CRS.
pub fn int32_raster(width: usize, height: usize, samples: Vec<i32>) -> MemRaster {
    MemRaster::new(width, height, vec![SampleBuffer::I32(samples)])
        .expect("valid int32 fixture")
        .with_geo_transform(GeoTransform::new(transforms::UNIT_100_200))
}

/// Interleaved sample data for the GeoTIFF writer.
#[derive(Debug, Clone)]
pub enum FixtureSamples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    I32(Vec<i32>),
}

impl FixtureSamples {
    fn bits(&self) -> u16 {
        match self {
            FixtureSamples::U8(_) => 8,
            FixtureSamples::U16(_) => 16,
            FixtureSamples::I32(_) => 32,
        }
    }

    /// TIFF SampleFormat: 1 unsigned, 2 signed.
    fn sample_format(&self) -> u16 {
        match self {
            FixtureSamples::I32(_) => 2,
            _ => 1,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            FixtureSamples::U8(v) => v.clone(),
            FixtureSamples::U16(v) => v.iter().flat_map(|s| s.to_ne_bytes()).collect(),
            FixtureSamples::I32(v) => v.iter().flat_map(|s| s.to_ne_bytes()).collect(),
        }
    }
}

const PHOTOMETRIC_BLACK_IS_ZERO: u16 = 1;
const PHOTOMETRIC_RGB: u16 = 2;
const PHOTOMETRIC_PALETTE: u16 = 3;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;

/// Builds small GeoTIFFs: uncompressed single-strip by default, optionally
/// split into several deflate-compressed strips.
///
/// ```ignore
/// let (_dir, path) = GeoTiffBuilder::gray(4, 4, FixtureSamples::U8(gradient_u8(4, 4)))
///     .with_geo_transform(&GeoTransform::new(transforms::UTM33_30M))
///     .with_epsg(32633)
///     .write_temp("gray.tif");
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: u32,
    height: u32,
    samples_per_pixel: u16,
    photometric: u16,
    samples: FixtureSamples,
    color_map: Option<Vec<u16>>,
    pixel_scale: Option<[f64; 3]>,
    tiepoints: Vec<f64>,
    transformation: Option<[f64; 16]>,
    epsg: Option<u16>,
    rows_per_strip: Option<u32>,
    deflate: bool,
}

impl GeoTiffBuilder {
    fn new(width: usize, height: usize, samples_per_pixel: u16, photometric: u16, samples: FixtureSamples) -> Self {
        Self {
            width: width as u32,
            height: height as u32,
            samples_per_pixel,
            photometric,
            samples,
            color_map: None,
            pixel_scale: None,
            tiepoints: Vec::new(),
            transformation: None,
            epsg: None,
            rows_per_strip: None,
            deflate: false,
        }
    }

    pub fn gray(width: usize, height: usize, samples: FixtureSamples) -> Self {
        Self::new(width, height, 1, PHOTOMETRIC_BLACK_IS_ZERO, samples)
    }

    /// Three or four interleaved 8-bit bands.
    pub fn rgb(width: usize, height: usize, interleaved: Vec<u8>, with_alpha: bool) -> Self {
        let spp = if with_alpha { 4 } else { 3 };
        Self::new(width, height, spp, PHOTOMETRIC_RGB, FixtureSamples::U8(interleaved))
    }

    pub fn paletted(width: usize, height: usize, indices: Vec<u8>, palette: &[PaletteEntry]) -> Self {
        // All reds, then all greens, then all blues; 256 entries for 8-bit indices
        let mut map = vec![0u16; 3 * 256];
        for (i, entry) in palette.iter().take(256).enumerate() {
            map[i] = u16::from(entry.r) * 257;
            map[256 + i] = u16::from(entry.g) * 257;
            map[512 + i] = u16::from(entry.b) * 257;
        }
        let mut builder = Self::new(width, height, 1, PHOTOMETRIC_PALETTE, FixtureSamples::U8(indices));
        builder.color_map = Some(map);
        builder
    }

    /// Axis-aligned transforms are written as pixel scale plus one tiepoint,
    /// anything else as a model transformation matrix.
    pub fn with_geo_transform(mut self, gt: &GeoTransform) -> Self {
        let c = gt.coefficients();
        if gt.is_axis_aligned() {
            self.pixel_scale = Some([c[1], -c[5], 0.0]);
            self.tiepoints = vec![0.0, 0.0, 0.0, c[0], c[3], 0.0];
            self.transformation = None;
        } else {
            self.transformation = Some([
                c[1], c[2], 0.0, c[0], //
                c[4], c[5], 0.0, c[3], //
                0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ]);
            self.pixel_scale = None;
            self.tiepoints.clear();
        }
        self
    }

    /// Tiepoints without a pixel scale, read back as ground control points.
    pub fn with_gcps(mut self, gcps: &[GroundControlPoint]) -> Self {
        self.pixel_scale = None;
        self.transformation = None;
        self.tiepoints = gcps
            .iter()
            .flat_map(|g| [g.pixel, g.line, 0.0, g.x, g.y, 0.0])
            .collect();
        self
    }

    pub fn with_epsg(mut self, code: u16) -> Self {
        self.epsg = Some(code);
        self
    }

    /// Split the image into strips of `rows` rows each.
    pub fn with_rows_per_strip(mut self, rows: usize) -> Self {
        self.rows_per_strip = Some(rows.max(1) as u32);
        self
    }

    /// Compress every strip with deflate (TIFF compression 8).
    pub fn deflated(mut self) -> Self {
        self.deflate = true;
        self
    }

    pub fn write(&self, path: &Path) -> TiffResult<()> {
        let file = File::create(path)?;
        let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
        let mut dir = encoder.new_directory()?;

        let spp = usize::from(self.samples_per_pixel);
        dir.write_tag(Tag::ImageWidth, self.width)?;
        dir.write_tag(Tag::ImageLength, self.height)?;
        dir.write_tag(Tag::BitsPerSample, vec![self.samples.bits(); spp].as_slice())?;
        dir.write_tag(Tag::Compression, if self.deflate { 8u16 } else { 1u16 })?;
        dir.write_tag(Tag::PhotometricInterpretation, self.photometric)?;
        dir.write_tag(Tag::SamplesPerPixel, self.samples_per_pixel)?;
        dir.write_tag(Tag::SampleFormat, vec![self.samples.sample_format(); spp].as_slice())?;
        dir.write_tag(Tag::PlanarConfiguration, 1u16)?;
        let rows_per_strip = self.rows_per_strip.unwrap_or(self.height).min(self.height).max(1);
        dir.write_tag(Tag::RowsPerStrip, rows_per_strip)?;
        if spp == 4 {
            // unassociated alpha
            dir.write_tag(Tag::ExtraSamples, &[2u16][..])?;
        }
        if let Some(map) = &self.color_map {
            dir.write_tag(Tag::ColorMap, map.as_slice())?;
        }

        if let Some(scale) = &self.pixel_scale {
            dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;
        }
        if !self.tiepoints.is_empty() {
            dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), self.tiepoints.as_slice())?;
        }
        if let Some(matrix) = &self.transformation {
            dir.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), &matrix[..])?;
        }
        if let Some(code) = self.epsg {
            dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geo_key_directory(code).as_slice())?;
        }

        let bytes = self.samples.to_bytes();
        let row_bytes = bytes.len() / self.height.max(1) as usize;
        let mut offsets = Vec::new();
        let mut byte_counts = Vec::new();
        for strip in bytes.chunks(row_bytes * rows_per_strip as usize) {
            let data = if self.deflate {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(strip)?;
                encoder.finish()?
            } else {
                strip.to_vec()
            };
            offsets.push(dir.write_data(data.as_slice())? as u32);
            byte_counts.push(data.len() as u32);
        }
        dir.write_tag(Tag::StripOffsets, offsets.as_slice())?;
        dir.write_tag(Tag::StripByteCounts, byte_counts.as_slice())?;
        dir.finish()
    }

    /// Write into a fresh temporary directory. Keep the `TempDir` alive for
    /// as long as the file is needed.
    pub fn write_temp(&self, file_name: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(file_name);
        self.write(&path).expect("write GeoTIFF fixture");
        (dir, path)
    }
}

/// GTModelType, GTRasterType (area) and the CRS key.
fn geo_key_directory(code: u16) -> Vec<u16> {
    let geographic = lookup_epsg(u32::from(code))
        .map(|def| def.is_geographic())
        .unwrap_or(false);
    let (model_type, crs_key) = if geographic { (2, 2048) } else { (1, 3072) };
    vec![
        1, 1, 0, 3, //
        1024, 0, 1, model_type, //
        1025, 0, 1, 1, //
        crs_key, 0, 1, code,
    ]
}
