//! GeoTIFF-backed raster sources.
//!
//! The whole image is decoded on open with the `tiff` crate (strip or tiled,
//! chunky layout) and split into one sample buffer per band. Georeferencing
//! comes from, in order of preference:
//! - `ModelTransformationTag` (34264)
//! - `ModelPixelScaleTag` (33550) with a single `ModelTiepointTag` (33922)
//! - several tiepoints without a pixel scale, exposed as ground control points
//!
//! The CRS code is read from the GeoKey directory (34735):
//! `ProjectedCSTypeGeoKey` (3072) first, then `GeographicTypeGeoKey` (2048).

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::ZlibDecoder;

use overlay_common::{OverlayError, OverlayResult};
use projection::{GeoTransform, GroundControlPoint};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::{debug, info};

use crate::buffer::{SampleBuffer, SampleType};
use crate::source::{
    default_interpretations, ColorInterpretation, ColorTable, PaletteEntry, RasterSource,
};

const GT_RASTER_TYPE_GEO_KEY: u64 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u64 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u64 = 3072;
const RASTER_PIXEL_IS_POINT: u64 = 2;
const USER_DEFINED: u64 = 32767;

const COMPRESSION_NONE: u64 = 1;
const COMPRESSION_DEFLATE: u64 = 8;
const COMPRESSION_ADOBE_DEFLATE: u64 = 32946;
const PREDICTOR_NONE: u64 = 1;
const PREDICTOR_HORIZONTAL: u64 = 2;

/// A decoded GeoTIFF file.
#[derive(Debug, Clone)]
pub struct GeoTiffSource {
    path: String,
    width: usize,
    height: usize,
    bands: Vec<SampleBuffer>,
    interpretations: Vec<ColorInterpretation>,
    color_table: Option<ColorTable>,
    crs_code: Option<String>,
    geo_transform: Option<GeoTransform>,
    gcps: Vec<GroundControlPoint>,
}

impl GeoTiffSource {
    /// Open and decode a GeoTIFF. Any I/O or decoding failure is a `RasterRead`.
    pub fn open(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let read_err = |e: tiff::TiffError| OverlayError::RasterRead(format!("{}: {}", shown, e));

        let file = File::open(path)
            .map_err(|e| OverlayError::RasterRead(format!("{}: {}", shown, e)))?;
        let mut decoder = Decoder::new(BufReader::new(file)).map_err(read_err)?;

        let (width, height) = decoder.dimensions().map_err(read_err)?;
        let (width, height) = (width as usize, height as usize);

        let (samples_per_pixel, paletted) = match decoder.colortype().map_err(read_err)? {
            ColorType::Gray(_) => (1, false),
            ColorType::GrayA(_) => (2, false),
            ColorType::RGB(_) => (3, false),
            ColorType::RGBA(_) => (4, false),
            ColorType::Palette(8) => (1, true),
            other => {
                return Err(OverlayError::RasterRead(format!(
                    "{}: unsupported color type {:?}",
                    shown, other
                )))
            }
        };

        let color_table = if paletted {
            Some(read_color_table(&mut decoder).ok_or_else(|| {
                OverlayError::RasterRead(format!("{}: palette image without ColorMap", shown))
            })?)
        } else {
            None
        };

        let geo_keys = read_geo_keys(&mut decoder);
        let crs_code = crs_from_geo_keys(&geo_keys);
        let pixel_is_point = geo_key(&geo_keys, GT_RASTER_TYPE_GEO_KEY) == Some(RASTER_PIXEL_IS_POINT);
        let (geo_transform, gcps) = read_georeferencing(&mut decoder, pixel_is_point);

        let bands = if paletted {
            let indices = read_palette_indices(&mut decoder, path, width, height)
                .map_err(|e| OverlayError::RasterRead(format!("{}: {}", shown, e)))?;
            vec![SampleBuffer::U8(indices)]
        } else {
            let image = decoder.read_image().map_err(read_err)?;
            split_bands(image, samples_per_pixel, &shown)?
        };

        let interpretations = if paletted {
            vec![ColorInterpretation::PaletteIndex]
        } else if samples_per_pixel == 2 {
            vec![ColorInterpretation::Gray, ColorInterpretation::Alpha]
        } else {
            default_interpretations(samples_per_pixel)
        };

        info!(
            path = %shown,
            width,
            height,
            bands = bands.len(),
            crs = crs_code.as_deref().unwrap_or("none"),
            georeferenced = geo_transform.is_some() || !gcps.is_empty(),
            "Opened GeoTIFF"
        );

        Ok(Self {
            path: shown,
            width,
            height,
            bands,
            interpretations,
            color_table,
            crs_code,
            geo_transform,
            gcps,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl RasterSource for GeoTiffSource {
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
        self.bands
            .first()
            .map(SampleBuffer::sample_type)
            .unwrap_or(SampleType::U8)
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
                "{}: band {} out of range ({} bands)",
                self.path,
                band,
                self.bands.len()
            ))
        })
    }

    fn description(&self) -> Option<&str> {
        Some(&self.path)
    }
}

fn optional_f64_vec<R>(decoder: &mut Decoder<R>, tag: Tag) -> Option<Vec<f64>>
where
    R: std::io::Read + std::io::Seek,
{
    decoder
        .find_tag(tag)
        .ok()
        .flatten()
        .and_then(|v| v.into_f64_vec().ok())
}

fn optional_u64_vec<R>(decoder: &mut Decoder<R>, tag: Tag) -> Option<Vec<u64>>
where
    R: std::io::Read + std::io::Seek,
{
    decoder
        .find_tag(tag)
        .ok()
        .flatten()
        .and_then(|v| v.into_u64_vec().ok())
}

fn first_u64<R>(decoder: &mut Decoder<R>, tag: Tag) -> Option<u64>
where
    R: std::io::Read + std::io::Seek,
{
    optional_u64_vec(decoder, tag).and_then(|v| v.first().copied())
}

/// Strip or tile grid of an image: chunk size plus the file extents of
/// every chunk, in row-major chunk order.
struct ChunkLayout {
    chunk_width: usize,
    chunk_height: usize,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl ChunkLayout {
    fn read<R>(decoder: &mut Decoder<R>, width: usize, height: usize) -> Result<Self, String>
    where
        R: std::io::Read + std::io::Seek,
    {
        let tiled = (
            first_u64(decoder, Tag::TileWidth),
            first_u64(decoder, Tag::TileLength),
            optional_u64_vec(decoder, Tag::TileOffsets),
            optional_u64_vec(decoder, Tag::TileByteCounts),
        );
        let layout = match tiled {
            (Some(tw), Some(th), Some(offsets), Some(byte_counts)) => Self {
                chunk_width: tw as usize,
                chunk_height: th as usize,
                offsets,
                byte_counts,
            },
            _ => {
                let rows = first_u64(decoder, Tag::RowsPerStrip)
                    .map_or(height, |r| (r as usize).min(height));
                Self {
                    chunk_width: width,
                    chunk_height: rows,
                    offsets: optional_u64_vec(decoder, Tag::StripOffsets)
                        .ok_or("missing StripOffsets")?,
                    byte_counts: optional_u64_vec(decoder, Tag::StripByteCounts)
                        .ok_or("missing StripByteCounts")?,
                }
            }
        };

        if layout.chunk_width == 0 || layout.chunk_height == 0 {
            return Err("zero-sized strips or tiles".to_string());
        }
        let expected = width.div_ceil(layout.chunk_width) * height.div_ceil(layout.chunk_height);
        if layout.offsets.len() < expected || layout.byte_counts.len() < expected {
            return Err(format!(
                "expected {} strips or tiles, found {}",
                expected,
                layout.offsets.len().min(layout.byte_counts.len())
            ));
        }
        Ok(layout)
    }
}

/// Read 8-bit palette indices straight from the strips or tiles.
///
/// The `tiff` decoder refuses to expand `RGBPalette` images, so the chunks
/// are read from the file and inflated here. Supports uncompressed and
/// deflate data, with or without horizontal differencing.
fn read_palette_indices<R>(
    decoder: &mut Decoder<R>,
    path: &Path,
    width: usize,
    height: usize,
) -> Result<Vec<u8>, String>
where
    R: std::io::Read + std::io::Seek,
{
    let pixels = width
        .checked_mul(height)
        .filter(|&n| n <= Limits::default().decoding_buffer_size)
        .ok_or_else(|| format!("{}x{} palette image exceeds the decoding limit", width, height))?;

    let compression = first_u64(decoder, Tag::Compression).unwrap_or(COMPRESSION_NONE);
    if !matches!(
        compression,
        COMPRESSION_NONE | COMPRESSION_DEFLATE | COMPRESSION_ADOBE_DEFLATE
    ) {
        return Err(format!("unsupported palette compression {}", compression));
    }
    let predictor = first_u64(decoder, Tag::Predictor).unwrap_or(PREDICTOR_NONE);
    if predictor != PREDICTOR_NONE && predictor != PREDICTOR_HORIZONTAL {
        return Err(format!("unsupported predictor {}", predictor));
    }

    let layout = ChunkLayout::read(decoder, width, height)?;
    let mut file = File::open(path).map_err(|e| e.to_string())?;
    let file_len = file.metadata().map_err(|e| e.to_string())?.len();

    let across = width.div_ceil(layout.chunk_width);
    let chunk_len = layout.chunk_width * layout.chunk_height;
    let mut indices = vec![0u8; pixels];

    for (k, (&offset, &count)) in layout.offsets.iter().zip(&layout.byte_counts).enumerate() {
        let x0 = (k % across) * layout.chunk_width;
        let y0 = (k / across) * layout.chunk_height;
        if y0 >= height {
            break;
        }
        if offset.checked_add(count).map_or(true, |end| end > file_len) {
            return Err(format!("chunk {} lies outside the file", k));
        }

        let mut raw = vec![0u8; count as usize];
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut raw))
            .map_err(|e| format!("chunk {}: {}", k, e))?;

        let mut chunk = if compression == COMPRESSION_NONE {
            raw
        } else {
            let mut inflated = Vec::with_capacity(chunk_len);
            ZlibDecoder::new(raw.as_slice())
                .take(chunk_len as u64)
                .read_to_end(&mut inflated)
                .map_err(|e| format!("chunk {}: {}", k, e))?;
            inflated
        };

        // Strips at the bottom edge may hold fewer rows
        let rows = layout.chunk_height.min(height - y0);
        if chunk.len() < rows * layout.chunk_width {
            return Err(format!(
                "chunk {} holds {} bytes, expected {}",
                k,
                chunk.len(),
                rows * layout.chunk_width
            ));
        }
        if predictor == PREDICTOR_HORIZONTAL {
            undo_horizontal_predictor(&mut chunk[..rows * layout.chunk_width], layout.chunk_width);
        }

        let cols = layout.chunk_width.min(width - x0);
        for r in 0..rows {
            let src = &chunk[r * layout.chunk_width..r * layout.chunk_width + cols];
            let dst = (y0 + r) * width + x0;
            indices[dst..dst + cols].copy_from_slice(src);
        }
    }

    Ok(indices)
}

fn undo_horizontal_predictor(data: &mut [u8], row_len: usize) {
    for row in data.chunks_exact_mut(row_len) {
        for x in 1..row.len() {
            row[x] = row[x].wrapping_add(row[x - 1]);
        }
    }
}

/// ColorMap holds all reds, then all greens, then all blues, 16 bits each.
fn read_color_table<R>(decoder: &mut Decoder<R>) -> Option<ColorTable>
where
    R: std::io::Read + std::io::Seek,
{
    let map = optional_u64_vec(decoder, Tag::ColorMap)?;
    if map.is_empty() || map.len() % 3 != 0 {
        return None;
    }
    let n = map.len() / 3;
    let entries = (0..n)
        .map(|i| {
            PaletteEntry::rgb(
                (map[i] >> 8) as u8,
                (map[n + i] >> 8) as u8,
                (map[2 * n + i] >> 8) as u8,
            )
        })
        .collect();
    Some(ColorTable::new(entries))
}

/// (key id, value) pairs of short-valued GeoKeys.
fn read_geo_keys<R>(decoder: &mut Decoder<R>) -> Vec<(u64, u64)>
where
    R: std::io::Read + std::io::Seek,
{
    let Some(directory) = optional_u64_vec(decoder, Tag::GeoKeyDirectoryTag) else {
        return Vec::new();
    };
    if directory.len() < 4 {
        return Vec::new();
    }
    directory[4..]
        .chunks_exact(4)
        .filter(|entry| entry[1] == 0)
        .map(|entry| (entry[0], entry[3]))
        .collect()
}

fn geo_key(keys: &[(u64, u64)], id: u64) -> Option<u64> {
    keys.iter().find(|(k, _)| *k == id).map(|(_, v)| *v)
}

fn crs_from_geo_keys(keys: &[(u64, u64)]) -> Option<String> {
    [PROJECTED_CS_TYPE_GEO_KEY, GEOGRAPHIC_TYPE_GEO_KEY]
        .iter()
        .filter_map(|&id| geo_key(keys, id))
        .find(|&code| code != 0 && code != USER_DEFINED)
        .map(|code| format!("EPSG:{}", code))
}

fn read_georeferencing<R>(
    decoder: &mut Decoder<R>,
    pixel_is_point: bool,
) -> (Option<GeoTransform>, Vec<GroundControlPoint>)
where
    R: std::io::Read + std::io::Seek,
{
    let shift = |gt: GeoTransform| {
        if !pixel_is_point {
            return gt;
        }
        // Tie points name pixel centers; move the origin to the outer corner
        let c = gt.coefficients();
        GeoTransform::new([
            c[0] - 0.5 * (c[1] + c[2]),
            c[1],
            c[2],
            c[3] - 0.5 * (c[4] + c[5]),
            c[4],
            c[5],
        ])
    };

    if let Some(m) = optional_f64_vec(decoder, Tag::ModelTransformationTag) {
        if m.len() >= 16 {
            debug!("Georeferenced by ModelTransformationTag");
            return (Some(shift(GeoTransform::new([m[3], m[0], m[1], m[7], m[4], m[5]]))), Vec::new());
        }
    }

    let tiepoints = optional_f64_vec(decoder, Tag::ModelTiepointTag).unwrap_or_default();
    let scale = optional_f64_vec(decoder, Tag::ModelPixelScaleTag);

    match (scale, tiepoints.len() / 6) {
        (Some(s), n) if n >= 1 && s.len() >= 2 => {
            let (i, j, x, y) = (tiepoints[0], tiepoints[1], tiepoints[3], tiepoints[4]);
            let gt = GeoTransform::new([x - i * s[0], s[0], 0.0, y + j * s[1], 0.0, -s[1]]);
            (Some(shift(gt)), Vec::new())
        }
        (_, n) if n > 1 => {
            let gcps = tiepoints
                .chunks_exact(6)
                .map(|t| GroundControlPoint::new(t[0], t[1], t[3], t[4]))
                .collect();
            (None, gcps)
        }
        _ => (None, Vec::new()),
    }
}

fn deinterleave<T: Copy>(data: Vec<T>, samples: usize) -> Vec<Vec<T>> {
    if samples == 1 {
        return vec![data];
    }
    let mut bands: Vec<Vec<T>> = (0..samples)
        .map(|_| Vec::with_capacity(data.len() / samples))
        .collect();
    for pixel in data.chunks_exact(samples) {
        for (band, &value) in bands.iter_mut().zip(pixel) {
            band.push(value);
        }
    }
    bands
}

fn split_bands(
    image: DecodingResult,
    samples: usize,
    path: &str,
) -> OverlayResult<Vec<SampleBuffer>> {
    let bands = match image {
        DecodingResult::U8(v) => deinterleave(v, samples).into_iter().map(SampleBuffer::U8).collect(),
        DecodingResult::U16(v) => deinterleave(v, samples).into_iter().map(SampleBuffer::U16).collect(),
        DecodingResult::I16(v) => deinterleave(v, samples).into_iter().map(SampleBuffer::I16).collect(),
        DecodingResult::U32(v) => deinterleave(v, samples).into_iter().map(SampleBuffer::U32).collect(),
        DecodingResult::I32(v) => deinterleave(v, samples).into_iter().map(SampleBuffer::I32).collect(),
        DecodingResult::F32(v) => deinterleave(v, samples).into_iter().map(SampleBuffer::F32).collect(),
        DecodingResult::F64(v) => deinterleave(v, samples).into_iter().map(SampleBuffer::F64).collect(),
        _ => {
            return Err(OverlayError::RasterRead(format!(
                "{}: unsupported sample format",
                path
            )))
        }
    };
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave_rgb() {
        let bands = deinterleave(vec![1u8, 2, 3, 4, 5, 6], 3);
        assert_eq!(bands, vec![vec![1, 4], vec![2, 5], vec![3, 6]]);
    }

    #[test]
    fn test_undo_horizontal_predictor() {
        let mut rows = vec![5u8, 1, 1, 254, 10, 0, 2, 3];
        undo_horizontal_predictor(&mut rows, 4);
        assert_eq!(rows, vec![5, 6, 7, 5, 10, 10, 12, 15]);
    }

    #[test]
    fn test_crs_prefers_projected_key() {
        let keys = vec![(1024, 1), (2048, 4326), (3072, 32633)];
        assert_eq!(crs_from_geo_keys(&keys).as_deref(), Some("EPSG:32633"));
        assert_eq!(crs_from_geo_keys(&[(2048, 4326)]).as_deref(), Some("EPSG:4326"));
        assert_eq!(crs_from_geo_keys(&[(3072, USER_DEFINED)]), None);
    }

    #[test]
    fn test_open_missing_file_is_read_error() {
        let err = GeoTiffSource::open("/nonexistent/raster.tif").unwrap_err();
        assert!(matches!(err, OverlayError::RasterRead(_)));
        assert!(err.is_retryable());
    }
}
