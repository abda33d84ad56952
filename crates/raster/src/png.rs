//! PNG encoding for rendered overlays.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: used when the pixels hold at most 256
//!   distinct colors, or directly for 8-bit palette images.
//! - **RGBA PNG (color type 6)**: fallback for everything else.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::buffer::SampleBuffer;
use crate::image::{ColorModel, DrawableImage};
use crate::source::PaletteEntry;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Rows per parallel work unit during palette extraction.
const ROWS_PER_TASK: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum PngError {
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("palette has {0} entries, at most 256 are allowed")]
    PaletteTooLarge(usize),

    #[error("IDAT compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

/// Encode interleaved RGBA pixels, choosing indexed output when possible.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, PngError> {
    check_len(pixels.len(), width * height * 4)?;
    match extract_palette(pixels, width) {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_rgba(pixels, width, height),
    }
}

/// Encode a drawable image; 8-bit palette images keep their own palette.
pub fn encode_image(image: &DrawableImage) -> Result<Vec<u8>, PngError> {
    if let (ColorModel::Indexed(table), Some(SampleBuffer::U8(indices))) =
        (image.color_model(), image.band(0))
    {
        if !table.is_empty() && table.len() <= MAX_PALETTE_SIZE {
            // Indices past the table end would be invalid in PLTE terms
            if indices.iter().all(|&i| (i as usize) < table.len()) {
                return encode_indexed(image.width(), image.height(), table.entries(), indices);
            }
        }
    }
    encode_png(&image.to_rgba(), image.width(), image.height())
}

/// Collect the distinct colors of an RGBA buffer and the per-pixel indices,
/// or `None` if there are more than 256.
fn extract_palette(pixels: &[u8], width: usize) -> Option<(Vec<PaletteEntry>, Vec<u8>)> {
    let chunk_bytes = (width * 4 * ROWS_PER_TASK).max(4);

    let unique = pixels
        .par_chunks(chunk_bytes)
        .map(|chunk| {
            let mut seen = HashSet::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                seen.insert(u32::from_le_bytes([px[0], px[1], px[2], px[3]]));
                if seen.len() > MAX_PALETTE_SIZE {
                    return None;
                }
            }
            Some(seen)
        })
        .try_reduce(HashSet::new, |mut a, b| {
            a.extend(b);
            (a.len() <= MAX_PALETTE_SIZE).then_some(a)
        })?;

    let mut colors: Vec<u32> = unique.into_iter().collect();
    colors.sort_unstable();
    let lookup: HashMap<u32, u8> = colors
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i as u8))
        .collect();
    let palette = colors
        .iter()
        .map(|c| {
            let [r, g, b, a] = c.to_le_bytes();
            PaletteEntry::rgba(r, g, b, a)
        })
        .collect();

    let indices = pixels
        .par_chunks_exact(4)
        .map(|px| {
            lookup
                .get(&u32::from_le_bytes([px[0], px[1], px[2], px[3]]))
                .copied()
                .unwrap_or(0)
        })
        .collect();

    Some((palette, indices))
}

/// Encode palette indices (color type 3).
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[PaletteEntry],
    indices: &[u8],
) -> Result<Vec<u8>, PngError> {
    if palette.len() > MAX_PALETTE_SIZE {
        return Err(PngError::PaletteTooLarge(palette.len()));
    }
    check_len(indices.len(), width * height)?;

    let mut png = Vec::with_capacity(64 + palette.len() * 4 + indices.len() / 2);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|e| [e.r, e.g, e.b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS only when some entry is not fully opaque
    if palette.iter().any(|e| e.a < 255) {
        let trns: Vec<u8> = palette.iter().map(|e| e.a).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(indices, width, height, 1)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode interleaved RGBA pixels (color type 6).
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, PngError> {
    check_len(pixels.len(), width * height * 4)?;

    let mut png = Vec::with_capacity(64 + pixels.len() / 2);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    write_chunk(&mut png, b"IDAT", &deflate_scanlines(pixels, width, height, 4)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_len(actual: usize, expected: usize) -> Result<(), PngError> {
    if actual != expected {
        return Err(PngError::SizeMismatch { expected, actual });
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(
    data: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>, std::io::Error> {
    let stride = width * bytes_per_pixel;
    let mut encoder = flate2::write::ZlibEncoder::new(
        Vec::with_capacity(data.len() / 2),
        flate2::Compression::fast(),
    );
    for y in 0..height {
        encoder.write_all(&[0])?;
        encoder.write_all(&data[y * stride..(y + 1) * stride])?;
    }
    encoder.finish()
}
