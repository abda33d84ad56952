//! Tests for PNG encoding functionality.
//!
//! Tests the indexed PNG and RGBA PNG encoders, including:
//! - Format selection (auto mode)
//! - Chunk layout and CRCs
//! - Encoding of assembled drawable images

use raster::png::{encode_image, encode_indexed, encode_png, encode_rgba};
use raster::{assemble_image, PaletteEntry};
use test_utils::{utm_gray_raster, utm_paletted_raster};

// ============================================================================
// Helper functions
// ============================================================================

/// Walk the chunks of a PNG stream: (type, data).
fn chunks(png: &[u8]) -> Vec<(String, Vec<u8>)> {
    assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10], "bad signature");
    let mut out = Vec::new();
    let mut pos = 8;
    while pos + 12 <= png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind = String::from_utf8(png[pos + 4..pos + 8].to_vec()).unwrap();
        let data = png[pos + 8..pos + 8 + len].to_vec();
        let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
        assert_eq!(crc, crc32fast::hash(&png[pos + 4..pos + 8 + len]), "bad CRC in {}", kind);
        out.push((kind, data));
        pos += 12 + len;
    }
    out
}

fn color_type(png: &[u8]) -> u8 {
    let (kind, ihdr) = &chunks(png)[0];
    assert_eq!(kind, "IHDR");
    ihdr[9]
}

fn noise_pixels(width: usize, height: usize) -> Vec<u8> {
    (0..width * height)
        .flat_map(|i| [(i % 251) as u8, (i / 251 % 256) as u8, (i * 7 % 253) as u8, 255])
        .collect()
}

// ============================================================================
// Format selection
// ============================================================================

#[test]
fn test_few_colors_produce_indexed_png() {
    let pixels: Vec<u8> = (0..64)
        .flat_map(|i| if i % 2 == 0 { [255, 0, 0, 255] } else { [0, 0, 0, 0] })
        .collect();
    let png = encode_png(&pixels, 8, 8).unwrap();

    assert_eq!(color_type(&png), 3);
    let kinds: Vec<String> = chunks(&png).into_iter().map(|(k, _)| k).collect();
    assert_eq!(kinds, vec!["IHDR", "PLTE", "tRNS", "IDAT", "IEND"]);
}

#[test]
fn test_many_colors_fall_back_to_rgba() {
    let png = encode_png(&noise_pixels(64, 64), 64, 64).unwrap();
    assert_eq!(color_type(&png), 6);
}

#[test]
fn test_rgba_header_dimensions() {
    let png = encode_rgba(&noise_pixels(5, 3), 5, 3).unwrap();
    let (_, ihdr) = &chunks(&png)[0];
    assert_eq!(u32::from_be_bytes(ihdr[0..4].try_into().unwrap()), 5);
    assert_eq!(u32::from_be_bytes(ihdr[4..8].try_into().unwrap()), 3);
    assert_eq!(ihdr[8], 8);
}

#[test]
fn test_indexed_idat_inflates_to_filtered_scanlines() {
    use std::io::Read;

    let palette = [PaletteEntry::rgb(0, 0, 0), PaletteEntry::rgb(255, 255, 255)];
    let png = encode_indexed(3, 2, &palette, &[0, 1, 0, 1, 0, 1]).unwrap();
    let idat = chunks(&png)
        .into_iter()
        .find(|(k, _)| k == "IDAT")
        .map(|(_, d)| d)
        .unwrap();

    let mut raw = Vec::new();
    flate2::read::ZlibDecoder::new(idat.as_slice())
        .read_to_end(&mut raw)
        .unwrap();
    assert_eq!(raw, vec![0, 0, 1, 0, 0, 1, 0, 1]);
}

// ============================================================================
// Drawable images
// ============================================================================

#[test]
fn test_paletted_image_keeps_its_palette() {
    let image = assemble_image(&utm_paletted_raster(4, 4)).unwrap();
    let png = encode_image(&image).unwrap();

    assert_eq!(color_type(&png), 3);
    let plte = chunks(&png)
        .into_iter()
        .find(|(k, _)| k == "PLTE")
        .map(|(_, d)| d)
        .unwrap();
    // Source order: red, green, blue, transparent
    assert_eq!(&plte[..6], &[255, 0, 0, 0, 255, 0]);
    assert_eq!(plte.len(), 12);
}

#[test]
fn test_gray_image_encodes() {
    let image = assemble_image(&utm_gray_raster(300, 2)).unwrap();
    let png = encode_image(&image).unwrap();
    // 256 gray levels at most, so the auto path stays indexed
    assert_eq!(color_type(&png), 3);
}
