//! Tests for GeoTIFF decoding.
//!
//! Fixtures are written on the fly with `test_utils::GeoTiffBuilder`, then
//! read back through `GeoTiffSource`.

use overlay_common::OverlayError;
use projection::{GeoTransform, GroundControlPoint};
use raster::{
    assemble_image, ColorInterpretation, ColorModel, GeoTiffSource, RasterSource, SampleBuffer,
    SampleType,
};
use test_utils::{
    assert_approx_eq, cell_id_i32, four_color_table, gradient_u16, gradient_u8, index_pattern,
    interleave, transforms, FixtureSamples, GeoTiffBuilder,
};

// ============================================================================
// Sample types and photometrics
// ============================================================================

#[test]
fn test_gray_u8_with_utm_georeferencing() {
    let (_dir, path) = GeoTiffBuilder::gray(6, 4, FixtureSamples::U8(gradient_u8(6, 4)))
        .with_geo_transform(&GeoTransform::new(transforms::UTM33_30M))
        .with_epsg(32633)
        .write_temp("gray.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert_eq!((source.width(), source.height()), (6, 4));
    assert_eq!(source.band_count(), 1);
    assert_eq!(source.sample_type(), SampleType::U8);
    assert_eq!(source.color_interpretation(0), ColorInterpretation::Gray);
    assert_eq!(source.crs_code(), Some("EPSG:32633"));
    assert_eq!(
        source.geo_transform().map(|gt| gt.coefficients()),
        Some(transforms::UTM33_30M)
    );
    assert_eq!(source.read_band(0).unwrap(), SampleBuffer::U8(gradient_u8(6, 4)));
    assert!(source.description().unwrap().ends_with("gray.tif"));
}

#[test]
fn test_gray_u16_geographic() {
    let (_dir, path) = GeoTiffBuilder::gray(4, 3, FixtureSamples::U16(gradient_u16(4, 3)))
        .with_geo_transform(&GeoTransform::new(transforms::GLOBAL_QUARTER_DEGREE))
        .with_epsg(4326)
        .write_temp("gray16.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert_eq!(source.sample_type(), SampleType::U16);
    assert_eq!(source.crs_code(), Some("EPSG:4326"));
    assert_eq!(source.read_band(0).unwrap(), SampleBuffer::U16(gradient_u16(4, 3)));
}

#[test]
fn test_signed_int32() {
    let (_dir, path) = GeoTiffBuilder::gray(3, 2, FixtureSamples::I32(vec![-7, 0, 7, 1000, -1000, 42]))
        .write_temp("int32.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert_eq!(source.sample_type(), SampleType::I32);
    assert_eq!(
        source.read_band(0).unwrap(),
        SampleBuffer::I32(vec![-7, 0, 7, 1000, -1000, 42])
    );
    let image = assemble_image(&source).unwrap();
    assert!(matches!(image.color_model(), ColorModel::Generic { min, max } if *min == -1000.0 && *max == 1000.0));
}

#[test]
fn test_rgba_is_split_into_bands() {
    let bands = vec![vec![10u8, 11], vec![20, 21], vec![30, 31], vec![255, 0]];
    let (_dir, path) = GeoTiffBuilder::rgb(2, 1, interleave(&bands), true).write_temp("rgba.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert_eq!(source.band_count(), 4);
    assert_eq!(source.color_interpretation(3), ColorInterpretation::Alpha);
    for (i, expected) in bands.iter().enumerate() {
        assert_eq!(source.read_band(i).unwrap(), SampleBuffer::U8(expected.clone()));
    }

    let image = assemble_image(&source).unwrap();
    assert_eq!(image.rgba_at(1, 0), [11, 21, 31, 0]);
}

#[test]
fn test_palette_color_map_is_read() {
    let table = four_color_table();
    let (_dir, path) = GeoTiffBuilder::paletted(4, 2, index_pattern(4, 2, 4), table.entries())
        .with_epsg(32633)
        .write_temp("palette.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert_eq!(source.color_interpretation(0), ColorInterpretation::PaletteIndex);
    let read = source.color_table().unwrap();
    assert_eq!(read.len(), 256);
    for i in 0..3 {
        let (a, b) = (read.entries()[i], table.entries()[i]);
        assert_eq!((a.r, a.g, a.b), (b.r, b.g, b.b));
    }

    let image = assemble_image(&source).unwrap();
    assert!(matches!(image.color_model(), ColorModel::Indexed(_)));
    assert_eq!(image.rgba_at(1, 0), [0, 255, 0, 255]);
}

#[test]
fn test_palette_strips_are_reassembled() {
    let table = four_color_table();
    let indices = index_pattern(5, 7, 4);
    let (_dir, path) = GeoTiffBuilder::paletted(5, 7, indices.clone(), table.entries())
        .with_rows_per_strip(3)
        .write_temp("strips.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert_eq!((source.width(), source.height()), (5, 7));
    assert_eq!(source.read_band(0).unwrap(), SampleBuffer::U8(indices));
}

#[test]
fn test_deflated_palette_is_read() {
    let table = four_color_table();
    let indices = index_pattern(6, 5, 4);
    let (_dir, path) = GeoTiffBuilder::paletted(6, 5, indices.clone(), table.entries())
        .with_rows_per_strip(2)
        .deflated()
        .with_geo_transform(&GeoTransform::new(transforms::UTM33_30M))
        .with_epsg(32633)
        .write_temp("deflated.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert_eq!(source.read_band(0).unwrap(), SampleBuffer::U8(indices));
    assert_eq!(source.crs_code(), Some("EPSG:32633"));
    let image = assemble_image(&source).unwrap();
    assert!(matches!(image.color_model(), ColorModel::Indexed(_)));
}

#[test]
fn test_deflated_gray_is_read() {
    let (_dir, path) = GeoTiffBuilder::gray(4, 6, FixtureSamples::U8(gradient_u8(4, 6)))
        .with_rows_per_strip(4)
        .deflated()
        .write_temp("gray-deflate.tif");

    let source = GeoTiffSource::open(&path).unwrap();
    assert_eq!(source.read_band(0).unwrap(), SampleBuffer::U8(gradient_u8(4, 6)));
}

// ============================================================================
// Georeferencing
// ============================================================================

#[test]
fn test_rotated_transform_round_trips() {
    let (_dir, path) = GeoTiffBuilder::gray(2, 2, FixtureSamples::U8(vec![1, 2, 3, 4]))
        .with_geo_transform(&GeoTransform::new(transforms::ROTATED))
        .write_temp("rotated.tif");

    let gt = GeoTiffSource::open(&path).unwrap().geo_transform().unwrap();
    for (got, want) in gt.coefficients().iter().zip(transforms::ROTATED) {
        assert_approx_eq!(*got, want, 1e-12);
    }
}

#[test]
fn test_tiepoints_become_gcps() {
    let gcps = vec![
        GroundControlPoint::new(0.0, 0.0, 100.0, 200.0),
        GroundControlPoint::new(10.0, 0.0, 110.0, 200.0),
        GroundControlPoint::new(0.0, 10.0, 100.0, 190.0),
    ];
    let (_dir, path) = GeoTiffBuilder::gray(10, 10, FixtureSamples::U8(vec![0; 100]))
        .with_gcps(&gcps)
        .write_temp("gcps.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert!(source.geo_transform().is_none());
    assert_eq!(source.gcps(), gcps.as_slice());
}

#[test]
fn test_plain_tiff_has_no_georeferencing() {
    let (_dir, path) = GeoTiffBuilder::gray(2, 1, FixtureSamples::I32(cell_id_i32(2, 1))).write_temp("plain.tif");

    let source = GeoTiffSource::open(&path).unwrap();

    assert!(source.geo_transform().is_none());
    assert!(source.gcps().is_empty());
    assert!(source.crs_code().is_none());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_garbage_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-a-tiff.tif");
    std::fs::write(&path, b"definitely not a tiff").unwrap();

    match GeoTiffSource::open(&path) {
        Err(OverlayError::RasterRead(msg)) => assert!(msg.contains("not-a-tiff.tif")),
        other => panic!("expected RasterRead, got {:?}", other.map(|s| s.path().to_string())),
    }
}

#[test]
fn test_band_out_of_range_is_read_error() {
    let (_dir, path) = GeoTiffBuilder::gray(1, 1, FixtureSamples::U8(vec![0])).write_temp("one.tif");
    let source = GeoTiffSource::open(&path).unwrap();
    assert!(matches!(source.read_band(1), Err(OverlayError::RasterRead(_))));
}
