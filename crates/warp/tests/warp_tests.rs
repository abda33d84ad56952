//! Integration tests for the warp service.
//!
//! Covers:
//! - Identity warps reproduce the source
//! - Reprojection between CRSs keeps features in place
//! - "Not georeferenced" detection (no transform, no GCPs, no CRS)
//! - Palette sources and error propagation

use overlay_common::OverlayError;
use projection::{resolve_crs, CrsTransform, GeoTransform, GroundControlPoint};
use raster::{ColorModel, MemRaster, RasterSource, SampleBuffer};
use test_utils::{
    crs, gradient_u8, transforms, utm_gray_raster, utm_paletted_raster, utm_rgb_raster,
};
use warp::{ResamplingMethod, WarpOptions, Warper};

// ============================================================================
// Helpers
// ============================================================================

fn warper(resampling: ResamplingMethod) -> Warper {
    Warper::new(WarpOptions {
        resampling,
        ..Default::default()
    })
}

fn band_u8(raster: &MemRaster, band: usize) -> Vec<u8> {
    match raster.read_band(band).unwrap() {
        SampleBuffer::U8(v) => v,
        other => panic!("expected U8 band, got {}", other.sample_type()),
    }
}

// ============================================================================
// Identity and reprojection
// ============================================================================

#[test]
fn test_identity_warp_reproduces_source() {
    let source = utm_gray_raster(40, 30);
    let target = resolve_crs(crs::UTM_33N).unwrap();

    let warped = warper(ResamplingMethod::Nearest)
        .warp(&source, &target)
        .unwrap()
        .expect("georeferenced");

    assert_eq!((warped.width(), warped.height()), (40, 30));
    assert_eq!(warped.crs_code(), Some(crs::UTM_33N));
    assert_eq!(band_u8(&warped, 0), gradient_u8(40, 30));
}

#[test]
fn test_identity_warp_sequential_matches_parallel() {
    let source = utm_rgb_raster(16, 16, [10, 20, 30, 40], true);
    let target = resolve_crs(crs::WEB_MERCATOR).unwrap();

    let parallel = Warper::default().warp(&source, &target).unwrap().unwrap();
    let sequential = Warper::new(WarpOptions {
        parallel: false,
        ..Default::default()
    })
    .warp(&source, &target)
    .unwrap()
    .unwrap();

    assert_eq!(parallel.bands(), sequential.bands());
    assert_eq!(parallel.band_count(), 4);
}

#[test]
fn test_utm_to_web_mercator_keeps_features_in_place() {
    let source = utm_gray_raster(64, 64);
    let target = resolve_crs(crs::WEB_MERCATOR).unwrap();

    let warped = warper(ResamplingMethod::Bilinear)
        .warp(&source, &target)
        .unwrap()
        .unwrap();

    assert_eq!(warped.crs_code(), Some(crs::WEB_MERCATOR));
    let out_gt = warped.geo_transform().unwrap();
    assert!(out_gt.is_axis_aligned());

    // Follow a few source pixel centers into the output and compare values
    let to_mercator = CrsTransform::from_codes(crs::UTM_33N, crs::WEB_MERCATOR).unwrap();
    let src_gt = GeoTransform::new(transforms::UTM33_30M);
    let source_band = gradient_u8(64, 64);
    let out_band = band_u8(&warped, 0);

    for (col, row) in [(10usize, 10usize), (32, 32), (50, 20)] {
        let (x, y) = src_gt.forward(col as f64 + 0.5, row as f64 + 0.5);
        let (mx, my) = to_mercator.transform(x, y).unwrap();
        let (ox, oy) = out_gt.inverse(mx, my).unwrap();
        let out_value = out_band[oy as usize * warped.width() + ox as usize];
        let src_value = source_band[row * 64 + col];
        assert!(
            (out_value as i32 - src_value as i32).abs() <= 6,
            "pixel ({}, {}): source {} warped {}",
            col,
            row,
            src_value,
            out_value
        );
    }
}

#[test]
fn test_outside_source_is_filled_with_zero() {
    // A rotated footprint leaves the output corners uncovered
    let source = MemRaster::new(20, 20, vec![SampleBuffer::U8(vec![200; 400])])
        .unwrap()
        .with_crs(crs::UTM_33N)
        .with_geo_transform(GeoTransform::new(transforms::ROTATED));
    let target = resolve_crs(crs::UTM_33N).unwrap();

    let warped = Warper::default().warp(&source, &target).unwrap().unwrap();
    let band = band_u8(&warped, 0);

    assert_eq!(band[0], 0);
    assert!(band.iter().any(|&v| v == 200));
}

// ============================================================================
// Georeferencing
// ============================================================================

#[test]
fn test_no_geotransform_is_not_georeferenced() {
    let source = MemRaster::new(4, 4, vec![SampleBuffer::U8(vec![0; 16])])
        .unwrap()
        .with_crs(crs::UTM_33N);
    let target = resolve_crs(crs::WGS84).unwrap();

    assert!(Warper::default().warp(&source, &target).unwrap().is_none());
}

#[test]
fn test_no_crs_is_not_georeferenced() {
    let source = MemRaster::new(4, 4, vec![SampleBuffer::U8(vec![0; 16])])
        .unwrap()
        .with_geo_transform(GeoTransform::new(transforms::UTM33_30M));
    let target = resolve_crs(crs::WGS84).unwrap();

    assert!(Warper::default().warp(&source, &target).unwrap().is_none());
}

#[test]
fn test_collinear_gcps_are_not_georeferenced() {
    let source = MemRaster::new(4, 4, vec![SampleBuffer::U8(vec![0; 16])])
        .unwrap()
        .with_crs(crs::UTM_33N)
        .with_gcps(vec![
            GroundControlPoint::new(0.0, 0.0, 0.0, 0.0),
            GroundControlPoint::new(1.0, 1.0, 1.0, 1.0),
            GroundControlPoint::new(2.0, 2.0, 2.0, 2.0),
        ]);
    let target = resolve_crs(crs::WGS84).unwrap();

    assert!(Warper::default().warp(&source, &target).unwrap().is_none());
}

#[test]
fn test_gcps_replace_missing_geotransform() {
    let gt = GeoTransform::new(transforms::UTM33_30M);
    let gcps = [(0.0, 0.0), (8.0, 0.0), (0.0, 8.0), (8.0, 8.0)]
        .iter()
        .map(|&(p, l)| {
            let (x, y) = gt.forward(p, l);
            GroundControlPoint::new(p, l, x, y)
        })
        .collect();
    let source = MemRaster::new(8, 8, vec![SampleBuffer::U8(gradient_u8(8, 8))])
        .unwrap()
        .with_crs(crs::UTM_33N)
        .with_gcps(gcps);
    let target = resolve_crs(crs::UTM_33N).unwrap();

    let warped = warper(ResamplingMethod::Nearest)
        .warp(&source, &target)
        .unwrap()
        .unwrap();
    assert_eq!((warped.width(), warped.height()), (8, 8));
    assert_eq!(band_u8(&warped, 0), gradient_u8(8, 8));
}

#[test]
fn test_unknown_source_crs_is_not_georeferenced() {
    let source = utm_gray_raster(4, 4).with_crs("EPSG:999999");
    let target = resolve_crs(crs::WGS84).unwrap();
    assert!(Warper::default().warp(&source, &target).unwrap().is_none());
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn test_palette_source_uses_nearest_and_keeps_table() {
    let source = utm_paletted_raster(32, 32);
    let target = resolve_crs(crs::WEB_MERCATOR).unwrap();

    // Cubic requested, but palette indices must not be blended
    let warped = warper(ResamplingMethod::Cubic)
        .warp(&source, &target)
        .unwrap()
        .unwrap();

    assert!(band_u8(&warped, 0).iter().all(|&i| i < 4));
    assert_eq!(warped.color_table(), source.color_table());
    let image = raster::assemble_image(&warped).unwrap();
    assert!(matches!(image.color_model(), ColorModel::Indexed(_)));
}

#[test]
fn test_singular_source_transform_is_fatal() {
    let source = utm_gray_raster(4, 4).with_geo_transform(GeoTransform::new(transforms::SINGULAR));
    let target = resolve_crs(crs::UTM_33N).unwrap();

    assert!(matches!(
        Warper::default().warp(&source, &target),
        Err(OverlayError::SingularTransform { .. })
    ));
}
