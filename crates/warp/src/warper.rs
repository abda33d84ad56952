//! The warp service: resample a raster source into another CRS.
//!
//! For each output pixel the warper maps back into the source (inverse
//! mapping), using [`LinearApprox`] per output row, and samples every band
//! with the configured kernel. Output pixels that land outside the source
//! raster, or where the CRS transform is undefined, are filled with 0.

use std::time::Instant;

use overlay_common::{OverlayError, OverlayResult};
use projection::{fit_affine, resolve_crs, CrsDefinition, CrsTransform, GeoTransform};
use raster::{ColorInterpretation, MemRaster, RasterSource, SampleBuffer};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::approx::LinearApprox;
use crate::extent::{suggest_output_grid, OutputGrid};
use crate::interpolation::sample;
use crate::options::{ResamplingMethod, WarpOptions};

/// Source pixel coordinates for every pixel of one output row.
struct RowMap {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

/// Reprojects raster sources using the configured [`WarpOptions`].
#[derive(Debug, Clone, Default)]
pub struct Warper {
    options: WarpOptions,
}

impl Warper {
    pub fn new(options: WarpOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WarpOptions {
        &self.options
    }

    /// Warp `source` into `target`.
    ///
    /// Returns `Ok(None)` when the source carries no usable georeferencing:
    /// no geotransform and no fittable ground control points, or no
    /// resolvable CRS.
    pub fn warp(
        &self,
        source: &dyn RasterSource,
        target: &CrsDefinition,
    ) -> OverlayResult<Option<MemRaster>> {
        let start = Instant::now();

        let Some(src_gt) = source_geo_transform(source) else {
            warn!(
                source = source.description().unwrap_or("raster"),
                "Source has neither a geotransform nor usable ground control points"
            );
            return Ok(None);
        };
        let Some(src_def) = source_crs(source) else {
            return Ok(None);
        };

        let (width, height) = (source.width(), source.height());
        let src_inv = src_gt.inverted()?;
        let forward = CrsTransform::new(src_def, target.clone());
        let grid = suggest_output_grid(width, height, &src_gt, &forward, self.options.edge_samples)?;
        let inverse = forward.reversed();

        let method = if source.color_interpretation(0) == ColorInterpretation::PaletteIndex {
            ResamplingMethod::Nearest
        } else {
            self.options.resampling
        };

        let bands = (0..source.band_count())
            .map(|band| source.read_band(band))
            .collect::<OverlayResult<Vec<_>>>()?;

        let dst_gt = grid.geo_transform;
        let project = |px: f64, py: f64| -> Option<(f64, f64)> {
            let (x, y) = dst_gt.forward(px, py);
            let (sx, sy) = inverse.transform(x, y).ok()?;
            Some(src_inv.forward(sx, sy))
        };
        let approx = LinearApprox::new(self.options.max_error);
        let map_row = |row: usize| {
            let mut xs = vec![f64::NAN; grid.width];
            let mut ys = vec![f64::NAN; grid.width];
            approx.transform_scanline(project, row, &mut xs, &mut ys);
            RowMap { xs, ys }
        };
        let rows: Vec<RowMap> = if self.options.parallel {
            (0..grid.height).into_par_iter().map(map_row).collect()
        } else {
            (0..grid.height).map(map_row).collect()
        };

        let out_bands = bands
            .iter()
            .map(|band| self.resample_band(band, width, height, &grid, &rows, method))
            .collect::<Vec<_>>();

        let interpretations = (0..source.band_count())
            .map(|band| source.color_interpretation(band))
            .collect();
        let mut warped = MemRaster::new(grid.width, grid.height, out_bands)?
            .with_interpretations(interpretations)
            .with_crs(target.code())
            .with_geo_transform(dst_gt);
        if let Some(table) = source.color_table() {
            warped = warped.with_color_table(table.clone());
        }
        if let Some(description) = source.description() {
            warped = warped.with_description(description);
        }

        info!(
            src_width = width,
            src_height = height,
            dst_width = grid.width,
            dst_height = grid.height,
            crs = %target.code(),
            resampling = %method,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Warped raster"
        );

        Ok(Some(warped))
    }

    fn resample_band(
        &self,
        band: &SampleBuffer,
        src_width: usize,
        src_height: usize,
        grid: &OutputGrid,
        rows: &[RowMap],
        method: ResamplingMethod,
    ) -> SampleBuffer {
        let sample_row = |map: &RowMap| -> Vec<f64> {
            map.xs
                .iter()
                .zip(&map.ys)
                .map(|(&x, &y)| sample(band, src_width, src_height, x, y, method).unwrap_or(0.0))
                .collect()
        };
        let values: Vec<Vec<f64>> = if self.options.parallel {
            rows.par_iter().map(sample_row).collect()
        } else {
            rows.iter().map(sample_row).collect()
        };

        let mut out = SampleBuffer::zeroed(band.sample_type(), grid.width * grid.height);
        for (row, row_values) in values.iter().enumerate() {
            for (col, &v) in row_values.iter().enumerate() {
                out.set_f64(row * grid.width + col, v);
            }
        }
        out
    }
}

/// The source's own geotransform, or one fitted through its GCPs.
pub fn source_geo_transform(source: &dyn RasterSource) -> Option<GeoTransform> {
    if let Some(gt) = source.geo_transform() {
        return Some(gt);
    }
    let gcps = source.gcps();
    if gcps.is_empty() {
        return None;
    }
    match fit_affine(gcps) {
        Ok(gt) => {
            debug!(gcps = gcps.len(), "Fitted geotransform from ground control points");
            Some(gt)
        }
        Err(e) => {
            warn!(error = %e, "Ground control points are unusable");
            None
        }
    }
}

fn source_crs(source: &dyn RasterSource) -> Option<CrsDefinition> {
    let Some(code) = source.crs_code() else {
        warn!(
            source = source.description().unwrap_or("raster"),
            "Source has no CRS"
        );
        return None;
    };
    match resolve_crs(code) {
        Ok(def) => Some(def),
        Err(OverlayError::InvalidProjection(code)) => {
            warn!(crs = %code, "Source CRS is not supported");
            None
        }
        Err(e) => {
            warn!(error = %e, "Source CRS could not be resolved");
            None
        }
    }
}
