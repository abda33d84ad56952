//! Collaborator seams consumed by the reprojection cache and layers.
//!
//! Each trait has a native implementation backed by the workspace crates;
//! tests substitute their own to count calls or inject failures.

use std::path::Path;

use overlay_common::OverlayResult;
use projection::{resolve_crs, CrsDefinition};
use raster::{GeoTiffSource, RasterSource};
use warp::{WarpOptions, Warper};

/// Resamples a raster source into a target CRS.
pub trait WarpService: Send + Sync {
    /// Returns `Ok(None)` when the source has no usable georeferencing.
    fn warp(
        &self,
        source: &dyn RasterSource,
        target: &CrsDefinition,
    ) -> OverlayResult<Option<Box<dyn RasterSource>>>;
}

/// Turns a CRS code into a definition.
pub trait CrsResolver: Send + Sync {
    /// Fails with `InvalidProjection` for codes it does not understand.
    fn resolve(&self, code: &str) -> OverlayResult<CrsDefinition>;
}

/// Opens raster files.
pub trait RasterProvider: Send + Sync {
    fn open(&self, path: &Path) -> OverlayResult<Box<dyn RasterSource>>;
}

/// Warp service backed by [`Warper`].
#[derive(Debug, Clone, Default)]
pub struct NativeWarpService {
    warper: Warper,
}

impl NativeWarpService {
    pub fn new(options: WarpOptions) -> Self {
        Self {
            warper: Warper::new(options),
        }
    }

    pub fn options(&self) -> &WarpOptions {
        self.warper.options()
    }
}

impl WarpService for NativeWarpService {
    fn warp(
        &self,
        source: &dyn RasterSource,
        target: &CrsDefinition,
    ) -> OverlayResult<Option<Box<dyn RasterSource>>> {
        let warped = self.warper.warp(source, target)?;
        Ok(warped.map(|raster| Box::new(raster) as Box<dyn RasterSource>))
    }
}

/// Resolver over the built-in EPSG registry and well-known names.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsgResolver;

impl CrsResolver for EpsgResolver {
    fn resolve(&self, code: &str) -> OverlayResult<CrsDefinition> {
        resolve_crs(code)
    }
}

/// Provider for GeoTIFF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffProvider;

impl RasterProvider for GeoTiffProvider {
    fn open(&self, path: &Path) -> OverlayResult<Box<dyn RasterSource>> {
        Ok(Box::new(GeoTiffSource::open(path)?))
    }
}
