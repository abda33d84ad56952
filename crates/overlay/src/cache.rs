//! Reprojection cache.
//!
//! Holds the reprojected image of one raster source together with its
//! geotransform and the CRS code it was produced for. The cache is either
//! empty or ready for exactly one CRS code; a request for another code
//! reprojects and replaces the whole triple, or fails and keeps the old one.
//!
//! Access is serialized by the owner (one cache per displayed layer).

use std::sync::Arc;
use std::time::Instant;

use overlay_common::{OverlayError, OverlayResult};
use projection::GeoTransform;
use raster::{assemble_image, DrawableImage, RasterSource};
use tracing::{debug, info, warn};

use crate::services::{CrsResolver, EpsgResolver, NativeWarpService, WarpService};

/// Observable cache state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Ready(String),
}

/// A reprojected image and the transform placing it in its CRS.
#[derive(Debug, Clone)]
pub struct ReprojectedImage {
    pub image: Arc<DrawableImage>,
    pub geo_transform: GeoTransform,
    pub crs_code: String,
}

impl ReprojectedImage {
    /// Projected coordinates of the image's pixel (0, 0) corner.
    pub fn origin(&self) -> (f64, f64) {
        self.geo_transform.origin()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.image.dimensions()
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub reprojections: u64,
    pub failures: u64,
}

/// Reprojection cache for a single raster source.
pub struct ReprojectionCache {
    warp: Arc<dyn WarpService>,
    resolver: Arc<dyn CrsResolver>,
    current: Option<ReprojectedImage>,
    stats: CacheStats,
}

impl Default for ReprojectionCache {
    fn default() -> Self {
        Self::new(
            Arc::new(NativeWarpService::default()),
            Arc::new(EpsgResolver),
        )
    }
}

impl ReprojectionCache {
    pub fn new(warp: Arc<dyn WarpService>, resolver: Arc<dyn CrsResolver>) -> Self {
        Self {
            warp,
            resolver,
            current: None,
            stats: CacheStats::default(),
        }
    }

    pub fn state(&self) -> CacheState {
        match &self.current {
            Some(current) => CacheState::Ready(current.crs_code.clone()),
            None => CacheState::Empty,
        }
    }

    /// Whether the cache already holds an image for `crs_code`.
    pub fn is_current(&self, crs_code: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.crs_code == crs_code)
    }

    /// Make sure the cached image is in `target_code` and return it.
    ///
    /// A cache hit performs no work. On a miss the target code is resolved,
    /// the source is warped and assembled, and the new triple is installed
    /// only after every step has succeeded.
    pub fn ensure_current(
        &mut self,
        source: &dyn RasterSource,
        target_code: &str,
    ) -> OverlayResult<Arc<DrawableImage>> {
        let current = self.ensure_projection(source, target_code)?;
        Ok(Arc::clone(&current.image))
    }

    /// Like [`ensure_current`](Self::ensure_current) but returns the whole
    /// cached triple.
    pub fn ensure_projection(
        &mut self,
        source: &dyn RasterSource,
        target_code: &str,
    ) -> OverlayResult<&ReprojectedImage> {
        if !self.is_current(target_code) {
            let fresh = match self.reproject(source, target_code) {
                Ok(fresh) => fresh,
                Err(e) => {
                    self.stats.failures += 1;
                    return Err(e);
                }
            };
            self.stats.reprojections += 1;
            let installed: &ReprojectedImage = self.current.insert(fresh);
            return Ok(installed);
        }

        self.stats.hits += 1;
        debug!(crs = %target_code, "Reprojection cache hit");
        self.current.as_ref().ok_or_else(|| {
            OverlayError::InvalidRaster("reprojection cache lost its image".to_string())
        })
    }

    fn reproject(
        &self,
        source: &dyn RasterSource,
        target_code: &str,
    ) -> OverlayResult<ReprojectedImage> {
        let start = Instant::now();
        let source_name = source.description().unwrap_or("raster");

        let target = self.resolver.resolve(target_code).map_err(|e| {
            warn!(crs = %target_code, error = %e, "Cannot resolve display CRS");
            OverlayError::InvalidProjection(target_code.to_string())
        })?;

        let Some(warped) = self.warp.warp(source, &target)? else {
            return Err(OverlayError::NotGeoreferenced(format!(
                "{} has no geotransform and no ground control points",
                source_name
            )));
        };

        let Some(geo_transform) = warped.geo_transform() else {
            return Err(OverlayError::NotGeoreferenced(format!(
                "reprojected {} carries no geotransform",
                source_name
            )));
        };
        if geo_transform.is_singular() {
            return Err(OverlayError::SingularTransform {
                determinant: geo_transform.determinant(),
            });
        }

        let image = assemble_image(&*warped)?;

        info!(
            source = source_name,
            crs = %target_code,
            width = image.width(),
            height = image.height(),
            color_model = image.color_model().name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Reprojected raster"
        );

        Ok(ReprojectedImage {
            image: Arc::new(image),
            geo_transform,
            crs_code: target_code.to_string(),
        })
    }

    /// Drop the cached image; the next request reprojects.
    pub fn invalidate(&mut self) {
        if self.current.take().is_some() {
            debug!("Reprojection cache invalidated");
        }
    }

    pub fn current(&self) -> Option<&ReprojectedImage> {
        self.current.as_ref()
    }

    pub fn image(&self) -> Option<Arc<DrawableImage>> {
        self.current.as_ref().map(|c| Arc::clone(&c.image))
    }

    pub fn geo_transform(&self) -> Option<GeoTransform> {
        self.current.as_ref().map(|c| c.geo_transform)
    }

    pub fn crs_code(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.crs_code.as_str())
    }

    /// Pixel dimensions of the cached image.
    pub fn image_dimensions(&self) -> Option<(usize, usize)> {
        self.current.as_ref().map(ReprojectedImage::dimensions)
    }

    /// Projected origin of the cached image.
    pub fn image_origin(&self) -> Option<(f64, f64)> {
        self.current.as_ref().map(ReprojectedImage::origin)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl std::fmt::Debug for ReprojectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReprojectionCache")
            .field("state", &self.state())
            .field("stats", &self.stats)
            .finish()
    }
}
