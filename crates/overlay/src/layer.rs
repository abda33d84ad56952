//! Raster overlay layer.
//!
//! Glue between a raster source, its reprojection cache and the host
//! canvas. The host passes the display CRS and a viewport mapper on every
//! paint; the layer never reads a global display projection.

use std::path::Path;
use std::sync::Arc;

use overlay_common::{BoundingBox, OverlayError, OverlayResult};
use raster::{DrawableImage, RasterSource};
use tracing::{error, info, warn};
use warp::source_geo_transform;

use crate::cache::ReprojectionCache;
use crate::canvas::Canvas;
use crate::config::OverlayConfig;
use crate::placement::{place_image, ProjectedToScreen, ScreenPlacement};
use crate::services::{
    CrsResolver, EpsgResolver, GeoTiffProvider, NativeWarpService, RasterProvider, WarpService,
};

/// Services a layer reprojects with.
#[derive(Clone)]
pub struct OverlayServices {
    pub warp: Arc<dyn WarpService>,
    pub resolver: Arc<dyn CrsResolver>,
}

impl OverlayServices {
    /// Native warp service and the built-in CRS registry.
    pub fn native(config: &OverlayConfig) -> Self {
        Self {
            warp: Arc::new(NativeWarpService::new(config.warp.clone())),
            resolver: Arc::new(EpsgResolver),
        }
    }
}

impl Default for OverlayServices {
    fn default() -> Self {
        Self::native(&OverlayConfig::default())
    }
}

/// Result of painting a layer.
#[derive(Debug, Clone)]
pub enum PaintOutcome {
    Image {
        image: Arc<DrawableImage>,
        placement: ScreenPlacement,
    },
    /// Painting failed; the host shows a marked error indicator instead.
    ErrorIndicator { message: String },
}

impl PaintOutcome {
    pub fn is_image(&self) -> bool {
        matches!(self, PaintOutcome::Image { .. })
    }
}

/// A georeferenced raster displayed over the map.
pub struct RasterLayer {
    name: String,
    source: Box<dyn RasterSource>,
    cache: ReprojectionCache,
    resolver: Arc<dyn CrsResolver>,
    /// Set once the source turned out not to be georeferenced.
    not_georeferenced: Option<String>,
}

impl RasterLayer {
    /// Create a layer with the native services and reproject it into
    /// `display_crs` right away. A failed first attempt is logged only.
    pub fn new(name: impl Into<String>, source: Box<dyn RasterSource>, display_crs: &str) -> Self {
        Self::with_services(name, source, OverlayServices::default(), display_crs)
    }

    pub fn with_services(
        name: impl Into<String>,
        source: Box<dyn RasterSource>,
        services: OverlayServices,
        display_crs: &str,
    ) -> Self {
        let mut layer = Self {
            name: name.into(),
            source,
            cache: ReprojectionCache::new(services.warp, Arc::clone(&services.resolver)),
            resolver: services.resolver,
            not_georeferenced: None,
        };

        let initial = layer
            .cache
            .ensure_projection(layer.source.as_ref(), display_crs)
            .map(|_| ());
        if let Err(e) = initial {
            layer.record_failure(&e);
        }
        layer
    }

    /// Open a GeoTIFF and build a layer named after the file.
    pub fn open(path: impl AsRef<Path>, config: &OverlayConfig) -> OverlayResult<Self> {
        Self::open_with(&GeoTiffProvider, path.as_ref(), config)
    }

    pub fn open_with(
        provider: &dyn RasterProvider,
        path: &Path,
        config: &OverlayConfig,
    ) -> OverlayResult<Self> {
        let source = provider.open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!(
            path = %path.display(),
            width = source.width(),
            height = source.height(),
            bands = source.band_count(),
            "Opened raster"
        );

        Ok(Self::with_services(
            name,
            source,
            OverlayServices::native(config),
            &config.display_crs,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &dyn RasterSource {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &ReprojectionCache {
        &self.cache
    }

    /// Whether the layer has given up because the source lacks
    /// georeferencing.
    pub fn is_disabled(&self) -> bool {
        self.not_georeferenced.is_some()
    }

    /// Reproject if needed and compute the screen placement for this paint.
    pub fn paint<M>(&mut self, target_crs: &str, mapper: &M) -> PaintOutcome
    where
        M: ProjectedToScreen + ?Sized,
    {
        if let Some(reason) = &self.not_georeferenced {
            let e = OverlayError::NotGeoreferenced(reason.clone());
            return PaintOutcome::ErrorIndicator {
                message: e.indicator_message(&self.name),
            };
        }

        let current = self
            .cache
            .ensure_projection(self.source.as_ref(), target_crs)
            .map(|c| (Arc::clone(&c.image), c.geo_transform));

        match current {
            Ok((image, gt)) => {
                let placement = place_image(&image, &gt, mapper);
                PaintOutcome::Image { image, placement }
            }
            Err(e) => {
                self.record_failure(&e);
                PaintOutcome::ErrorIndicator {
                    message: e.indicator_message(&self.name),
                }
            }
        }
    }

    /// Paint onto `canvas`: the image, or the error indicator on failure.
    pub fn draw<M>(&mut self, canvas: &mut Canvas, target_crs: &str, mapper: &M) -> PaintOutcome
    where
        M: ProjectedToScreen + ?Sized,
    {
        let outcome = self.paint(target_crs, mapper);
        match &outcome {
            PaintOutcome::Image { image, placement } => canvas.draw_image(image, placement),
            PaintOutcome::ErrorIndicator { .. } => canvas.draw_error_indicator(),
        }
        outcome
    }

    fn record_failure(&mut self, e: &OverlayError) {
        match e {
            OverlayError::NotGeoreferenced(reason) => {
                error!(layer = %self.name, error = %e, "Layer is not georeferenced, disabling it");
                self.not_georeferenced = Some(reason.clone());
            }
            _ if e.is_retryable() => {
                warn!(layer = %self.name, error = %e, "Reprojection failed, will retry on next paint");
            }
            _ => {
                error!(layer = %self.name, error = %e, "Reprojection failed");
            }
        }
    }

    /// Bounding box of the reprojected image in the display CRS, spanning
    /// its origin and bottom-right pixel.
    pub fn projected_bounds(&self) -> Option<BoundingBox> {
        let current = self.cache.current()?;
        let (width, height) = current.dimensions();
        let gt = current.geo_transform;
        BoundingBox::from_points([
            gt.forward(0.0, 0.0),
            gt.forward(
                width.saturating_sub(1) as f64,
                height.saturating_sub(1) as f64,
            ),
        ])
    }

    /// Hover text: where the data came from.
    pub fn tooltip(&self) -> String {
        self.source
            .description()
            .map(str::to_string)
            .unwrap_or_else(|| self.name.clone())
    }

    /// Raster layers never merge with other layers.
    pub fn can_merge_with(&self, _other: &RasterLayer) -> bool {
        false
    }

    /// Multi-line description of the source and the projected image.
    pub fn info_text(&mut self, target_crs: &str) -> String {
        let projected = self
            .cache
            .ensure_projection(self.source.as_ref(), target_crs)
            .map(|c| (c.dimensions(), c.origin()));
        let projected = match projected {
            Ok(p) => Some(p),
            Err(OverlayError::InvalidProjection(_)) => None,
            Err(e) => return format!("Unusable dataset:\n{}\n", e),
        };

        let source = self.source.as_ref();
        let mut buf = String::new();
        buf.push_str("Source image properties:\n");
        buf.push_str(&format!("Dimensions: {}x{}\n", source.width(), source.height()));
        buf.push_str(&format!("Bands: {}\n", source.band_count()));
        buf.push_str(&format!("Sample type: {}\n", source.sample_type()));
        match source_geo_transform(source) {
            Some(gt) => {
                let (x, y) = gt.origin();
                buf.push_str(&format!("Origin: ({} ; {})\n", x, y));
            }
            None => buf.push_str("Origin: unknown\n"),
        }
        buf.push_str("Source projection:\n");
        match source.crs_code() {
            Some(code) => match self.resolver.resolve(code) {
                Ok(def) => buf.push_str(&def.describe()),
                Err(_) => buf.push_str(&format!("NOT A VALID PROJECTION: {}", code)),
            },
            None => buf.push_str("unknown"),
        }
        buf.push_str("\n\n");

        buf.push_str("Projected image properties:\n");
        if let Some(((width, height), (x, y))) = projected {
            buf.push_str(&format!("Dimensions: {}x{}\n", width, height));
            buf.push_str(&format!("Origin: ({} ; {})\n", x, y));
        }
        buf.push_str("Display projection:\n");
        match self.resolver.resolve(target_crs) {
            Ok(def) => buf.push_str(&def.describe()),
            Err(_) => buf.push_str(&format!("NOT A VALID PROJECTION: {}", target_crs)),
        }
        buf.push_str("\n\n");
        buf
    }
}

impl std::fmt::Debug for RasterLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterLayer")
            .field("name", &self.name)
            .field("cache", &self.cache)
            .field("disabled", &self.is_disabled())
            .finish()
    }
}
