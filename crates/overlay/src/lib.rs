//! Georeferenced raster overlay.
//!
//! Keeps a raster source reprojected into the current display CRS and places
//! the resulting image on screen:
//!
//! - [`cache`]: the reprojection cache (empty, or ready for one CRS code)
//! - [`placement`]: translation and scale of the image on screen
//! - [`services`]: warp, CRS resolver and raster provider seams
//! - [`layer`]: a layer tying source, cache and painting together
//! - [`viewport`], [`canvas`]: a reference mapper and painting surface
//!
//! # Example
//!
//! ```ignore
//! use overlay::{Canvas, OverlayConfig, RasterLayer, Viewport};
//!
//! let config = OverlayConfig::from_env();
//! let mut layer = RasterLayer::open("scan.tif", &config)?;
//! let bounds = layer.projected_bounds().unwrap();
//! let viewport = Viewport::fit_bounds(&bounds, 800, 600, 16);
//! let mut canvas = Canvas::new(800, 600);
//! layer.draw(&mut canvas, &config.display_crs, &viewport);
//! ```

pub mod cache;
pub mod canvas;
pub mod config;
pub mod layer;
pub mod placement;
pub mod services;
pub mod viewport;

pub use cache::{CacheState, CacheStats, ReprojectedImage, ReprojectionCache};
pub use canvas::Canvas;
pub use config::OverlayConfig;
pub use layer::{OverlayServices, PaintOutcome, RasterLayer};
pub use placement::{compute_placement, place_image, ProjectedToScreen, ScreenPlacement};
pub use services::{
    CrsResolver, EpsgResolver, GeoTiffProvider, NativeWarpService, RasterProvider, WarpService,
};
pub use viewport::Viewport;
