//! Subcommand implementations.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use overlay::{Canvas, OverlayConfig, PaintOutcome, RasterLayer, Viewport};
use serde_json::json;
use tracing::{info, warn};

/// Output canvas geometry for `render`.
#[derive(Debug, Clone, Copy)]
pub struct CanvasSize {
    pub width: usize,
    pub height: usize,
    pub margin: usize,
}

fn open_layer(path: &Path, config: &OverlayConfig) -> Result<RasterLayer> {
    RasterLayer::open(path, config).with_context(|| format!("Failed to open {}", path.display()))
}

/// Print the layer report, or a JSON summary.
pub fn info(path: &Path, config: &OverlayConfig, as_json: bool) -> Result<()> {
    let mut layer = open_layer(path, config)?;
    println!("{}", info_report(&mut layer, config, as_json)?);
    Ok(())
}

fn info_report(layer: &mut RasterLayer, config: &OverlayConfig, as_json: bool) -> Result<String> {
    if !as_json {
        return Ok(layer.info_text(&config.display_crs));
    }

    let source = layer.source();
    let summary = json!({
        "name": layer.name(),
        "source": {
            "width": source.width(),
            "height": source.height(),
            "bands": source.band_count(),
            "sample_type": source.sample_type().name(),
            "crs": source.crs_code(),
        },
        "display_crs": config.display_crs,
        "projected": layer.cache().current().map(|c| json!({
            "width": c.image.width(),
            "height": c.image.height(),
            "origin": [c.origin().0, c.origin().1],
            "color_model": c.image.color_model().name(),
        })),
        "bounds": layer.projected_bounds(),
    });
    Ok(serde_json::to_string_pretty(&summary)?)
}

/// Paint the layer onto a fitted canvas and write it as PNG.
///
/// A layer that cannot be painted still produces a PNG, showing the error
/// indicator.
pub fn render(path: &Path, output: &Path, config: &OverlayConfig, size: CanvasSize) -> Result<()> {
    ensure!(
        size.width > 0 && size.height > 0,
        "canvas must be at least 1x1 pixels (got {}x{})",
        size.width,
        size.height
    );

    let mut layer = open_layer(path, config)?;
    let canvas = paint_canvas(&mut layer, config, size);

    let png = canvas.encode_png().context("Failed to encode PNG")?;
    std::fs::write(output, &png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        path = %output.display(),
        width = size.width,
        height = size.height,
        bytes = png.len(),
        "Wrote PNG"
    );
    Ok(())
}

fn paint_canvas(layer: &mut RasterLayer, config: &OverlayConfig, size: CanvasSize) -> Canvas {
    let viewport = match layer.projected_bounds() {
        Some(bounds) => Viewport::fit_bounds(&bounds, size.width, size.height, size.margin),
        None => Viewport::new(0.0, 0.0, 1.0, size.width, size.height),
    };

    let mut canvas = Canvas::new(size.width, size.height);
    if let PaintOutcome::ErrorIndicator { message } =
        layer.draw(&mut canvas, &config.display_crs, &viewport)
    {
        warn!(layer = %layer.name(), %message, "Rendered error indicator");
        eprintln!("{}", message);
    }
    canvas
}
