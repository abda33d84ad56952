//! Raster overlay command line tool.
//!
//! Opens a georeferenced raster, reprojects it into the display CRS and
//! either reports its properties or renders it into a PNG:
//!
//! ```text
//! overlay-cli info scan.tif --crs EPSG:4326
//! overlay-cli render scan.tif --output scan.png --width 1024 --height 768
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use overlay::OverlayConfig;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use warp::ResamplingMethod;

#[derive(Parser, Debug)]
#[command(name = "overlay-cli")]
#[command(about = "Reproject and render georeferenced rasters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Display CRS code, e.g. EPSG:3857 (default: OVERLAY_DISPLAY_CRS or EPSG:3857)
    #[arg(long, global = true)]
    crs: Option<String>,

    /// Resampling kernel: nearest, bilinear or cubic
    #[arg(long, global = true)]
    resampling: Option<ResamplingMethod>,

    /// Maximum transform approximation error in source pixels
    #[arg(long, global = true)]
    max_error: Option<f64>,

    /// Log level
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print source and projected image properties
    Info {
        /// Path to the raster file
        raster: PathBuf,

        /// Print a JSON summary instead of the text report
        #[arg(long)]
        json: bool,
    },

    /// Render the raster into a PNG
    Render {
        /// Path to the raster file
        raster: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Canvas width in pixels
        #[arg(long, default_value = "800")]
        width: usize,

        /// Canvas height in pixels
        #[arg(long, default_value = "600")]
        height: usize,

        /// Free border around the image in pixels
        #[arg(long, default_value = "16")]
        margin: usize,
    },
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    let mut config = OverlayConfig::from_env();
    if let Some(crs) = &cli.crs {
        config.display_crs = crs.clone();
    }
    if let Some(resampling) = cli.resampling {
        config.warp.resampling = resampling;
    }
    if let Some(max_error) = cli.max_error {
        config.warp.max_error = max_error;
    }
    config.validate()?;
    debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::Info { raster, json } => commands::info(&raster, &config, json),
        Commands::Render {
            raster,
            output,
            width,
            height,
            margin,
        } => commands::render(
            &raster,
            &output,
            &config,
            commands::CanvasSize {
                width,
                height,
                margin,
            },
        ),
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
