//! Configuration for the warp service.

use std::fmt;
use std::str::FromStr;

use overlay_common::{OverlayError, OverlayResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Resampling kernel used when reading the source raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    /// Nearest neighbor (preserves exact values, required for palettes).
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
    /// Bicubic (Catmull-Rom) interpolation.
    #[default]
    Cubic,
}

impl FromStr for ResamplingMethod {
    type Err = String;

    /// Parse from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" | "near" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "cubic" | "bicubic" => Ok(Self::Cubic),
            other => Err(format!("unknown resampling method '{}'", other)),
        }
    }
}

impl fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::Cubic => write!(f, "cubic"),
        }
    }
}

/// Configuration for the warp service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpOptions {
    /// Kernel for non-palette sources.
    pub resampling: ResamplingMethod,

    /// Largest tolerated error of the scanline approximation, in source pixels.
    pub max_error: f64,

    /// Points sampled along each edge when suggesting the output grid.
    pub edge_samples: usize,

    /// Process output rows on the rayon pool.
    pub parallel: bool,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            resampling: ResamplingMethod::Cubic,
            max_error: 0.2,
            edge_samples: 21,
            parallel: true,
        }
    }
}

impl WarpOptions {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are logged and the default kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build options from `WARP_*` keys resolved through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(val) = lookup("WARP_RESAMPLING") {
            match val.parse() {
                Ok(method) => options.resampling = method,
                Err(e) => warn!(value = %val, error = %e, "Ignoring WARP_RESAMPLING"),
            }
        }

        if let Some(val) = lookup("WARP_MAX_ERROR") {
            match val.trim().parse() {
                Ok(err) => options.max_error = err,
                Err(_) => warn!(value = %val, "Ignoring WARP_MAX_ERROR"),
            }
        }

        if let Some(val) = lookup("WARP_EDGE_SAMPLES") {
            match val.trim().parse() {
                Ok(n) => options.edge_samples = n,
                Err(_) => warn!(value = %val, "Ignoring WARP_EDGE_SAMPLES"),
            }
        }

        if let Some(val) = lookup("WARP_PARALLEL") {
            let val = val.trim();
            options.parallel = val.eq_ignore_ascii_case("true") || val == "1";
        }

        options
    }

    /// Validate the configuration.
    pub fn validate(&self) -> OverlayResult<()> {
        if !self.max_error.is_finite() || self.max_error < 0.0 {
            return Err(OverlayError::InvalidConfig(format!(
                "max_error must be a finite, non-negative pixel count (got {})",
                self.max_error
            )));
        }

        if self.edge_samples < 2 {
            return Err(OverlayError::InvalidConfig(format!(
                "edge_samples must be >= 2 (got {})",
                self.edge_samples
            )));
        }

        Ok(())
    }
}
