//! Overlay configuration.

use overlay_common::{OverlayError, OverlayResult};
use serde::{Deserialize, Serialize};
use warp::WarpOptions;

/// Display CRS used when nothing else is configured.
pub const DEFAULT_DISPLAY_CRS: &str = "EPSG:3857";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// CRS code of the map canvas.
    pub display_crs: String,

    /// Warp settings used for every reprojection.
    pub warp: WarpOptions,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            display_crs: DEFAULT_DISPLAY_CRS.to_string(),
            warp: WarpOptions::default(),
        }
    }
}

impl OverlayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from keys resolved through `lookup`:
    /// `OVERLAY_DISPLAY_CRS` plus the `WARP_*` keys.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            warp: WarpOptions::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(val) = lookup("OVERLAY_DISPLAY_CRS") {
            let val = val.trim();
            if !val.is_empty() {
                config.display_crs = val.to_string();
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> OverlayResult<()> {
        if self.display_crs.trim().is_empty() {
            return Err(OverlayError::InvalidConfig(
                "display_crs must not be empty".to_string(),
            ));
        }
        self.warp.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::ResamplingMethod;

    #[test]
    fn test_defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.display_crs, "EPSG:3857");
        assert_eq!(config.warp.resampling, ResamplingMethod::Cubic);
        assert_eq!(config.warp.max_error, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_crs_rejected() {
        let config = OverlayConfig {
            display_crs: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OverlayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_warp_options_rejected() {
        let mut config = OverlayConfig::default();
        config.warp.max_error = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = OverlayConfig::from_lookup(|key| match key {
            "OVERLAY_DISPLAY_CRS" => Some(" EPSG:32633 ".to_string()),
            "WARP_RESAMPLING" => Some("nearest".to_string()),
            _ => None,
        });
        assert_eq!(config.display_crs, "EPSG:32633");
        assert_eq!(config.warp.resampling, ResamplingMethod::Nearest);
        assert_eq!(config.warp.max_error, 0.2);
    }

    #[test]
    fn test_from_lookup_ignores_blank_crs() {
        let config = OverlayConfig::from_lookup(|key| {
            (key == "OVERLAY_DISPLAY_CRS").then(|| "   ".to_string())
        });
        assert_eq!(config.display_crs, DEFAULT_DISPLAY_CRS);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: OverlayConfig =
            serde_json::from_str(r#"{"display_crs": "EPSG:4326", "warp": {"resampling": "nearest"}}"#)
                .unwrap();
        assert_eq!(config.display_crs, "EPSG:4326");
        assert_eq!(config.warp.resampling, ResamplingMethod::Nearest);
        assert_eq!(config.warp.edge_samples, 21);
    }
}
