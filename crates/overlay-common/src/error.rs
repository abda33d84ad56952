//! Error types shared by the overlay crates.

use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Primary error type for reprojection, assembly and placement.
#[derive(Debug, Error)]
pub enum OverlayError {
    // === Geometry Errors ===
    #[error("Singular affine transform (determinant {determinant})")]
    SingularTransform { determinant: f64 },

    #[error("Coordinate transform failed: {0}")]
    TransformFailed(String),

    // === Raster Errors ===
    #[error("Unsupported sample type: {0}")]
    UnsupportedSampleType(String),

    #[error("Failed to read raster data: {0}")]
    RasterRead(String),

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    // === Projection Errors ===
    #[error("'{0}' is not a valid projection")]
    InvalidProjection(String),

    #[error("Source image could not be reprojected, it is probably not properly georeferenced: {0}")]
    NotGeoreferenced(String),

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl OverlayError {
    /// Whether a later attempt with the same source may succeed.
    ///
    /// Fatal kinds (singular transforms, unsupported pixel formats, missing
    /// georeferencing) need different input data before retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OverlayError::RasterRead(_)
                | OverlayError::InvalidProjection(_)
                | OverlayError::TransformFailed(_)
        )
    }

    /// Text shown in place of a layer's image when painting fails.
    pub fn indicator_message(&self, layer_name: &str) -> String {
        match self {
            OverlayError::NotGeoreferenced(_) => format!(
                "Image layer '{}': IMAGE IS NOT PROPERLY GEOREFERENCED",
                layer_name
            ),
            OverlayError::InvalidProjection(code) => format!(
                "Image layer '{}': CANNOT COMPREHEND PROJECTION '{}'",
                layer_name, code
            ),
            other => format!("Image layer '{}': {}", layer_name, other),
        }
    }
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        OverlayError::RasterRead(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(OverlayError::InvalidProjection("EPSG:0".into()).is_retryable());
        assert!(OverlayError::RasterRead("eof".into()).is_retryable());
        assert!(!OverlayError::NotGeoreferenced("no transform".into()).is_retryable());
        assert!(!OverlayError::SingularTransform { determinant: 0.0 }.is_retryable());
        assert!(!OverlayError::UnsupportedSampleType("Float64".into()).is_retryable());
    }

    #[test]
    fn test_indicator_message() {
        let err = OverlayError::InvalidProjection("EPSG:99999".into());
        assert_eq!(
            err.indicator_message("scan.tif"),
            "Image layer 'scan.tif': CANNOT COMPREHEND PROJECTION 'EPSG:99999'"
        );

        let err = OverlayError::NotGeoreferenced("no geotransform and no GCPs".into());
        assert_eq!(
            err.indicator_message("scan.tif"),
            "Image layer 'scan.tif': IMAGE IS NOT PROPERLY GEOREFERENCED"
        );
    }
}
