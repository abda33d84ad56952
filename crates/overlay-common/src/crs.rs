//! Coordinate Reference System codes as handed over by the display side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic systems that can be named without an EPSG number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WellKnownGeogCs {
    /// WGS 84 (EPSG:4326)
    Wgs84,
    /// WGS 84 with longitude/latitude axis order (CRS:84)
    Crs84,
    /// WGS 72 (EPSG:4322)
    Wgs72,
    /// NAD 27 (EPSG:4267)
    Nad27,
    /// NAD 83 (EPSG:4269)
    Nad83,
}

impl WellKnownGeogCs {
    /// Look up a well-known geographic system by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "WGS84" | "WGS 84" => Some(Self::Wgs84),
            "CRS84" | "CRS:84" => Some(Self::Crs84),
            "WGS72" | "WGS 72" => Some(Self::Wgs72),
            "NAD27" | "NAD 27" => Some(Self::Nad27),
            "NAD83" | "NAD 83" => Some(Self::Nad83),
            _ => None,
        }
    }

    /// Equivalent EPSG code of the geographic system.
    pub fn epsg(&self) -> u32 {
        match self {
            Self::Wgs84 | Self::Crs84 => 4326,
            Self::Wgs72 => 4322,
            Self::Nad27 => 4267,
            Self::Nad83 => 4269,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wgs84 => "WGS84",
            Self::Crs84 => "CRS:84",
            Self::Wgs72 => "WGS72",
            Self::Nad27 => "NAD27",
            Self::Nad83 => "NAD83",
        }
    }
}

/// A parsed CRS code.
///
/// Accepts formats like:
/// - "EPSG:4326"
/// - "epsg:3857"
/// - "WGS84", "NAD83", "CRS:84"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// Numeric EPSG registry code.
    Epsg(u32),
    /// Well-known geographic system name.
    WellKnown(WellKnownGeogCs),
}

impl CrsCode {
    /// Parse a CRS code string.
    ///
    /// The `EPSG:<n>` form is resolved numerically; every other text is
    /// treated as the name of a well-known geographic system.
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CrsParseError::Empty);
        }

        let upper = trimmed.to_uppercase();
        if let Some(number) = upper.strip_prefix("EPSG:") {
            return number
                .trim()
                .parse::<u32>()
                .map(CrsCode::Epsg)
                .map_err(|_| CrsParseError::InvalidEpsg(s.to_string()));
        }

        WellKnownGeogCs::from_name(trimmed)
            .map(CrsCode::WellKnown)
            .ok_or_else(|| CrsParseError::UnknownName(s.to_string()))
    }

    /// The EPSG number this code stands for.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg(code) => *code,
            CrsCode::WellKnown(geog) => geog.epsg(),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsCode::Epsg(code) => write!(f, "EPSG:{}", code),
            CrsCode::WellKnown(geog) => write!(f, "{}", geog.as_str()),
        }
    }
}

impl std::str::FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Empty CRS code")]
    Empty,

    #[error("Invalid EPSG code: {0}")]
    InvalidEpsg(String),

    #[error("Unknown geographic coordinate system: {0}")]
    UnknownName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg(4326));
        assert_eq!(CrsCode::parse("epsg:3857").unwrap(), CrsCode::Epsg(3857));
        assert_eq!(CrsCode::parse("  EPSG:2154 ").unwrap(), CrsCode::Epsg(2154));
        assert!(CrsCode::parse("EPSG:abc").is_err());
        assert!(CrsCode::parse("EPSG:").is_err());
    }

    #[test]
    fn test_parse_well_known() {
        assert_eq!(
            CrsCode::parse("WGS84").unwrap(),
            CrsCode::WellKnown(WellKnownGeogCs::Wgs84)
        );
        assert_eq!(
            CrsCode::parse("nad83").unwrap(),
            CrsCode::WellKnown(WellKnownGeogCs::Nad83)
        );
        assert_eq!(CrsCode::parse("CRS:84").unwrap().epsg(), 4326);
        assert!(CrsCode::parse("Mercator").is_err());
        assert!(CrsCode::parse("").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for text in ["EPSG:32633", "WGS72", "CRS:84"] {
            let code: CrsCode = text.parse().unwrap();
            assert_eq!(code.to_string(), text);
        }
    }
}
