//! Common types and utilities shared across the raster overlay crates.

pub mod bbox;
pub mod crs;
pub mod error;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError, WellKnownGeogCs};
pub use error::{OverlayError, OverlayResult};
