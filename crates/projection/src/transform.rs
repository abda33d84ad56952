//! Point transforms between two CRS definitions.
//!
//! Coordinates are expressed in each CRS's native units (degrees for
//! geographic systems, meters for projected ones) and pass through geodetic
//! radians in between.

use overlay_common::OverlayResult;

use crate::crs::{resolve_crs, CrsDefinition};

#[derive(Debug, Clone)]
pub struct CrsTransform {
    src: CrsDefinition,
    dst: CrsDefinition,
    identity: bool,
}

impl CrsTransform {
    pub fn new(src: CrsDefinition, dst: CrsDefinition) -> Self {
        let identity = src.is_equivalent(&dst);
        Self { src, dst, identity }
    }

    /// Build a transform from two textual codes.
    pub fn from_codes(src: &str, dst: &str) -> OverlayResult<Self> {
        Ok(Self::new(resolve_crs(src)?, resolve_crs(dst)?))
    }

    pub fn source(&self) -> &CrsDefinition {
        &self.src
    }

    pub fn target(&self) -> &CrsDefinition {
        &self.dst
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Source-native (x, y) to target-native (x, y).
    pub fn transform(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)> {
        if self.identity {
            return Ok((x, y));
        }
        let (lon, lat) = self.src.to_geodetic(x, y)?;
        self.dst.from_geodetic(lon, lat)
    }

    /// Target-native (x, y) back to source-native (x, y).
    pub fn transform_inverse(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)> {
        if self.identity {
            return Ok((x, y));
        }
        let (lon, lat) = self.dst.to_geodetic(x, y)?;
        self.src.from_geodetic(lon, lat)
    }

    /// Transform points in place. Stops at the first failure.
    pub fn transform_points(&self, points: &mut [(f64, f64)]) -> OverlayResult<()> {
        if self.identity {
            return Ok(());
        }
        for p in points.iter_mut() {
            *p = self.transform(p.0, p.1)?;
        }
        Ok(())
    }

    /// The same transform in the opposite direction.
    pub fn reversed(&self) -> CrsTransform {
        CrsTransform {
            src: self.dst.clone(),
            dst: self.src.clone(),
            identity: self.identity,
        }
    }
}
