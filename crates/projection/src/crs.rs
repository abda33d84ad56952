//! CRS resolution from textual codes.
//!
//! Codes of the form `EPSG:<n>` are looked up numerically; any other text is
//! treated as the name of a well-known geographic system (`WGS84`, `NAD83`,
//! `CRS:84`, ...). Only the systems listed in [`lookup_epsg`] are known.
//! Datum shifts are not modelled: geographic coordinates pass through
//! unchanged between systems on different ellipsoids.

use std::fmt::Write as _;

use overlay_common::{CrsCode, OverlayError, OverlayResult};
use tracing::debug;

use crate::ellipsoid::{Ellipsoid, CLARKE_1866, GRS80, WGS72, WGS84};
use crate::geographic::Geographic;
use crate::lambert::LambertConformalConic;
use crate::mercator::{Mercator, WebMercator};
use crate::transverse_mercator::TransverseMercator;
use crate::Projection;

/// The projection backing a CRS definition.
#[derive(Debug, Clone)]
pub enum ProjectionMethod {
    Geographic(Geographic),
    WebMercator(WebMercator),
    Mercator(Mercator),
    TransverseMercator(TransverseMercator),
    LambertConformalConic(LambertConformalConic),
}

impl ProjectionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ProjectionMethod::Geographic(_) => "Geographic (longitude/latitude)",
            ProjectionMethod::WebMercator(_) => "Popular Visualisation Pseudo Mercator",
            ProjectionMethod::Mercator(_) => "Mercator (variant A)",
            ProjectionMethod::TransverseMercator(_) => "Transverse Mercator",
            ProjectionMethod::LambertConformalConic(_) => "Lambert Conic Conformal (2SP)",
        }
    }

    fn projection(&self) -> &dyn Projection {
        match self {
            ProjectionMethod::Geographic(p) => p,
            ProjectionMethod::WebMercator(p) => p,
            ProjectionMethod::Mercator(p) => p,
            ProjectionMethod::TransverseMercator(p) => p,
            ProjectionMethod::LambertConformalConic(p) => p,
        }
    }
}

/// A resolved coordinate reference system.
#[derive(Debug, Clone)]
pub struct CrsDefinition {
    epsg: u32,
    name: String,
    method: ProjectionMethod,
    parameters: Vec<(&'static str, f64)>,
}

impl CrsDefinition {
    fn new(epsg: u32, name: impl Into<String>, method: ProjectionMethod) -> Self {
        Self {
            epsg,
            name: name.into(),
            method,
            parameters: Vec::new(),
        }
    }

    fn with_parameters(mut self, parameters: &[(&'static str, f64)]) -> Self {
        self.parameters = parameters.to_vec();
        self
    }

    /// Canonical `EPSG:<n>` code.
    pub fn code(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &ProjectionMethod {
        &self.method
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.method, ProjectionMethod::Geographic(_))
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        self.method.projection().ellipsoid()
    }

    /// Native units to geodetic (lon_rad, lat_rad).
    pub fn to_geodetic(&self, x: f64, y: f64) -> OverlayResult<(f64, f64)> {
        self.method.projection().inverse(x, y)
    }

    /// Geodetic (lon_rad, lat_rad) to native units.
    pub fn from_geodetic(&self, lon: f64, lat: f64) -> OverlayResult<(f64, f64)> {
        self.method.projection().forward(lon, lat)
    }

    /// Whether two definitions describe the same coordinate space.
    pub fn is_equivalent(&self, other: &CrsDefinition) -> bool {
        canonical_epsg(self.epsg) == canonical_epsg(other.epsg)
    }

    /// Multi-line human readable description.
    pub fn describe(&self) -> String {
        let ellipsoid = self.ellipsoid();
        let mut out = format!("{} - {}\n", self.code(), self.name);
        let _ = writeln!(out, "  Method: {}", self.method.name());
        let _ = writeln!(
            out,
            "  Ellipsoid: {} (a={}, 1/f={})",
            ellipsoid.name,
            ellipsoid.a,
            1.0 / ellipsoid.f
        );
        let _ = writeln!(
            out,
            "  Units: {}",
            if self.is_geographic() { "degree" } else { "metre" }
        );
        for (key, value) in &self.parameters {
            let _ = writeln!(out, "  {}: {}", key, value);
        }
        out
    }
}

/// Aliases of the Web Mercator code collapse onto 3857.
fn canonical_epsg(epsg: u32) -> u32 {
    match epsg {
        900913 | 3785 => 3857,
        other => other,
    }
}

/// Resolve a CRS code to its definition.
///
/// Fails with [`OverlayError::InvalidProjection`] carrying `code` verbatim
/// when the text cannot be parsed or names an unknown system.
pub fn resolve_crs(code: &str) -> OverlayResult<CrsDefinition> {
    let parsed =
        CrsCode::parse(code).map_err(|_| OverlayError::InvalidProjection(code.to_string()))?;

    let definition = match parsed {
        CrsCode::Epsg(n) => lookup_epsg(n),
        CrsCode::WellKnown(geog) => lookup_epsg(geog.epsg()),
    }
    .ok_or_else(|| OverlayError::InvalidProjection(code.to_string()))?;

    debug!(code = %code, name = definition.name(), "Resolved CRS");
    Ok(definition)
}

fn utm(epsg: u32, datum: &str, ellipsoid: Ellipsoid, zone: u8, north: bool) -> CrsDefinition {
    let tm = TransverseMercator::utm(ellipsoid, zone, north);
    let hemisphere = if north { 'N' } else { 'S' };
    CrsDefinition::new(
        epsg,
        format!("{} / UTM zone {}{}", datum, zone, hemisphere),
        ProjectionMethod::TransverseMercator(tm.clone()),
    )
    .with_parameters(&[
        ("latitude_of_origin", 0.0),
        ("central_meridian", tm.central_meridian()),
        ("scale_factor", tm.scale_factor()),
        ("false_easting", 500_000.0),
        ("false_northing", if north { 0.0 } else { 10_000_000.0 }),
    ])
}

fn lcc(
    epsg: u32,
    name: &str,
    ellipsoid: Ellipsoid,
    lat0: f64,
    lon0: f64,
    parallels: (f64, f64),
    false_origin: (f64, f64),
) -> CrsDefinition {
    let proj = LambertConformalConic::new_2sp(
        ellipsoid,
        lat0,
        lon0,
        parallels.0,
        parallels.1,
        false_origin.0,
        false_origin.1,
    );
    CrsDefinition::new(epsg, name, ProjectionMethod::LambertConformalConic(proj)).with_parameters(&[
        ("latitude_of_origin", lat0),
        ("central_meridian", lon0),
        ("standard_parallel_1", parallels.0),
        ("standard_parallel_2", parallels.1),
        ("false_easting", false_origin.0),
        ("false_northing", false_origin.1),
    ])
}

fn geographic(epsg: u32, name: &str, ellipsoid: Ellipsoid) -> CrsDefinition {
    CrsDefinition::new(epsg, name, ProjectionMethod::Geographic(Geographic::new(ellipsoid)))
}

/// Built-in EPSG registry subset.
pub fn lookup_epsg(epsg: u32) -> Option<CrsDefinition> {
    let definition = match epsg {
        4326 => geographic(4326, "WGS 84", WGS84),
        4258 => geographic(4258, "ETRS89", GRS80),
        4269 => geographic(4269, "NAD83", GRS80),
        4267 => geographic(4267, "NAD27", CLARKE_1866),
        4322 => geographic(4322, "WGS 72", WGS72),
        4171 => geographic(4171, "RGF93", GRS80),
        3857 | 900913 | 3785 => CrsDefinition::new(
            epsg,
            "WGS 84 / Pseudo-Mercator",
            ProjectionMethod::WebMercator(WebMercator::new()),
        ),
        3395 => CrsDefinition::new(
            3395,
            "WGS 84 / World Mercator",
            ProjectionMethod::Mercator(Mercator::world()),
        )
        .with_parameters(&[("central_meridian", 0.0), ("scale_factor", 1.0)]),
        32601..=32660 => utm(epsg, "WGS 84", WGS84, (epsg - 32600) as u8, true),
        32701..=32760 => utm(epsg, "WGS 84", WGS84, (epsg - 32700) as u8, false),
        25828..=25838 => utm(epsg, "ETRS89", GRS80, (epsg - 25800) as u8, true),
        26901..=26923 => utm(epsg, "NAD83", GRS80, (epsg - 26900) as u8, true),
        2154 => lcc(
            2154,
            "RGF93 / Lambert-93",
            GRS80,
            46.5,
            3.0,
            (49.0, 44.0),
            (700_000.0, 6_600_000.0),
        ),
        3034 => lcc(
            3034,
            "ETRS89 / LCC Europe",
            GRS80,
            52.0,
            10.0,
            (35.0, 65.0),
            (4_000_000.0, 2_800_000.0),
        ),
        _ => return None,
    };
    Some(definition)
}
