//! Raster reprojection.
//!
//! This crate handles resampling a georeferenced raster into another CRS:
//! choosing the output grid, approximating the per-row coordinate mapping
//! and interpolating source samples.
//!
//! # Example
//!
//! ```ignore
//! use projection::resolve_crs;
//! use warp::{WarpOptions, Warper};
//!
//! let warper = Warper::new(WarpOptions::default());
//! let target = resolve_crs("EPSG:3857")?;
//! match warper.warp(&source, &target)? {
//!     Some(warped) => println!("{}x{}", warped.width(), warped.height()),
//!     None => println!("not georeferenced"),
//! }
//! ```

pub mod approx;
pub mod extent;
pub mod interpolation;
pub mod options;
pub mod warper;

pub use approx::LinearApprox;
pub use extent::{suggest_output_grid, OutputGrid};
pub use options::{ResamplingMethod, WarpOptions};
pub use warper::{source_geo_transform, Warper};
