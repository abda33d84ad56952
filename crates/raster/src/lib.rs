//! Raster handling for the overlay.
//!
//! - [`source`]: the read-only `RasterSource` handle and an in-memory implementation
//! - [`buffer`]: typed per-band sample buffers
//! - [`image`]: drawable images and their color models
//! - [`assembler`]: band buffers to drawable image conversion
//! - [`geotiff`]: GeoTIFF-backed raster sources
//! - [`png`]: PNG encoding of rendered pixels

pub mod assembler;
pub mod buffer;
pub mod geotiff;
pub mod image;
pub mod png;
pub mod source;

pub use assembler::{assemble_from_bands, assemble_image, BandSet};
pub use buffer::{SampleBuffer, SampleType};
pub use geotiff::GeoTiffSource;
pub use image::{ColorModel, DrawableImage};
pub use source::{ColorInterpretation, ColorTable, MemRaster, PaletteEntry, RasterSource};
