//! Export a raster image as a ZIP archive of PNG tiles.
//!
//! The image is cut into a row-major grid of square tiles (the last column and
//! row are clamped to the image edge). Each tile is stored with the smallest
//! PNG layout that represents it:
//!
//! | tile content                                   | stored as                |
//! |------------------------------------------------|--------------------------|
//! | opaque, at most 256 colors                     | 8-bit indexed            |
//! | opaque, more colors                            | 24-bit RGB               |
//! | alpha only 0 or 255, fewer than 256 colors     | 8-bit indexed with tRNS  |
//! | anything else                                  | 32-bit RGBA              |
//!
//! Entries are named `Image1.png`, `Image2.png`, ... in tile order.
//!
//! ```no_run
//! use zentile::{ExportConfig, Image, export_to_file};
//!
//! let image = Image::from_rgba8(2, 1, &[255, 0, 0, 255, 0, 0, 255, 255])?;
//! let config = ExportConfig::new().tile_size(128);
//! let summary = export_to_file(&image, &config, "tiles.zip", &mut |percent: f64| {
//!     println!("{percent:.0}%");
//! })?;
//! assert_eq!(summary.len(), 1);
//! # Ok::<(), zentile::ExportError>(())
//! ```

#![forbid(unsafe_code)]

extern crate alloc;

pub mod analyze;
pub mod bit_depth;
pub mod config;
pub mod dither;
pub mod encode;
pub mod error;
pub mod histogram;
pub mod image;
pub mod median_cut;
pub mod oklab;
pub mod pack;
pub mod palette;
pub mod quantize;
pub mod tiler;

pub use analyze::{AnalysisReport, analyze};
pub use bit_depth::{BitDepth, classify, prepare};
pub use config::{
    DEFAULT_TILE_SIZE, EntryCompression, ExportConfig, FILE_EXTENSION, FORMAT_NAME,
    MAX_TILE_SIZE, MIN_TILE_SIZE, PngCompression, configure,
};
pub use dither::DitherMode;
pub use error::{ErrorKind, ExportError, QuantizeError};
pub use image::{Image, Rect};
pub use pack::{
    Cancellable, ExportObserver, ExportSummary, NoProgress, TileRecord, export, export_to_file,
    export_with,
};
pub use quantize::{IndexedImage, MedianCutQuantizer, Quantizer};
pub use tiler::TileGrid;

pub use rgb::alt::BGRA8;
