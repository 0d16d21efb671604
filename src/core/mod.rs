//! Core types and traits for tilescale.
//!
//! This module contains the foundational types the resampling engine is built
//! on, including:
//! - Exact rational arithmetic
//! - Rectangles, kernel footprints and tile grids
//! - Sample types and rasters
//! - ROI and no-data predicates
//! - Image sources and border extension
//! - Error types

pub mod border;
pub mod error;
pub mod geometry;
pub mod rational;
pub mod roi;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use border::BorderMode;
pub use error::{ConfigError, ConfigResult, ScaleError, ScaleResult};
pub use geometry::{KernelFootprint, Rect, TileGrid, TileIndex};
pub use rational::Rational;
pub use roi::{MaskRoi, NoDataRange, RectRoi, Roi, RoiMask};
pub use source::{ImageSource, MemoryImage};
pub use types::{Raster, RasterData, Sample, SampleType};
