//! # Tilescale - Exact Tiled Raster Scaling
//!
//! Tilescale scales and translates tiled raster images. All geometry is
//! computed with exact rational arithmetic, so the same scale factor always
//! maps the same pixels no matter how often it is applied or how the image is
//! tiled.
//!
//! ## Features
//!
//! - **Exact Geometry**: Bounds and pixel positions never drift from float rounding
//! - **Tile Aware**: Work is split along source tile boundaries
//! - **ROI and No-Data**: Excluded samples drop out of the interpolation
//! - **Any Sample Type**: u8, u16, i16, i32, f32 and f64 rasters
//! - **Parallel Execution**: Tiles are computed on rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tilescale::prelude::*;
//!
//! let raster = Raster::from_fn(Rect::new(0, 0, 10, 10), 1, |x, y, _| (x + y) as u8);
//! let source: Arc<dyn ImageSource> = Arc::new(MemoryImage::new(raster, 4, 4));
//!
//! let config = ScaleConfig::new().with_scale(2.0, 2.0);
//! let op = ScaleOp::new(source, &config).unwrap();
//! assert_eq!(op.bounds(), Rect::new(0, 0, 20, 20));
//!
//! let image = op.compute_image().unwrap();
//! assert_eq!(image.get(5, 5, 0), Some(4.0));
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Rationals, geometry, rasters, ROI, sources and errors
//! - [`scale`]: Mapping, splitting, interpolation and the scale operator
//! - [`execution`]: Tile scheduling and progress reporting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod execution;
pub mod scale;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use tilescale::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::border::BorderMode;
    pub use crate::core::geometry::{KernelFootprint, Rect, TileGrid};
    pub use crate::core::rational::Rational;
    pub use crate::core::roi::{MaskRoi, NoDataRange, RectRoi, Roi};
    pub use crate::core::source::{ImageSource, MemoryImage};
    pub use crate::core::types::{Raster, RasterData, Sample, SampleType};

    // Errors
    pub use crate::core::error::{ConfigError, ConfigResult, ScaleError, ScaleResult};

    // Scaling
    pub use crate::scale::config::ScaleConfig;
    pub use crate::scale::interp::{Interpolation, InterpolationKind};
    pub use crate::scale::mapping::{backward_map, destination_bounds, forward_map, Mapper};
    pub use crate::scale::op::ScaleOp;
    pub use crate::scale::params::ScaleParams;

    // Execution
    pub use crate::execution::engine::{ExecutionOptions, ExecutionResult, ExecutionStats, TileEngine};
    pub use crate::execution::progress::{ProgressTracker, ProgressUpdate};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
