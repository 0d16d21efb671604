//! The exact-arithmetic scale operator.
//!
//! Layered leaves first:
//! - [`params`]: scale and translation as floats and rationals
//! - [`interp`]: kernels and their weight tables
//! - [`mapping`]: destination bounds, forward and backward mapping
//! - [`splitter`]: work items aligned with source tiles
//! - [`positions`]: per-column and per-row source positions
//! - [`dispatch`]: ROI and no-data aware pixel loops
//! - [`op`]: the tiled operator tying it together

pub mod config;
pub mod dispatch;
pub mod interp;
pub mod mapping;
pub mod op;
pub mod params;
pub mod positions;
pub mod splitter;

pub use config::ScaleConfig;
pub use dispatch::TileCase;
pub use interp::{Interpolation, InterpolationKind};
pub use mapping::{backward_map, destination_bounds, forward_map, Mapper};
pub use op::ScaleOp;
pub use params::ScaleParams;
pub use splitter::{TileSplitter, WorkItem};
