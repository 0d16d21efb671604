//! Execution engine module.
//!
//! This module schedules tile computation and reports progress.

pub mod engine;
pub mod progress;

pub use engine::{ExecutionOptions, ExecutionResult, ExecutionStats, TileEngine, TiledOperator};
pub use progress::{ProgressTracker, ProgressUpdate};
