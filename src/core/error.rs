//! Error types for tilescale.
//!
//! Uses thiserror for structured errors with context. Errors fall into two
//! groups:
//! - Configuration errors, reported once when an operator is constructed
//! - Computation errors, reported by tile computation (these indicate a
//!   request outside the operator's grid or a collaborator that broke its
//!   contract)
//!
//! Geometric degeneracies and fully masked pixels are not errors: the former
//! are clamped, the latter resolve to the destination no-data value.

use crate::core::geometry::Rect;
use crate::core::types::SampleType;
use thiserror::Error;

/// Top-level error type for tilescale.
#[derive(Error, Debug)]
pub enum ScaleError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A tile index outside the destination tile grid.
    #[error("Tile ({tile_x}, {tile_y}) is outside the destination tile grid")]
    TileOutOfRange {
        /// Tile column.
        tile_x: i64,
        /// Tile row.
        tile_y: i64,
    },

    /// A read outside the pixels a source holds.
    #[error("Region {requested} is outside source bounds {bounds}")]
    RegionOutOfBounds {
        /// Region asked for.
        requested: Rect,
        /// Region available.
        bounds: Rect,
    },

    /// Rasters of different sample types met in one kernel.
    #[error("Sample type mismatch: expected {expected}, got {got}")]
    SampleTypeMismatch {
        /// Type the kernel runs on.
        expected: SampleType,
        /// Type it was handed.
        got: SampleType,
    },

    /// The rayon pool could not be built.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Errors detected while building an operator or loading its configuration.
///
/// These are fatal: an operator that failed to construct is never usable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A scale factor that is zero, negative or not finite.
    #[error("Invalid {axis} scale factor {value}: must be finite and positive")]
    InvalidScale {
        /// `x` or `y`.
        axis: char,
        /// Rejected value.
        value: f64,
    },

    /// A translation that is not finite.
    #[error("Invalid {axis} translation {value}: must be finite")]
    InvalidTranslation {
        /// `x` or `y`.
        axis: char,
        /// Rejected value.
        value: f64,
    },

    /// Unknown kernel name or unsupported subsample precision.
    #[error("Invalid interpolation kernel: {0}")]
    InvalidKernel(String),

    /// A destination tile size below one pixel.
    #[error("Invalid tile size {width}x{height}")]
    InvalidTileSize {
        /// Requested width.
        width: i64,
        /// Requested height.
        height: i64,
    },

    /// The source has no pixels.
    #[error("Source image is empty")]
    EmptySource,

    /// A sample buffer whose length does not fit its rectangle and bands.
    #[error("Raster buffer holds {actual} samples, {expected} expected")]
    BufferSize {
        /// Samples the raster needs.
        expected: usize,
        /// Samples supplied.
        actual: usize,
    },

    /// More destination no-data values than bands.
    #[error("Destination no-data has {got} values for {bands} bands")]
    NoDataBands {
        /// Bands of the source.
        bands: usize,
        /// Values given.
        got: usize,
    },

    /// A sample type name that is not recognised.
    #[error("Unsupported sample type '{0}'")]
    UnsupportedSampleType(String),

    /// The configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ConfigError::InvalidScale { axis, .. } => {
                Some(format!("Set scale_{} to a positive number", axis))
            }
            ConfigError::InvalidKernel(_) => {
                Some("Use subsample_bits between 0 and 16".to_string())
            }
            ConfigError::InvalidTileSize { .. } => {
                Some("Use a tile size of at least 1x1".to_string())
            }
            ConfigError::UnsupportedSampleType(_) => {
                Some("Use one of u8, u16, i16, i32, f32, f64".to_string())
            }
            _ => None,
        }
    }
}

/// Result type alias for tile computation.
pub type ScaleResult<T> = Result<T, ScaleError>;

/// Result type alias for construction and configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;
