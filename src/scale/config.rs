//! Scale operator configuration.

use crate::core::border::BorderMode;
use crate::core::error::{ConfigError, ConfigResult};
use crate::execution::engine::ExecutionOptions;
use crate::scale::interp::{Interpolation, InterpolationKind, DEFAULT_SUBSAMPLE_BITS};
use crate::scale::params::ScaleParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default destination tile size.
pub const DEFAULT_TILE_SIZE: i64 = 256;

/// Configuration of a [`ScaleOp`](crate::scale::op::ScaleOp).
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// scale_x = 2.0
/// scale_y = 2.0
/// interpolation = "bilinear"
/// dest_no_data = [0.0]
///
/// [border]
/// mode = "copy"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Horizontal translation in destination pixels.
    pub trans_x: f64,
    /// Vertical translation in destination pixels.
    pub trans_y: f64,
    /// Interpolation kernel.
    pub interpolation: InterpolationKind,
    /// Fractional position resolution in bits.
    pub subsample_bits: u32,
    /// Destination tile width.
    pub tile_width: i64,
    /// Destination tile height.
    pub tile_height: i64,
    /// Value written where nothing can be computed, per band.
    pub dest_no_data: Vec<f64>,
    /// Border extension beyond the source, if any.
    pub border: Option<BorderMode>,
    /// Whether to compute tiles in parallel.
    pub parallel: bool,
    /// Number of worker threads (0 = auto).
    pub num_threads: usize,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            trans_x: 0.0,
            trans_y: 0.0,
            interpolation: InterpolationKind::Nearest,
            subsample_bits: DEFAULT_SUBSAMPLE_BITS,
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            dest_no_data: vec![0.0],
            border: None,
            parallel: true,
            num_threads: 0,
        }
    }
}

impl ScaleConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text and validate.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: ScaleConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Set both scale factors.
    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Set both translations.
    pub fn with_translation(mut self, trans_x: f64, trans_y: f64) -> Self {
        self.trans_x = trans_x;
        self.trans_y = trans_y;
        self
    }

    /// Set the interpolation kernel.
    pub fn with_interpolation(mut self, kind: InterpolationKind) -> Self {
        self.interpolation = kind;
        self
    }

    /// Set the fractional resolution.
    pub fn with_subsample_bits(mut self, bits: u32) -> Self {
        self.subsample_bits = bits;
        self
    }

    /// Set the destination tile size.
    pub fn with_tile_size(mut self, width: i64, height: i64) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    /// Set the destination no-data values.
    pub fn with_dest_no_data(mut self, values: Vec<f64>) -> Self {
        self.dest_no_data = values;
        self
    }

    /// Set the border extension.
    pub fn with_border(mut self, border: BorderMode) -> Self {
        self.border = Some(border);
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Check every field without building anything.
    pub fn validate(&self) -> ConfigResult<()> {
        self.params()?;
        self.interpolation()?;
        if self.tile_width < 1 || self.tile_height < 1 {
            return Err(ConfigError::InvalidTileSize {
                width: self.tile_width,
                height: self.tile_height,
            });
        }
        Ok(())
    }

    /// Exact transform parameters.
    pub fn params(&self) -> ConfigResult<ScaleParams> {
        ScaleParams::new(self.scale_x, self.scale_y, self.trans_x, self.trans_y)
    }

    /// Interpolation kernel with its weight table.
    pub fn interpolation(&self) -> ConfigResult<Interpolation> {
        Interpolation::new(self.interpolation, self.subsample_bits)
    }

    /// Tile scheduling options.
    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions::new()
            .with_parallel(self.parallel)
            .with_max_threads(self.num_threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = ScaleConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.dest_no_data, vec![0.0]);
        assert!(config.border.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ScaleConfig::new()
            .with_scale(2.0, 0.5)
            .with_translation(1.0, -1.0)
            .with_interpolation(InterpolationKind::Bicubic)
            .with_tile_size(64, 32)
            .with_border(BorderMode::Reflect)
            .with_parallel(false)
            .with_threads(2);

        assert_eq!((config.scale_x, config.scale_y), (2.0, 0.5));
        assert_eq!(config.interpolation, InterpolationKind::Bicubic);
        assert_eq!((config.tile_width, config.tile_height), (64, 32));
        assert_eq!(config.border, Some(BorderMode::Reflect));
        let options = config.execution_options();
        assert!(!options.parallel);
        assert_eq!(options.max_threads, 2);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_scale = ScaleConfig::new().with_scale(0.0, 1.0);
        assert!(matches!(bad_scale.validate(), Err(ConfigError::InvalidScale { .. })));

        let bad_tiles = ScaleConfig::new().with_tile_size(0, 16);
        assert!(matches!(bad_tiles.validate(), Err(ConfigError::InvalidTileSize { .. })));

        let bad_bits = ScaleConfig::new().with_subsample_bits(20);
        assert!(matches!(bad_bits.validate(), Err(ConfigError::InvalidKernel(_))));
    }

    #[test]
    fn test_from_toml_str() {
        let config = ScaleConfig::from_toml_str(
            r#"
            scale_x = 2.0
            scale_y = 3.0
            interpolation = "bilinear"
            dest_no_data = [9.0, 1.0]

            [border]
            mode = "constant"
            value = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.scale_y, 3.0);
        assert_eq!(config.interpolation, InterpolationKind::Bilinear);
        assert_eq!(config.dest_no_data, vec![9.0, 1.0]);
        assert_eq!(config.border, Some(BorderMode::Constant(4.0)));
        assert_eq!(config.tile_width, DEFAULT_TILE_SIZE);
    }

    #[test]
    fn test_from_toml_str_errors() {
        assert!(matches!(
            ScaleConfig::from_toml_str("scale_x = \"big\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ScaleConfig::from_toml_str("scale_x = -1.0"),
            Err(ConfigError::InvalidScale { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scale_x = 0.5\nscale_y = 0.5\ninterpolation = \"bicubic\"").unwrap();
        let config = ScaleConfig::from_file(file.path()).unwrap();
        assert_eq!(config.scale_x, 0.5);
        assert_eq!(config.interpolation, InterpolationKind::Bicubic);

        let missing = ScaleConfig::from_file("/nonexistent/tilescale.toml");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
