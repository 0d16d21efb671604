//! Interpolation kernels.
//!
//! A kernel is a footprint plus a table of per-axis weights indexed by the
//! quantized fractional offset of the backward-mapped position. Offsets are
//! quantized to `2^subsample_bits` steps, so the table has one row per step.

use crate::core::error::{ConfigError, ConfigResult};
use crate::core::geometry::KernelFootprint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default fractional resolution.
pub const DEFAULT_SUBSAMPLE_BITS: u32 = 8;

/// Largest supported fractional resolution.
pub const MAX_SUBSAMPLE_BITS: u32 = 16;

/// Keys cubic convolution parameter.
const CUBIC_A: f64 = -0.5;

/// The supported kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    #[default]
    /// Value of the pixel containing the position.
    Nearest,
    /// Linear blend of the 2x2 neighbourhood.
    Bilinear,
    /// Keys cubic convolution over the 4x4 neighbourhood.
    Bicubic,
}

impl InterpolationKind {
    /// Source pixels needed around the key pixel.
    pub fn footprint(&self) -> KernelFootprint {
        match self {
            InterpolationKind::Nearest => KernelFootprint::point(),
            InterpolationKind::Bilinear => KernelFootprint::asymmetric(0, 1, 0, 1),
            InterpolationKind::Bicubic => KernelFootprint::asymmetric(1, 2, 1, 2),
        }
    }

    /// Number of taps per axis.
    pub fn taps(&self) -> usize {
        match self {
            InterpolationKind::Nearest => 1,
            InterpolationKind::Bilinear => 2,
            InterpolationKind::Bicubic => 4,
        }
    }
}

impl fmt::Display for InterpolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpolationKind::Nearest => "nearest",
            InterpolationKind::Bilinear => "bilinear",
            InterpolationKind::Bicubic => "bicubic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for InterpolationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(InterpolationKind::Nearest),
            "bilinear" => Ok(InterpolationKind::Bilinear),
            "bicubic" => Ok(InterpolationKind::Bicubic),
            other => Err(ConfigError::InvalidKernel(format!("unknown interpolation '{}'", other))),
        }
    }
}

/// A kernel with its precomputed weight table.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    kind: InterpolationKind,
    subsample_bits: u32,
    table: Vec<f64>,
}

impl Interpolation {
    /// Build a kernel with `2^subsample_bits` fractional steps.
    pub fn new(kind: InterpolationKind, subsample_bits: u32) -> ConfigResult<Self> {
        if subsample_bits > MAX_SUBSAMPLE_BITS {
            return Err(ConfigError::InvalidKernel(format!(
                "subsample_bits {} exceeds {}",
                subsample_bits, MAX_SUBSAMPLE_BITS
            )));
        }

        Ok(Self::build(kind, subsample_bits))
    }

    /// Nearest neighbour.
    pub fn nearest() -> Self {
        Self::with_default_bits(InterpolationKind::Nearest)
    }

    /// Bilinear with the default resolution.
    pub fn bilinear() -> Self {
        Self::with_default_bits(InterpolationKind::Bilinear)
    }

    /// Bicubic with the default resolution.
    pub fn bicubic() -> Self {
        Self::with_default_bits(InterpolationKind::Bicubic)
    }

    fn with_default_bits(kind: InterpolationKind) -> Self {
        Self::build(kind, DEFAULT_SUBSAMPLE_BITS)
    }

    fn build(kind: InterpolationKind, subsample_bits: u32) -> Self {
        let steps = 1usize << subsample_bits;
        let offset = |i: usize| i as f64 / steps as f64;
        let table = match kind {
            InterpolationKind::Nearest => vec![1.0],
            InterpolationKind::Bilinear => (0..steps)
                .map(offset)
                .flat_map(|f| [1.0 - f, f])
                .collect(),
            InterpolationKind::Bicubic => (0..steps)
                .map(offset)
                .flat_map(|f| [cubic(1.0 + f), cubic(f), cubic(1.0 - f), cubic(2.0 - f)])
                .collect(),
        };
        Self {
            kind,
            subsample_bits,
            table,
        }
    }

    /// Kernel kind.
    pub fn kind(&self) -> InterpolationKind {
        self.kind
    }

    /// Bits of fractional precision in the weight table.
    pub fn subsample_bits(&self) -> u32 {
        self.subsample_bits
    }

    /// Check for nearest-neighbour sampling.
    pub fn is_nearest(&self) -> bool {
        self.kind == InterpolationKind::Nearest
    }

    /// Source pixels read around the key pixel.
    pub fn footprint(&self) -> KernelFootprint {
        self.kind.footprint()
    }

    /// Taps per axis.
    pub fn taps(&self) -> usize {
        self.kind.taps()
    }

    /// Weights of the taps for a quantized fractional offset.
    ///
    /// Tap `i` applies to source pixel `key - before + i`. Nearest ignores the
    /// offset.
    #[inline]
    pub fn weights(&self, frac_index: u32) -> &[f64] {
        let taps = self.taps();
        if self.kind == InterpolationKind::Nearest {
            return &self.table[..1];
        }
        let max_row = (self.table.len() / taps).saturating_sub(1);
        let row = (frac_index as usize).min(max_row);
        &self.table[row * taps..(row + 1) * taps]
    }
}

/// Keys cubic convolution kernel at distance `d`.
fn cubic(d: f64) -> f64 {
    let d = d.abs();
    if d <= 1.0 {
        (CUBIC_A + 2.0) * d * d * d - (CUBIC_A + 3.0) * d * d + 1.0
    } else if d < 2.0 {
        CUBIC_A * d * d * d - 5.0 * CUBIC_A * d * d + 8.0 * CUBIC_A * d - 4.0 * CUBIC_A
    } else {
        0.0
    }
}
