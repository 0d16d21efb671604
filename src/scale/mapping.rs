//! Exact coordinate mapping between source and destination pixels.
//!
//! Per axis, destination pixel `d` samples the continuous source position
//!
//! ```text
//! pos(d) = (d + 1/2 - t) / s            nearest
//! pos(d) = (d + 1/2 - t) / s - 1/2      interpolating kernels
//! ```
//!
//! and is anchored on the key pixel `floor(pos(d))`. Every interval below is
//! half-open and computed with [`Rational`] arithmetic; the only rounding is
//! the final `floor`/`ceil` to a pixel index.

use crate::core::geometry::{KernelFootprint, Rect};
use crate::core::rational::Rational;
use crate::scale::interp::Interpolation;
use crate::scale::params::{AxisParams, ScaleParams};

/// The mapping along one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisMapping {
    scale: Rational,
    trans: Rational,
    inv_scale: Rational,
    /// Kernel pixels needed before the key pixel.
    before: i64,
    /// Kernel pixels needed after the key pixel.
    after: i64,
    nearest: bool,
}

impl AxisMapping {
    /// Create the mapping of one axis for a kernel with the given paddings.
    pub fn new(params: &AxisParams, before: i64, after: i64, nearest: bool) -> Self {
        Self {
            scale: params.scale.clone(),
            trans: params.trans.clone(),
            inv_scale: params.inv_scale.clone(),
            before,
            after,
            nearest,
        }
    }

    /// Kernel pixels before the key pixel.
    pub fn before(&self) -> i64 {
        self.before
    }

    /// Kernel pixels after the key pixel.
    pub fn after(&self) -> i64 {
        self.after
    }

    /// Kernel size along this axis.
    pub fn kernel_width(&self) -> i64 {
        self.before + self.after + 1
    }

    /// Exact `1 / scale`.
    pub fn inv_scale(&self) -> &Rational {
        &self.inv_scale
    }

    /// Exact source position sampled by destination pixel `d`.
    pub fn position(&self, d: i64) -> Rational {
        let centre = Rational::from_integer(d) + Rational::half() - &self.trans;
        let pos = centre * &self.inv_scale;
        if self.nearest {
            pos
        } else {
            pos - Rational::half()
        }
    }

    /// Key source pixel of destination pixel `d`.
    pub fn key(&self, d: i64) -> i64 {
        self.position(d).floor()
    }

    /// First destination pixel whose centre maps at or beyond source `x`.
    fn first_at(&self, x: Rational) -> i64 {
        (x * &self.scale - Rational::half() + &self.trans).ceil()
    }

    /// Destination pixels whose key lies in `[lo, hi)`.
    pub fn key_interval(&self, lo: i64, hi: i64) -> (i64, i64) {
        let offset = if self.nearest { Rational::zero() } else { Rational::half() };
        let start = self.first_at(Rational::from_integer(lo) + &offset);
        let end = self.first_at(Rational::from_integer(hi) + &offset);
        (start, end.max(start))
    }

    /// Destination pixels computable from source pixels `[lo, hi)`.
    ///
    /// For interpolating kernels the source range is first shrunk by the
    /// kernel paddings and then by half a pixel on each end.
    pub fn forward_interval(&self, lo: i64, hi: i64) -> (i64, i64) {
        if self.nearest {
            return self.coverage_interval(lo, hi);
        }
        let start = self.first_at(Rational::from_integer(lo + self.before) + Rational::half());
        let end = self.first_at(Rational::from_integer(hi - self.after) - Rational::half());
        (start, end.max(start))
    }

    /// Destination pixels whose centres fall inside source `[lo, hi)`,
    /// regardless of the kernel.
    pub fn coverage_interval(&self, lo: i64, hi: i64) -> (i64, i64) {
        let start = self.first_at(Rational::from_integer(lo));
        let end = self.first_at(Rational::from_integer(hi));
        (start, end.max(start))
    }

    /// Source pixels read by the kernels of destination pixels `[d0, d1)`.
    pub fn backward_interval(&self, d0: i64, d1: i64) -> (i64, i64) {
        let start = self.key(d0) - self.before;
        if d1 <= d0 {
            return (start, start);
        }
        (start, self.key(d1 - 1) + self.after + 1)
    }
}

/// Two-axis mapping for one transform and kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper {
    x: AxisMapping,
    y: AxisMapping,
    footprint: KernelFootprint,
}

impl Mapper {
    /// Mapping for `params` with the footprint of `interp`.
    pub fn new(params: &ScaleParams, interp: &Interpolation) -> Self {
        let footprint = interp.footprint();
        let nearest = interp.is_nearest();
        Self {
            x: AxisMapping::new(params.x(), footprint.left, footprint.right, nearest),
            y: AxisMapping::new(params.y(), footprint.top, footprint.bottom, nearest),
            footprint,
        }
    }

    /// Horizontal axis.
    pub fn x(&self) -> &AxisMapping {
        &self.x
    }

    /// Vertical axis.
    pub fn y(&self) -> &AxisMapping {
        &self.y
    }

    /// Kernel footprint used for both axes.
    pub fn footprint(&self) -> KernelFootprint {
        self.footprint
    }

    /// Destination image bounds for a source image.
    ///
    /// With `extended` (a border mode supplies samples beyond the source) the
    /// bounds cover every destination pixel whose centre falls on the source;
    /// otherwise only pixels whose whole kernel fits the source. Either way
    /// the result is at least one pixel wide and high.
    pub fn destination_bounds(&self, source: &Rect, extended: bool) -> Rect {
        let (x0, x1, y0, y1) = if extended {
            let (x0, x1) = self.x.coverage_interval(source.x, source.right());
            let (y0, y1) = self.y.coverage_interval(source.y, source.bottom());
            (x0, x1, y0, y1)
        } else {
            let (x0, x1) = self.x.forward_interval(source.x, source.right());
            let (y0, y1) = self.y.forward_interval(source.y, source.bottom());
            (x0, x1, y0, y1)
        };
        Rect::new(x0, y0, (x1 - x0).max(1), (y1 - y0).max(1))
    }

    /// Destination pixels computable from the samples of `source`. May be empty.
    pub fn forward_map(&self, source: &Rect) -> Rect {
        let (x0, x1) = self.x.forward_interval(source.x, source.right());
        let (y0, y1) = self.y.forward_interval(source.y, source.bottom());
        Rect::from_edges(x0, y0, x1, y1)
    }

    /// Source pixels needed to compute `dest`, kernel padding included.
    pub fn backward_map(&self, dest: &Rect) -> Rect {
        let (x0, x1) = self.x.backward_interval(dest.x, dest.right());
        let (y0, y1) = self.y.backward_interval(dest.y, dest.bottom());
        Rect::from_edges(x0, y0, x1, y1)
    }

    /// Part of `dest_bounds` that can be computed.
    ///
    /// Everything when a border mode extends the source, otherwise the
    /// pixels whose kernels fit inside `source`.
    pub fn computable_bounds(&self, source: &Rect, dest_bounds: &Rect, extended: bool) -> Rect {
        if extended {
            *dest_bounds
        } else {
            self.forward_map(source).intersect(dest_bounds)
        }
    }
}

/// Destination bounds of `source` under `params` without border extension.
pub fn destination_bounds(source: &Rect, params: &ScaleParams, interp: &Interpolation) -> Rect {
    Mapper::new(params, interp).destination_bounds(source, false)
}

/// Destination pixels computable from `source`.
pub fn forward_map(source: &Rect, params: &ScaleParams, interp: &Interpolation) -> Rect {
    Mapper::new(params, interp).forward_map(source)
}

/// Source pixels needed to compute `dest`.
pub fn backward_map(dest: &Rect, params: &ScaleParams, interp: &Interpolation) -> Rect {
    Mapper::new(params, interp).backward_map(dest)
}
