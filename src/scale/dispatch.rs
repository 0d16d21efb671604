//! Per-pixel resampling with ROI and no-data exclusion.
//!
//! Which checks a tile needs is decided once per tile ([`TileCase`]); the
//! pixel loop is then monomorphized over the sample type and over the two
//! checks, so a tile without masks runs the plain weighted sum.
//!
//! A source sample is excluded when its pixel is outside the ROI (all bands)
//! or its value is no-data (that band only). Excluded samples contribute
//! neither to the sum nor to the normalization; a pixel left without any
//! contributing sample takes the destination no-data value.

use crate::core::error::{ScaleError, ScaleResult};
use crate::core::geometry::Rect;
use crate::core::roi::{NoDataRange, Roi, RoiMask};
use crate::core::types::{Raster, Sample, SampleType};
use crate::scale::interp::{Interpolation, InterpolationKind};
use crate::scale::positions::AxisPositions;
use std::fmt;

/// Weight sums below this are treated as zero.
const WEIGHT_EPSILON: f64 = 1e-10;

/// Masking regime of one destination tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileCase {
    /// The source footprint misses the ROI: the tile is all no-data.
    OutsideRoi,
    /// No ROI test and no no-data test.
    NoMask,
    /// ROI straddles the footprint, no no-data range.
    RoiOnly,
    /// No-data range, ROI absent or covering the whole footprint.
    NoDataOnly,
    /// ROI straddles the footprint and a no-data range is set.
    RoiAndNoData,
}

impl TileCase {
    /// Pick the case for a tile reading the source pixels `footprint`.
    pub fn select(roi: Option<&dyn Roi>, no_data: Option<&NoDataRange>, footprint: &Rect) -> Self {
        let roi_active = match roi {
            Some(roi) if !roi.intersects(footprint) => return TileCase::OutsideRoi,
            Some(roi) => !roi.contains_rect(footprint),
            None => false,
        };
        match (roi_active, no_data.is_some()) {
            (false, false) => TileCase::NoMask,
            (true, false) => TileCase::RoiOnly,
            (false, true) => TileCase::NoDataOnly,
            (true, true) => TileCase::RoiAndNoData,
        }
    }

    /// Check if per-pixel ROI tests are needed.
    pub fn uses_roi(&self) -> bool {
        matches!(self, TileCase::RoiOnly | TileCase::RoiAndNoData)
    }

    /// Check if per-sample no-data tests are needed.
    pub fn uses_no_data(&self) -> bool {
        matches!(self, TileCase::NoDataOnly | TileCase::RoiAndNoData)
    }
}

impl fmt::Display for TileCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileCase::OutsideRoi => "outside-roi",
            TileCase::NoMask => "no-mask",
            TileCase::RoiOnly => "roi",
            TileCase::NoDataOnly => "no-data",
            TileCase::RoiAndNoData => "roi+no-data",
        };
        write!(f, "{}", name)
    }
}

/// Everything the pixel loop needs besides the samples.
#[derive(Debug, Clone, Copy)]
pub struct PixelKernel<'a> {
    /// Kernel and weight table.
    pub interp: &'a Interpolation,
    /// Masking case chosen for the tile.
    pub case: TileCase,
    /// Rendered ROI; consulted when the case has one.
    pub roi: Option<&'a RoiMask>,
    /// Source no-data range.
    pub no_data: Option<&'a NoDataRange>,
    /// Destination no-data, one value per band.
    pub dest_no_data: &'a [f64],
}

impl PixelKernel<'_> {
    /// Resample the destination pixels spanned by `xs` and `ys` into `out`.
    ///
    /// `src` must cover the kernels of those pixels and share the storage
    /// type and band count of `out`.
    pub fn resample(&self, src: &Raster, xs: &AxisPositions, ys: &AxisPositions, out: &mut Raster) -> ScaleResult<()> {
        if src.sample_type() != out.sample_type() {
            return Err(ScaleError::SampleTypeMismatch {
                expected: out.sample_type(),
                got: src.sample_type(),
            });
        }
        match out.sample_type() {
            SampleType::U8 => self.run::<u8>(src, xs, ys, out),
            SampleType::U16 => self.run::<u16>(src, xs, ys, out),
            SampleType::I16 => self.run::<i16>(src, xs, ys, out),
            SampleType::I32 => self.run::<i32>(src, xs, ys, out),
            SampleType::F32 => self.run::<f32>(src, xs, ys, out),
            SampleType::F64 => self.run::<f64>(src, xs, ys, out),
        }
        Ok(())
    }

    fn run<T: Sample>(&self, src: &Raster, xs: &AxisPositions, ys: &AxisPositions, out: &mut Raster) {
        match self.case {
            TileCase::OutsideRoi => {}
            TileCase::NoMask => self.run_masked::<T, false, false>(src, xs, ys, out),
            TileCase::RoiOnly => self.run_masked::<T, true, false>(src, xs, ys, out),
            TileCase::NoDataOnly => self.run_masked::<T, false, true>(src, xs, ys, out),
            TileCase::RoiAndNoData => self.run_masked::<T, true, true>(src, xs, ys, out),
        }
    }

    fn run_masked<T: Sample, const ROI: bool, const NO_DATA: bool>(
        &self,
        src: &Raster,
        xs: &AxisPositions,
        ys: &AxisPositions,
        out: &mut Raster,
    ) {
        let bands = out.bands();
        let out_rect = out.rect();
        let (Some(samples), Some(dst)) = (src.as_slice::<T>(), T::slice_mut(out.data_mut())) else {
            return;
        };
        let window = Window::<T, ROI, NO_DATA> {
            samples,
            rect: src.rect(),
            bands,
            roi: self.roi,
            no_data: self.no_data,
        };

        let footprint = self.interp.footprint();
        let taps = self.interp.taps();
        let mut values = vec![0.0f64; taps * taps];
        let mut valid = vec![false; taps * taps];

        for (j, (&ky, &fy)) in ys.index().iter().zip(ys.frac()).enumerate() {
            let y = ys.start() + j as i64;
            let wy = self.interp.weights(fy);
            let sy = ky - footprint.top;
            for (i, (&kx, &fx)) in xs.index().iter().zip(xs.frac()).enumerate() {
                let x = xs.start() + i as i64;
                let wx = self.interp.weights(fx);
                let sx = kx - footprint.left;
                let at = out_rect.offset_of(x, y) * bands;

                for b in 0..bands {
                    for ty in 0..taps {
                        for tx in 0..taps {
                            let (v, ok) = window.sample(sx + tx as i64, sy + ty as i64, b);
                            values[ty * taps + tx] = v;
                            valid[ty * taps + tx] = ok;
                        }
                    }
                    let result = if ROI || NO_DATA {
                        combine_masked(self.interp.kind(), &values, &valid, wx, wy)
                    } else {
                        Some(combine(&values, wx, wy))
                    };
                    dst[at + b] = match result {
                        Some(v) => T::from_f64(v),
                        None => T::from_f64(self.dest_no_data[b]),
                    };
                }
            }
        }
    }
}

/// Read access to a source raster with the exclusion tests compiled in.
struct Window<'a, T, const ROI: bool, const NO_DATA: bool> {
    samples: &'a [T],
    rect: Rect,
    bands: usize,
    roi: Option<&'a RoiMask>,
    no_data: Option<&'a NoDataRange>,
}

impl<T: Sample, const ROI: bool, const NO_DATA: bool> Window<'_, T, ROI, NO_DATA> {
    /// Sample value and whether it may contribute.
    #[inline]
    fn sample(&self, x: i64, y: i64, band: usize) -> (f64, bool) {
        let value = self.samples[self.rect.offset_of(x, y) * self.bands + band].to_f64();
        let mut ok = true;
        if ROI {
            ok = self.roi.map_or(true, |mask| mask.contains(x, y));
        }
        if NO_DATA && ok {
            ok = !self.no_data.map_or(false, |range| range.contains(value));
        }
        (value, ok)
    }
}

/// Separable weighted sum with every sample contributing.
#[inline]
fn combine(values: &[f64], wx: &[f64], wy: &[f64]) -> f64 {
    let taps = wx.len();
    wy.iter()
        .enumerate()
        .map(|(ty, w)| {
            let row: f64 = wx.iter().enumerate().map(|(tx, v)| v * values[ty * taps + tx]).sum();
            w * row
        })
        .sum()
}

/// Weighted sum over the contributing samples only.
fn combine_masked(kind: InterpolationKind, values: &[f64], valid: &[bool], wx: &[f64], wy: &[f64]) -> Option<f64> {
    match kind {
        InterpolationKind::Nearest => valid[0].then_some(values[0]),
        InterpolationKind::Bilinear => {
            let top = pair(values[0], valid[0], values[1], valid[1], wx);
            let bottom = pair(values[2], valid[2], values[3], valid[3], wx);
            match (top, bottom) {
                (Some(a), Some(b)) => pair(a, true, b, true, wy),
                (Some(a), None) => pair(a, true, 0.0, false, wy),
                (None, Some(b)) => pair(0.0, false, b, true, wy),
                (None, None) => None,
            }
        }
        InterpolationKind::Bicubic => {
            let taps = wx.len();
            let mut rows = [0.0f64; 4];
            let mut rows_valid = [false; 4];
            for ty in 0..taps {
                let row = ty * taps..(ty + 1) * taps;
                if let Some(v) = renormalized(&values[row.clone()], &valid[row], wx) {
                    rows[ty] = v;
                    rows_valid[ty] = true;
                }
            }
            renormalized(&rows[..taps], &rows_valid[..taps], wy)
        }
    }
}

/// Two neighbours with weights `w`: both, or the valid one if it carries
/// weight. A lone valid neighbour with zero weight is no contribution.
#[inline]
fn pair(a: f64, a_ok: bool, b: f64, b_ok: bool, w: &[f64]) -> Option<f64> {
    match (a_ok, b_ok) {
        (true, true) => Some(a * w[0] + b * w[1]),
        (true, false) if w[0].abs() > WEIGHT_EPSILON => Some(a),
        (false, true) if w[1].abs() > WEIGHT_EPSILON => Some(b),
        _ => None,
    }
}

/// Weighted sum over valid samples divided by their weight sum.
///
/// A fully valid set is not renormalized, so it matches the unmasked sum.
fn renormalized(values: &[f64], valid: &[bool], weights: &[f64]) -> Option<f64> {
    if valid.iter().all(|&ok| ok) {
        return Some(values.iter().zip(weights).map(|(v, w)| v * w).sum());
    }
    let (mut sum, mut norm) = (0.0, 0.0);
    for ((v, w), &ok) in values.iter().zip(weights).zip(valid) {
        if ok {
            sum += v * w;
            norm += w;
        }
    }
    (norm.abs() > WEIGHT_EPSILON).then(|| sum / norm)
}
