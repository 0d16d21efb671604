//! Border extension: virtual samples beyond the physical source bounds.

use crate::core::error::{ScaleError, ScaleResult};
use crate::core::geometry::Rect;
use crate::core::source::ImageSource;
use crate::core::types::{Raster, Sample, SampleType};
use serde::{Deserialize, Serialize};

/// How samples outside the source are produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum BorderMode {
    /// Every outside sample has the same value.
    Constant(f64),
    /// Repeat the edge pixel.
    Copy,
    /// Mirror around the edge pixel without repeating it.
    Reflect,
    /// Tile the source periodically.
    Wrap,
}

/// Map a coordinate outside `[start, start + len)` back inside.
///
/// Returns `None` for constant borders and empty ranges.
pub fn map_index(i: i64, start: i64, len: i64, mode: &BorderMode) -> Option<i64> {
    if len <= 0 {
        return None;
    }
    let rel = i - start;
    let mapped = match mode {
        BorderMode::Constant(_) => return None,
        BorderMode::Copy => rel.clamp(0, len - 1),
        BorderMode::Reflect => {
            if len == 1 {
                0
            } else {
                let period = 2 * len - 2;
                let r = rel.rem_euclid(period);
                if r < len {
                    r
                } else {
                    period - r
                }
            }
        }
        BorderMode::Wrap => rel.rem_euclid(len),
    };
    Some(start + mapped)
}

impl BorderMode {
    /// Read `region` from `source`, producing samples outside the source
    /// bounds according to this mode.
    pub fn read_extended(&self, source: &dyn ImageSource, region: Rect) -> ScaleResult<Raster> {
        let bounds = source.bounds();
        if bounds.contains_rect(&region) {
            return source.read_region(region);
        }

        let bands = source.bands();
        if let BorderMode::Constant(value) = *self {
            let fill = vec![value; bands];
            let mut out = Raster::filled(region, source.sample_type(), &fill);
            let inner = region.intersect(&bounds);
            if !inner.is_empty() {
                out.paste(&source.read_region(inner)?);
            }
            return Ok(out);
        }

        let xs: Vec<i64> = (region.x..region.right())
            .filter_map(|x| map_index(x, bounds.x, bounds.width, self))
            .collect();
        let ys: Vec<i64> = (region.y..region.bottom())
            .filter_map(|y| map_index(y, bounds.y, bounds.height, self))
            .collect();
        let needed = match (xs.iter().min(), xs.iter().max(), ys.iter().min(), ys.iter().max()) {
            (Some(&x0), Some(&x1), Some(&y0), Some(&y1)) => Rect::from_edges(x0, y0, x1 + 1, y1 + 1),
            _ => Rect::default(),
        };
        let inner = source.read_region(needed)?;
        if !inner.rect().contains_rect(&needed) {
            return Err(ScaleError::RegionOutOfBounds {
                requested: needed,
                bounds: inner.rect(),
            });
        }

        match inner.sample_type() {
            SampleType::U8 => gather::<u8>(&inner, region, &xs, &ys, bands),
            SampleType::U16 => gather::<u16>(&inner, region, &xs, &ys, bands),
            SampleType::I16 => gather::<i16>(&inner, region, &xs, &ys, bands),
            SampleType::I32 => gather::<i32>(&inner, region, &xs, &ys, bands),
            SampleType::F32 => gather::<f32>(&inner, region, &xs, &ys, bands),
            SampleType::F64 => gather::<f64>(&inner, region, &xs, &ys, bands),
        }
    }
}

/// Copy the samples at `xs` by `ys` out of `inner` into a raster over `region`.
fn gather<T: Sample>(inner: &Raster, region: Rect, xs: &[i64], ys: &[i64], bands: usize) -> ScaleResult<Raster> {
    let src = inner.as_slice::<T>().ok_or(ScaleError::SampleTypeMismatch {
        expected: T::TYPE,
        got: inner.sample_type(),
    })?;
    let rect = inner.rect();
    let stride = inner.bands();
    let mut values = Vec::with_capacity(region.area() as usize * bands);
    for &y in ys {
        for &x in xs {
            let at = rect.offset_of(x, y) * stride;
            values.extend_from_slice(&src[at..at + stride]);
        }
    }
    Ok(Raster::from_vec(region, bands, values)?)
}
