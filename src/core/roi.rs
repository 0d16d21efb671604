//! Region of interest and no-data predicates.
//!
//! Both are read-only collaborators: the resampling engine only queries them.
//! A [`Roi`] answers "may this source pixel contribute", a [`NoDataRange`]
//! answers "is this sample value excluded".

use crate::core::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A predicate over integer pixel coordinates with a known bounding box.
pub trait Roi: Send + Sync + fmt::Debug {
    /// Bounding rectangle; no pixel outside it is in the ROI.
    fn bounds(&self) -> Rect;

    /// Check if a pixel is in the ROI.
    fn contains(&self, x: i64, y: i64) -> bool;

    /// Check if every pixel of `rect` is in the ROI.
    ///
    /// The default answers `false` unless `rect` is empty; implementations
    /// that can decide cheaply should override it, it lets whole tiles skip
    /// per-pixel ROI checks.
    fn contains_rect(&self, rect: &Rect) -> bool {
        rect.is_empty()
    }

    /// Check if any pixel of `rect` may be in the ROI.
    fn intersects(&self, rect: &Rect) -> bool {
        self.bounds().intersects(rect)
    }
}

/// A rectangular ROI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectRoi {
    rect: Rect,
}

impl RectRoi {
    /// Create a rectangular ROI.
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }
}

impl Roi for RectRoi {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        self.rect.contains_point(x, y)
    }

    fn contains_rect(&self, rect: &Rect) -> bool {
        self.rect.contains_rect(rect)
    }
}

/// A ROI given as a bitmap over a rectangle.
#[derive(Clone, PartialEq, Eq)]
pub struct MaskRoi {
    rect: Rect,
    mask: Vec<bool>,
}

impl MaskRoi {
    /// Build from a predicate evaluated over `rect`.
    pub fn from_fn<F>(rect: Rect, mut inside: F) -> Self
    where
        F: FnMut(i64, i64) -> bool,
    {
        let mut mask = Vec::with_capacity(rect.area() as usize);
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                mask.push(inside(x, y));
            }
        }
        Self { rect, mask }
    }

    /// Union of rectangles.
    pub fn from_rects(rects: &[Rect]) -> Self {
        let bounds = rects.iter().fold(Rect::default(), |acc, r| acc.union(r));
        Self::from_fn(bounds, |x, y| rects.iter().any(|r| r.contains_point(x, y)))
    }

    /// Number of pixels in the ROI.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

impl fmt::Debug for MaskRoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskRoi")
            .field("rect", &self.rect)
            .field("pixels", &self.count())
            .finish()
    }
}

impl Roi for MaskRoi {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        self.rect.contains_point(x, y) && self.mask[self.rect.offset_of(x, y)]
    }

    fn contains_rect(&self, rect: &Rect) -> bool {
        if !self.rect.contains_rect(rect) {
            return false;
        }
        (rect.y..rect.bottom()).all(|y| (rect.x..rect.right()).all(|x| self.contains(x, y)))
    }
}

/// The ROI rendered as a sample image over a fixed area.
///
/// Per-pixel kernels query this instead of the `Roi` trait object; it is
/// built once per operator and shared read-only between tiles.
#[derive(Debug, Clone)]
pub struct RoiMask {
    rect: Rect,
    mask: Vec<u8>,
}

impl RoiMask {
    /// Render `roi` over `area`. Pixels outside `area` read as outside the ROI.
    pub fn render(roi: &dyn Roi, area: Rect) -> Self {
        let rect = area.intersect(&roi.bounds());
        let mut mask = Vec::with_capacity(rect.area() as usize);
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                mask.push(u8::from(roi.contains(x, y)));
            }
        }
        Self { rect, mask }
    }

    /// Rendered area.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Check if a pixel is in the ROI.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.rect.contains_point(x, y) && self.mask[self.rect.offset_of(x, y)] != 0
    }
}

/// A range of sample values treated as no-data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoDataRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Whether `min` itself is no-data
    #[serde(default = "default_true")]
    pub min_inclusive: bool,
    /// Whether `max` itself is no-data
    #[serde(default = "default_true")]
    pub max_inclusive: bool,
    /// Whether NaN samples are no-data
    #[serde(default = "default_true")]
    pub nan: bool,
}

fn default_true() -> bool {
    true
}

impl NoDataRange {
    /// Inclusive range `[min, max]`; NaN is no-data.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: true,
            max_inclusive: true,
            nan: true,
        }
    }

    /// A single no-data value.
    pub fn single(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Only NaN is no-data.
    pub fn nan_only() -> Self {
        Self {
            min: f64::NAN,
            max: f64::NAN,
            min_inclusive: false,
            max_inclusive: false,
            nan: true,
        }
    }

    /// Set bound inclusiveness.
    pub fn with_inclusive(mut self, min_inclusive: bool, max_inclusive: bool) -> Self {
        self.min_inclusive = min_inclusive;
        self.max_inclusive = max_inclusive;
        self
    }

    /// Check if a sample value is no-data.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return self.nan;
        }
        let above = if self.min_inclusive {
            value >= self.min
        } else {
            value > self.min
        };
        let below = if self.max_inclusive {
            value <= self.max
        } else {
            value < self.max
        };
        above && below
    }
}
