//! Integer geometry: rectangles, kernel footprints and tile grids.

use num_integer::Integer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rectangle of whole pixels.
///
/// The origin may be negative (destination images can start anywhere once a
/// translation is applied); width and height are never negative. An empty
/// rectangle means "nothing to compute".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// X of the left edge
    pub x: i64,
    /// Y of the top edge
    pub y: i64,
    /// Width in pixels
    pub width: i64,
    /// Height in pixels
    pub height: i64,
}

impl Rect {
    /// Create a new rectangle. Negative extents are clamped to zero.
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Create from edge coordinates (`right` and `bottom` exclusive).
    pub fn from_edges(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Get the right edge coordinate (exclusive).
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    /// Get the bottom edge coordinate (exclusive).
    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    /// Calculate the area of this region in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check whether the rectangle has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection; empty when the rectangles do not overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            Rect::new(x0, y0, 0, 0)
        } else {
            Rect::from_edges(x0, y0, x1, y1)
        }
    }

    /// Check if the rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Smallest rectangle containing both. Empty inputs are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Check if `other` lies entirely within this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Check if a pixel lies within this rectangle.
    pub fn contains_point(&self, x: i64, y: i64) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Row-major offset of a pixel inside this rectangle.
    pub(crate) fn offset_of(&self, x: i64, y: i64) -> usize {
        ((y - self.y) * self.width + (x - self.x)) as usize
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}; {}x{}]", self.x, self.y, self.width, self.height)
    }
}

/// Source pixels an interpolation kernel needs around its anchor pixel.
///
/// The anchor is the source pixel at or left/above the backward-mapped
/// position; `left` pixels before it and `right` pixels after it are read
/// horizontally, `top` and `bottom` vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelFootprint {
    /// Pixels needed to the left.
    pub left: i64,
    /// Pixels needed to the right.
    pub right: i64,
    /// Pixels needed above.
    pub top: i64,
    /// Pixels needed below.
    pub bottom: i64,
    /// Kernel width in pixels.
    pub width: i64,
    /// Kernel height in pixels.
    pub height: i64,
}

impl KernelFootprint {
    /// Footprint of nearest-neighbour sampling: a single pixel.
    pub fn point() -> Self {
        Self::asymmetric(0, 0, 0, 0)
    }

    /// Create an asymmetric footprint; the kernel size follows from the paddings.
    pub fn asymmetric(left: i64, right: i64, top: i64, bottom: i64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            width: left + right + 1,
            height: top + bottom + 1,
        }
    }

    /// Check if the kernel reads only its anchor pixel.
    pub fn is_point(&self) -> bool {
        self.left == 0 && self.right == 0 && self.top == 0 && self.bottom == 0
    }
}

/// Regular tile layout anchored at a grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// X of the left edge of tile column 0
    pub origin_x: i64,
    /// Y of the top edge of tile row 0
    pub origin_y: i64,
    /// Tile width
    pub tile_width: i64,
    /// Tile height
    pub tile_height: i64,
}

impl TileGrid {
    /// Create a tile grid. Tile sizes below one are raised to one.
    pub fn new(origin_x: i64, origin_y: i64, tile_width: i64, tile_height: i64) -> Self {
        Self {
            origin_x,
            origin_y,
            tile_width: tile_width.max(1),
            tile_height: tile_height.max(1),
        }
    }

    /// Tile column containing `x`.
    pub fn tile_x(&self, x: i64) -> i64 {
        Integer::div_floor(&(x - self.origin_x), &self.tile_width)
    }

    /// Tile row containing `y`.
    pub fn tile_y(&self, y: i64) -> i64 {
        Integer::div_floor(&(y - self.origin_y), &self.tile_height)
    }

    /// Full (unclipped) rectangle of a tile.
    pub fn tile_rect(&self, tile_x: i64, tile_y: i64) -> Rect {
        Rect::new(
            self.origin_x + tile_x * self.tile_width,
            self.origin_y + tile_y * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }

    /// Inclusive tile index ranges `(min_x, max_x, min_y, max_y)` touched by a
    /// non-empty rectangle.
    pub fn tile_range(&self, rect: &Rect) -> (i64, i64, i64, i64) {
        (
            self.tile_x(rect.x),
            self.tile_x(rect.right() - 1),
            self.tile_y(rect.y),
            self.tile_y(rect.bottom() - 1),
        )
    }

    /// Vertical tile boundaries strictly inside `(lo, hi)`.
    pub fn boundaries_x(&self, lo: i64, hi: i64) -> Vec<i64> {
        interior_boundaries(self.origin_x, self.tile_width, lo, hi)
    }

    /// Horizontal tile boundaries strictly inside `(lo, hi)`.
    pub fn boundaries_y(&self, lo: i64, hi: i64) -> Vec<i64> {
        interior_boundaries(self.origin_y, self.tile_height, lo, hi)
    }

    /// Iterate over the tiles covering `bounds`, clipped to it.
    pub fn tiles(&self, bounds: Rect) -> TileIterator {
        TileIterator::new(*self, bounds)
    }
}

fn interior_boundaries(origin: i64, size: i64, lo: i64, hi: i64) -> Vec<i64> {
    if hi - lo < 2 {
        return Vec::new();
    }
    let first = Integer::div_floor(&(lo - origin), &size) + 1;
    (first..)
        .map(|t| origin + t * size)
        .take_while(|&b| b < hi)
        .collect()
}

/// A tile of a grid: its indices and its rectangle clipped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileIndex {
    /// Tile column
    pub tile_x: i64,
    /// Tile row
    pub tile_y: i64,
    /// Tile rectangle clipped to the image bounds
    pub rect: Rect,
}

/// Iterator over tiles in an image, row by row.
pub struct TileIterator {
    grid: TileGrid,
    bounds: Rect,
    min_tx: i64,
    max_tx: i64,
    max_ty: i64,
    current_x: i64,
    current_y: i64,
}

impl TileIterator {
    /// Create a new tile iterator.
    pub fn new(grid: TileGrid, bounds: Rect) -> Self {
        let (min_tx, max_tx, min_ty, max_ty) = if bounds.is_empty() {
            (0, -1, 0, -1)
        } else {
            grid.tile_range(&bounds)
        };
        Self {
            grid,
            bounds,
            min_tx,
            max_tx,
            max_ty,
            current_x: min_tx,
            current_y: min_ty,
        }
    }

    /// Get the total number of tiles.
    pub fn tile_count(&self) -> usize {
        if self.max_tx < self.min_tx {
            return 0;
        }
        let tiles_x = self.max_tx - self.min_tx + 1;
        let tiles_y = self.max_ty - self.current_y + 1;
        (tiles_x * tiles_y.max(0)) as usize
    }
}

impl Iterator for TileIterator {
    type Item = TileIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.max_tx < self.min_tx || self.current_y > self.max_ty {
            return None;
        }

        let tile_x = self.current_x;
        let tile_y = self.current_y;
        let rect = self.grid.tile_rect(tile_x, tile_y).intersect(&self.bounds);

        // Move to next tile
        self.current_x += 1;
        if self.current_x > self.max_tx {
            self.current_x = self.min_tx;
            self.current_y += 1;
        }

        Some(TileIndex { tile_x, tile_y, rect })
    }
}
