//! Splitting destination regions along source tile boundaries.
//!
//! A destination region is cut into work items so that, where the geometry
//! allows it, the source read of one item does not straddle a source tile
//! boundary. The mapping is separable, so each axis is split on its own and
//! the work items are the cartesian product of the two axis splits.
//!
//! Whatever the split heuristics produce, the final axis intervals are
//! normalized into a partition of the destination range: every destination
//! pixel belongs to exactly one work item.

use crate::core::geometry::{Rect, TileGrid};
use crate::scale::mapping::{AxisMapping, Mapper};

/// A unit of work: a destination rectangle and the source pixels it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    /// Source pixels read, kernel padding included.
    pub src: Rect,
    /// Destination pixels written.
    pub dst: Rect,
}

/// Splits destination regions into [`WorkItem`]s.
#[derive(Debug, Clone)]
pub struct TileSplitter<'a> {
    mapper: &'a Mapper,
    grid: TileGrid,
    rescue_last: bool,
}

impl<'a> TileSplitter<'a> {
    /// Create a splitter for a source tiled by `grid`.
    pub fn new(mapper: &'a Mapper, grid: TileGrid) -> Self {
        let rescue_last = !mapper.footprint().is_point();
        Self {
            mapper,
            grid,
            rescue_last,
        }
    }

    /// Decompose `dest` into work items covering each of its pixels once.
    pub fn split(&self, dest: &Rect) -> Vec<WorkItem> {
        if dest.is_empty() {
            return Vec::new();
        }

        let grid = self.grid;
        let xs = self.split_axis(self.mapper.x(), dest.x, dest.right(), |lo, hi| {
            grid.boundaries_x(lo, hi)
        });
        let ys = self.split_axis(self.mapper.y(), dest.y, dest.bottom(), |lo, hi| {
            grid.boundaries_y(lo, hi)
        });

        let mut items = Vec::with_capacity(xs.len() * ys.len());
        for &(y0, y1) in &ys {
            for &(x0, x1) in &xs {
                let dst = Rect::from_edges(x0, y0, x1, y1);
                items.push(WorkItem {
                    src: self.mapper.backward_map(&dst),
                    dst,
                });
            }
        }
        items
    }

    fn split_axis<F>(&self, axis: &AxisMapping, d0: i64, d1: i64, boundaries: F) -> Vec<(i64, i64)>
    where
        F: Fn(i64, i64) -> Vec<i64>,
    {
        let (lo, hi) = axis.backward_interval(d0, d1);
        let (before, after) = (axis.before(), axis.after());

        let mut splits = vec![lo];
        for b in boundaries(lo, hi) {
            splits.push(b - after);
            splits.push(b + before);
        }
        splits.push(hi);
        for s in splits.iter_mut() {
            *s = (*s).clamp(lo, hi);
        }
        splits.sort_unstable();
        splits.dedup();

        let segments = splits.len().saturating_sub(1);
        let mut candidates = Vec::with_capacity(segments);
        for (i, pair) in splits.windows(2).enumerate() {
            let (a, e) = (pair[0], pair[1]);
            let last = i + 1 == segments;

            let (mut f0, mut f1) = if last && self.rescue_last {
                axis.forward_interval(a, e + after + 1)
            } else {
                axis.forward_interval(a, e)
            };

            if e - a <= axis.kernel_width() || f1 <= f0 {
                let size = 2 * (before + after + 1);
                let start = a + (e - a) / 2 - size / 2;
                let (r0, r1) = axis.forward_interval(start, start + size);
                let (k0, k1) = axis.key_interval(a, e);
                f0 = r0.max(k0);
                f1 = r1.min(k1);
            }

            let (f0, f1) = (f0.max(d0), f1.min(d1));
            if f0 < f1 {
                candidates.push((f0, f1));
            }
        }

        partition(candidates, d0, d1)
    }
}

/// Turn candidate intervals into an exact partition of `[d0, d1)`.
///
/// Overlaps are trimmed to the previous end; gaps are absorbed by the
/// interval that follows them, a trailing gap by the last interval.
fn partition(mut candidates: Vec<(i64, i64)>, d0: i64, d1: i64) -> Vec<(i64, i64)> {
    if d1 <= d0 {
        return Vec::new();
    }
    candidates.sort_unstable();

    let mut parts: Vec<(i64, i64)> = Vec::with_capacity(candidates.len());
    let mut cursor = d0;
    for (_, end) in candidates {
        let end = end.min(d1);
        if end <= cursor {
            continue;
        }
        parts.push((cursor, end));
        cursor = end;
    }

    if cursor < d1 {
        match parts.last_mut() {
            Some(last) => last.1 = d1,
            None => parts.push((d0, d1)),
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::interp::Interpolation;
    use crate::scale::params::ScaleParams;
    use proptest::prelude::*;

    fn assert_partition(items: &[WorkItem], dest: &Rect) {
        let mut hits = vec![0u32; dest.area() as usize];
        for item in items {
            assert!(dest.contains_rect(&item.dst), "{} escapes {}", item.dst, dest);
            for y in item.dst.y..item.dst.bottom() {
                for x in item.dst.x..item.dst.right() {
                    hits[dest.offset_of(x, y)] += 1;
                }
            }
        }
        assert!(hits.iter().all(|&h| h == 1), "pixels not covered exactly once");
    }

    #[test]
    fn test_partition_trims_and_fills() {
        assert_eq!(partition(vec![(2, 5), (4, 8), (9, 10)], 0, 12), vec![(0, 5), (5, 8), (8, 12)]);
        assert_eq!(partition(vec![], 3, 6), vec![(3, 6)]);
        assert_eq!(partition(vec![(0, 4), (1, 3)], 0, 4), vec![(0, 4)]);
        assert!(partition(vec![(0, 1)], 5, 5).is_empty());
    }

    #[test]
    fn test_split_follows_source_tiles() {
        let params = ScaleParams::identity();
        let interp = Interpolation::nearest();
        let mapper = Mapper::new(&params, &interp);
        let splitter = TileSplitter::new(&mapper, TileGrid::new(0, 0, 8, 8));

        let dest = Rect::new(0, 0, 16, 8);
        let items = splitter.split(&dest);
        assert_partition(&items, &dest);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].dst, Rect::new(0, 0, 8, 8));
        assert_eq!(items[1].src, Rect::new(8, 0, 8, 8));
    }

    #[test]
    fn test_split_narrow_segments_still_cover() {
        // Source tiles of width 1 make every segment narrower than the kernel.
        let params = ScaleParams::new(3.0, 3.0, 0.0, 0.0).unwrap();
        let interp = Interpolation::bicubic();
        let mapper = Mapper::new(&params, &interp);
        let splitter = TileSplitter::new(&mapper, TileGrid::new(0, 0, 1, 1));

        let dest = Rect::new(5, 5, 20, 13);
        let items = splitter.split(&dest);
        assert_partition(&items, &dest);
        for item in &items {
            assert_eq!(item.src, mapper.backward_map(&item.dst));
        }
    }

    #[test]
    fn test_split_empty() {
        let params = ScaleParams::identity();
        let interp = Interpolation::bilinear();
        let mapper = Mapper::new(&params, &interp);
        let splitter = TileSplitter::new(&mapper, TileGrid::new(0, 0, 4, 4));
        assert!(splitter.split(&Rect::new(2, 2, 0, 5)).is_empty());
    }

    proptest! {
        #[test]
        fn prop_split_is_partition(
            dx in -30i64..30, dy in -30i64..30,
            w in 1i64..40, h in 1i64..40,
            num in 1i64..32, den in 1i64..32,
            tile in 1i64..12,
            kind in 0usize..3,
        ) {
            let interp = [Interpolation::nearest(), Interpolation::bilinear(), Interpolation::bicubic()][kind].clone();
            let sx = num as f64 / den as f64;
            let params = ScaleParams::new(sx, 1.0 / sx, 0.5, -1.25).unwrap();
            let mapper = Mapper::new(&params, &interp);
            let splitter = TileSplitter::new(&mapper, TileGrid::new(-3, 2, tile, tile + 1));
            let dest = Rect::new(dx, dy, w, h);
            let items = splitter.split(&dest);
            assert_partition(&items, &dest);
        }
    }
}
