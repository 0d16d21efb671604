//! Tiled image sources.
//!
//! The resampling engine never owns pixels; it reads rectangles from an
//! [`ImageSource`] and is told how the source is tiled so work can be split
//! along source tile boundaries.

use crate::core::error::{ScaleError, ScaleResult};
use crate::core::geometry::{Rect, TileGrid};
use crate::core::types::{Raster, SampleType};
use std::sync::Arc;

/// Trait for tiled image sources.
pub trait ImageSource: Send + Sync {
    /// Pixel bounds of the image.
    fn bounds(&self) -> Rect;

    /// Tile layout of the image.
    fn tile_grid(&self) -> TileGrid;

    /// Number of bands per pixel.
    fn bands(&self) -> usize;

    /// Storage type of the samples.
    fn sample_type(&self) -> SampleType;

    /// Read a region of the image.
    ///
    /// The region must lie within [`ImageSource::bounds`]; use a border mode
    /// to read beyond the edges.
    fn read_region(&self, region: Rect) -> ScaleResult<Raster>;
}

/// In-memory image source.
#[derive(Debug, Clone)]
pub struct MemoryImage {
    raster: Arc<Raster>,
    grid: TileGrid,
}

impl MemoryImage {
    /// Wrap a raster, tiled from its top-left corner.
    pub fn new(raster: Raster, tile_width: i64, tile_height: i64) -> Self {
        let rect = raster.rect();
        Self {
            raster: Arc::new(raster),
            grid: TileGrid::new(rect.x, rect.y, tile_width, tile_height),
        }
    }
}

impl ImageSource for MemoryImage {
    fn bounds(&self) -> Rect {
        self.raster.rect()
    }

    fn tile_grid(&self) -> TileGrid {
        self.grid
    }

    fn bands(&self) -> usize {
        self.raster.bands()
    }

    fn sample_type(&self) -> SampleType {
        self.raster.sample_type()
    }

    fn read_region(&self, region: Rect) -> ScaleResult<Raster> {
        let bounds = self.bounds();
        if !bounds.contains_rect(&region) {
            return Err(ScaleError::RegionOutOfBounds {
                requested: region,
                bounds,
            });
        }
        Ok(self.raster.crop(region))
    }
}
