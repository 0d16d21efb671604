//! Tile scheduling.
//!
//! The engine computes every tile of a tiled operator and assembles them into
//! one raster. Tiles are independent, so they run on rayon when parallel
//! execution is enabled; the output is the same either way.

use crate::core::error::{ScaleError, ScaleResult};
use crate::core::geometry::{Rect, TileGrid};
use crate::core::types::Raster;
use crate::execution::progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
use log::debug;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An operator whose output is computed tile by tile.
pub trait TiledOperator: Send + Sync {
    /// Output image bounds.
    fn bounds(&self) -> Rect;

    /// Output tile layout.
    fn tile_grid(&self) -> TileGrid;

    /// Compute one output tile, clipped to the bounds.
    fn compute_tile(&self, tile_x: i64, tile_y: i64) -> ScaleResult<Raster>;

    /// Raster covering `rect` that tiles are pasted into.
    fn blank(&self, rect: Rect) -> Raster;
}

/// How tiles are scheduled.
#[derive(Clone)]
pub struct ExecutionOptions {
    /// Run tiles on rayon instead of the calling thread.
    pub parallel: bool,
    /// Size of a dedicated pool; 0 uses the global rayon pool.
    pub max_threads: usize,
    /// Receives tile events.
    pub progress_callback: Option<Arc<ProgressCallback>>,
}

impl std::fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("parallel", &self.parallel)
            .field("max_threads", &self.max_threads)
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_threads: 0,
            progress_callback: None,
        }
    }
}

impl ExecutionOptions {
    /// Parallel on the global pool, no callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle parallel tiles.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Use a dedicated pool of `max` threads.
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = max;
        self
    }

    /// Report tile events to `callback`.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }
}

/// An assembled image and how it was computed.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Every tile pasted into the operator bounds.
    pub image: Raster,
    /// Timing and thread count.
    pub stats: ExecutionStats,
}

/// Timing of one image computation.
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    /// Wall time from first to last tile.
    pub total_duration: Duration,
    /// Tiles that finished.
    pub tiles_computed: usize,
    /// Worker threads used.
    pub threads: usize,
}

/// Runs a [`TiledOperator`] over its whole tile grid.
#[derive(Debug, Clone, Default)]
pub struct TileEngine {
    options: ExecutionOptions,
}

impl TileEngine {
    /// Engine scheduling tiles per `options`.
    pub fn new(options: ExecutionOptions) -> Self {
        Self { options }
    }

    /// Compute every tile of `op` and assemble the output image.
    pub fn execute(&self, op: &dyn TiledOperator) -> ScaleResult<ExecutionResult> {
        let start_time = Instant::now();
        let bounds = op.bounds();
        let tiles: Vec<_> = op.tile_grid().tiles(bounds).map(|t| (t.tile_x, t.tile_y)).collect();

        let mut tracker = ProgressTracker::new(tiles.len());
        if let Some(callback) = &self.options.progress_callback {
            let callback = callback.clone();
            tracker = tracker.with_callback(Box::new(move |update| callback(update)));
        }
        tracker.start();

        let output = Mutex::new(op.blank(bounds));
        let run_tile = |&(tile_x, tile_y): &(i64, i64)| -> ScaleResult<()> {
            let tile_start = Instant::now();
            let tile = op.compute_tile(tile_x, tile_y).map_err(|error| {
                tracker.report_error(Some((tile_x, tile_y)), error.to_string());
                error
            })?;
            output.lock().paste(&tile);
            tracker.tile_completed(tile_x, tile_y, tile_start.elapsed().as_millis() as u64);
            Ok(())
        };

        let threads = if self.options.parallel {
            if self.options.max_threads > 0 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.options.max_threads)
                    .build()
                    .map_err(|e| ScaleError::ThreadPool(e.to_string()))?;
                pool.install(|| tiles.par_iter().try_for_each(run_tile))?;
                self.options.max_threads
            } else {
                tiles.par_iter().try_for_each(run_tile)?;
                rayon::current_num_threads()
            }
        } else {
            tiles.iter().try_for_each(run_tile)?;
            1
        };

        tracker.complete();
        let stats = ExecutionStats {
            total_duration: start_time.elapsed(),
            tiles_computed: tracker.completed(),
            threads,
        };
        debug!(
            "computed {} tiles of {} on {} threads in {:?}",
            stats.tiles_computed, bounds, stats.threads, stats.total_duration
        );

        Ok(ExecutionResult {
            image: output.into_inner(),
            stats,
        })
    }
}
