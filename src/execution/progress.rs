//! Tile progress reporting.
//!
//! Workers report finished tiles from any thread; the tracker keeps running
//! totals in atomics and forwards every event to an optional callback.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// An event emitted while an image is computed.
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    /// Tile computation is about to begin.
    Started {
        /// Tiles that will be computed.
        total_tiles: usize,
    },
    /// One tile is done.
    TileCompleted {
        /// Tile column.
        tile_x: i64,
        /// Tile row.
        tile_y: i64,
        /// Compute time of this tile.
        duration_ms: u64,
        /// Finished tiles so far, starting at 1.
        index: usize,
        /// Tiles in the run.
        total: usize,
    },
    /// Share of finished tiles, sent after every tile.
    Progress {
        /// Finished share, 0 to 100.
        percent: f32,
        /// Wall time since the start event.
        elapsed_ms: u64,
        /// See [`ProgressTracker::estimated_remaining_ms`].
        estimated_remaining_ms: Option<u64>,
    },
    /// All tiles are done.
    Completed {
        /// Wall time since the start event.
        total_duration_ms: u64,
        /// Tiles finished.
        tiles_computed: usize,
    },
    /// A tile failed; computation stops.
    Error {
        /// Failing tile, when known.
        tile: Option<(i64, i64)>,
        /// Error text.
        message: String,
    },
}

/// Receiver of progress events. Called from worker threads.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Counts finished tiles and their compute time.
pub struct ProgressTracker {
    total: usize,
    done: AtomicUsize,
    busy_ms: AtomicU64,
    started: Option<Instant>,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    /// Tracker for `total` tiles.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
            busy_ms: AtomicU64::new(0),
            started: None,
            callback: None,
        }
    }

    /// Forward events to `callback`.
    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Start the clock.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.emit(ProgressUpdate::Started {
            total_tiles: self.total,
        });
    }

    /// Record a finished tile that took `duration_ms` to compute.
    pub fn tile_completed(&self, tile_x: i64, tile_y: i64, duration_ms: u64) {
        self.busy_ms.fetch_add(duration_ms, Ordering::Relaxed);
        let index = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.callback.is_none() {
            return;
        }

        self.emit(ProgressUpdate::TileCompleted {
            tile_x,
            tile_y,
            duration_ms,
            index,
            total: self.total,
        });
        self.emit(ProgressUpdate::Progress {
            percent: self.progress_percent(),
            elapsed_ms: self.elapsed_ms(),
            estimated_remaining_ms: self.estimated_remaining_ms(),
        });
    }

    /// Report a failed tile.
    pub fn report_error(&self, tile: Option<(i64, i64)>, message: String) {
        self.emit(ProgressUpdate::Error { tile, message });
    }

    /// Send the completion event.
    pub fn complete(&self) {
        self.emit(ProgressUpdate::Completed {
            total_duration_ms: self.elapsed_ms(),
            tiles_computed: self.completed(),
        });
    }

    /// Tiles finished so far.
    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Finished share in percent; 100 when there is nothing to do.
    pub fn progress_percent(&self) -> f32 {
        match self.total {
            0 => 100.0,
            total => self.completed() as f32 * 100.0 / total as f32,
        }
    }

    /// Compute time still needed at the average tile cost so far, summed
    /// over the remaining tiles (not divided by the thread count).
    pub fn estimated_remaining_ms(&self) -> Option<u64> {
        let done = self.completed() as u64;
        if done == 0 {
            return None;
        }
        let average = self.busy_ms.load(Ordering::Relaxed) / done;
        let left = self.total.saturating_sub(done as usize) as u64;
        Some(average * left)
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.map_or(0, |t| t.elapsed().as_millis() as u64)
    }

    fn emit(&self, update: ProgressUpdate) {
        if let Some(callback) = &self.callback {
            callback(update);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(0)
    }
}
