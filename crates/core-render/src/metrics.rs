//! Render path counters.
//!
//! Records what the engine actually emitted, separate from anything the host
//! asked for. Atomics so a snapshot can be logged from anywhere without
//! borrowing the engine mutably.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderPathMetrics {
    /// Frames emitted in full (first frame, resize, explicit invalidation).
    pub full_frames: AtomicU64,
    /// Frames where only changed rows were emitted.
    pub partial_frames: AtomicU64,
    /// Frames identical to the previous one; nothing emitted.
    pub skipped_frames: AtomicU64,
    /// Explicit invalidations (resize).
    pub invalidations: AtomicU64,
    pub rows_repainted: AtomicU64,
    /// Rows left untouched by partial frames.
    pub rows_skipped: AtomicU64,
    /// Terminal Print commands after run batching.
    pub print_commands: AtomicU64,
    /// Leader cells printed.
    pub cells_printed: AtomicU64,
    /// Duration (ns) of the most recent emitted frame.
    pub last_render_ns: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPathMetricsSnapshot {
    pub full_frames: u64,
    pub partial_frames: u64,
    pub skipped_frames: u64,
    pub invalidations: u64,
    pub rows_repainted: u64,
    pub rows_skipped: u64,
    pub print_commands: u64,
    pub cells_printed: u64,
    pub last_render_ns: u64,
}

impl RenderPathMetrics {
    pub fn snapshot(&self) -> RenderPathMetricsSnapshot {
        RenderPathMetricsSnapshot {
            full_frames: self.full_frames.load(Ordering::Relaxed),
            partial_frames: self.partial_frames.load(Ordering::Relaxed),
            skipped_frames: self.skipped_frames.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            rows_repainted: self.rows_repainted.load(Ordering::Relaxed),
            rows_skipped: self.rows_skipped.load(Ordering::Relaxed),
            print_commands: self.print_commands.load(Ordering::Relaxed),
            cells_printed: self.cells_printed.load(Ordering::Relaxed),
            last_render_ns: self.last_render_ns.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}
