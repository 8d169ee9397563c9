//! Frame pacing.
//!
//! A `Sync` command that arrives sooner than the minimum frame interval
//! after the last flushed frame is dropped outright: no flush, no wait. The
//! dirty tiles stay dirty and go out with the next sync that is on time.
//!
//! Time spent executing non-sync commands is accumulated so each flushed
//! frame can report how busy the renderer was.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Timing of the most recent flushed frame, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStats {
    /// Time from the previous flushed frame's start to the end of this one.
    pub last_frame_us: u64,
    /// Command execution time since the previous flush plus this flush.
    pub last_busy_us: u64,
}

/// Outcome of a sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameDecision {
    /// Too early; drop this sync.
    Skip,
    /// Flush now. `frame_start` is the time the sync was accepted.
    Flush {
        /// Sync acceptance time.
        frame_start: u64,
    },
}

/// Frame interval state machine.
#[derive(Debug, Clone)]
pub struct FramePacer {
    min_interval_us: u64,
    last_sync_us: Option<u64>,
    busy_us: u64,
    stats: FrameStats,
    frames_flushed: u32,
    frames_skipped: u32,
}

impl FramePacer {
    /// A pacer that flushes at most once per `min_interval_us`.
    pub fn new(min_interval_us: u64) -> Self {
        Self {
            min_interval_us,
            last_sync_us: None,
            busy_us: 0,
            stats: FrameStats {
                last_frame_us: min_interval_us,
                last_busy_us: 0,
            },
            frames_flushed: 0,
            frames_skipped: 0,
        }
    }

    /// Add time spent on one non-sync command.
    pub fn record_busy(&mut self, us: u64) {
        self.busy_us = self.busy_us.saturating_add(us);
    }

    /// Decide whether a sync at `now` flushes.
    ///
    /// The very first sync is treated as if the previous frame ended exactly
    /// one interval ago, so it always flushes.
    pub fn begin_sync(&mut self, now: u64) -> FrameDecision {
        let last = *self
            .last_sync_us
            .get_or_insert(now.wrapping_sub(self.min_interval_us));
        if now.wrapping_sub(last) < self.min_interval_us {
            self.frames_skipped = self.frames_skipped.wrapping_add(1);
            return FrameDecision::Skip;
        }
        FrameDecision::Flush { frame_start: now }
    }

    /// Close a flushed frame that started at `frame_start` and ended at `frame_end`.
    pub fn finish_frame(&mut self, frame_start: u64, frame_end: u64) -> FrameStats {
        let last = self.last_sync_us.unwrap_or(frame_start);
        self.stats = FrameStats {
            last_frame_us: frame_end.wrapping_sub(last),
            last_busy_us: self
                .busy_us
                .saturating_add(frame_end.saturating_sub(frame_start)),
        };
        self.last_sync_us = Some(frame_start);
        self.busy_us = 0;
        self.frames_flushed = self.frames_flushed.wrapping_add(1);
        self.stats
    }

    /// Timing of the most recent flushed frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Minimum time between flushed frames.
    pub fn min_interval_us(&self) -> u64 {
        self.min_interval_us
    }

    /// Busy time accumulated since the last flush.
    pub fn pending_busy_us(&self) -> u64 {
        self.busy_us
    }

    /// Frames flushed so far.
    pub fn frames_flushed(&self) -> u32 {
        self.frames_flushed
    }

    /// Syncs dropped for arriving early.
    pub fn frames_skipped(&self) -> u32 {
        self.frames_skipped
    }
}

/// Frame statistics published by the renderer for the producer to read.
pub struct Telemetry {
    stats: Mutex<CriticalSectionRawMutex, Cell<FrameStats>>,
}

impl Telemetry {
    /// Zeroed statistics.
    pub const fn new() -> Self {
        Self {
            stats: Mutex::new(Cell::new(FrameStats {
                last_frame_us: 0,
                last_busy_us: 0,
            })),
        }
    }

    /// Replace the published statistics.
    pub fn publish(&self, stats: FrameStats) {
        self.stats.lock(|cell| cell.set(stats));
    }

    /// Latest published statistics.
    pub fn load(&self) -> FrameStats {
        self.stats.lock(Cell::get)
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}
