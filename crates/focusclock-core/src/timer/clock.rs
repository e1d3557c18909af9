//! Wall-clock anchored countdown for a single interval.
//!
//! The clock never stores "time left". It stores when the current run
//! segment began (the anchor) plus the time banked by earlier segments of
//! the same interval, and derives the remaining time from `now` on every
//! read:
//!
//! ```text
//! remaining = max(0, total - (banked + (now - anchor)))
//! ```
//!
//! A caller that polls late, irregularly, or after the host was suspended
//! gets the same answer as one that polled every 100ms.

use chrono::{DateTime, Utc};

use super::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    mode: Mode,
    total_ms: u64,
    /// Start of the current run segment. `Some` iff the clock is running.
    anchor: Option<DateTime<Utc>>,
    /// Elapsed time from earlier run segments of this interval.
    banked_ms: u64,
}

impl SessionClock {
    /// A stopped clock for `mode` with the full `duration_secs` remaining.
    pub fn new(mode: Mode, duration_secs: u64) -> Self {
        Self {
            mode,
            total_ms: duration_secs.saturating_mul(1000),
            anchor: None,
            banked_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<DateTime<Utc>> {
        self.anchor
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_ms / 1000
    }

    pub fn banked_elapsed_ms(&self) -> u64 {
        self.banked_ms
    }

    /// Total elapsed time of this interval as of `now`.
    ///
    /// A `now` earlier than the anchor (wall clock stepped backwards)
    /// counts as zero for the current segment.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        let segment = self
            .anchor
            .map(|anchor| (now - anchor).num_milliseconds().max(0) as u64)
            .unwrap_or(0);
        self.banked_ms.saturating_add(segment)
    }

    pub fn remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        self.total_ms.saturating_sub(self.elapsed_ms(now))
    }

    /// Whole seconds left, rounded up so a fresh 25 minute interval reads
    /// 25:00 and zero is only reported once the interval has fully elapsed.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.remaining_ms(now).div_ceil(1000)
    }

    pub fn is_complete(&self, now: DateTime<Utc>) -> bool {
        self.remaining_ms(now) == 0
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Point the clock at a new interval: stopped, nothing banked.
    pub fn configure(&mut self, mode: Mode, duration_secs: u64) {
        tracing::debug!(mode = mode.id(), duration_secs, "clock configured");
        *self = Self::new(mode, duration_secs);
    }

    /// Begin a run segment at `now`.
    ///
    /// Returns `false` without changing anything if the clock is already
    /// running or the interval has already elapsed.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_running() || self.is_complete(now) {
            return false;
        }
        self.anchor = Some(now);
        tracing::debug!(mode = self.mode.id(), banked_ms = self.banked_ms, "clock started");
        true
    }

    /// End the current run segment, banking its elapsed time.
    ///
    /// Returns `false` if the clock was not running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.banked_ms = self.elapsed_ms(now).min(self.total_ms);
        self.anchor = None;
        tracing::debug!(mode = self.mode.id(), banked_ms = self.banked_ms, "clock paused");
        true
    }

    /// Rewind to the full duration of the current interval and stop.
    pub fn reset(&mut self) {
        let (mode, secs) = (self.mode, self.total_seconds());
        self.configure(mode, secs);
    }
}
