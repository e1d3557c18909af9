//! Mode sequencing.
//!
//! ```text
//! Work ──(cycles % 3 != 0)──> ShortBreak ──> Work
//!   └──(cycles % 3 == 0)──> LongBreak  ──> Work
//! ```
//!
//! There is no terminal state. The cycle count used for the Work decision
//! is the count *after* the Work interval that just finished.

use crate::config::Config;

use super::mode::Mode;

/// Every n-th completed Work interval is followed by a long break.
pub const LONG_BREAK_EVERY: u64 = 3;

/// What should follow a completed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next_mode: Mode,
    pub duration_secs: u64,
}

pub struct ModeSequencer;

impl ModeSequencer {
    /// Pure transition function.
    pub fn next(current: Mode, cycles_completed_after: u64) -> Mode {
        match current {
            Mode::Work if cycles_completed_after % LONG_BREAK_EVERY == 0 => Mode::LongBreak,
            Mode::Work => Mode::ShortBreak,
            Mode::ShortBreak | Mode::LongBreak => Mode::Work,
        }
    }

    /// Handle the completion of a `current` interval.
    ///
    /// A finished Work interval bumps the cycle counter exactly once per
    /// call, whether or not auto-sequence is on. Returns `None` when
    /// auto-sequence is off: the caller leaves the clock where it is.
    pub fn on_completion(current: Mode, config: &mut Config) -> Option<Transition> {
        if current == Mode::Work {
            config.increment_cycles_completed();
        }
        if !config.auto_sequence() {
            return None;
        }
        let next_mode = Self::next(current, config.cycles_completed());
        Some(Transition {
            next_mode,
            duration_secs: config.duration_secs(next_mode),
        })
    }

    /// The modes that would follow `from`, given `cycles_completed` so far.
    pub fn preview(from: Mode, cycles_completed: u64) -> impl Iterator<Item = Mode> {
        let mut state = (from, cycles_completed);
        std::iter::from_fn(move || {
            let (mode, cycles) = state;
            let cycles = if mode == Mode::Work { cycles + 1 } else { cycles };
            let next = Self::next(mode, cycles);
            state = (next, cycles);
            Some(next)
        })
    }
}
