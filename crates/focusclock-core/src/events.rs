//! Engine events.
//!
//! Serialized with an internal `type` tag so hosts can forward them as
//! JSON lines without a wrapper.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Every state change made by the engine produces an Event.
/// Hosts print or forward them; the engine never reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The clock was pointed at a different (or the same) mode by the user.
    ModeChanged {
        from: Mode,
        to: Mode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStarted {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// An interval ran out. `next_mode` is `None` when auto-sequence is off.
    IntervalCompleted {
        mode: Mode,
        cycles_completed: u64,
        next_mode: Option<Mode>,
        auto_start_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    /// The deferred start scheduled by a completion fired.
    /// `at` is the instant the new interval is anchored to.
    AutoStarted {
        mode: Mode,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        /// Whether the idle clock was re-pointed at a new duration.
        reconfigured: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::ModeChanged { at, .. }
            | Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at, .. }
            | Event::IntervalCompleted { at, .. }
            | Event::AutoStarted { at, .. }
            | Event::SettingsUpdated { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn events_are_tagged_by_type() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        let event = Event::AutoStarted {
            mode: Mode::Work,
            at: epoch,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AutoStarted");
        assert_eq!(json["mode"], "pomodoro");
        assert_eq!(event.at(), epoch);
    }
}
