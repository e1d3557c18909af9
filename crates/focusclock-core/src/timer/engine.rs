//! Engine facade.
//!
//! [`FocusEngine`] owns the settings and the session clock. It is the only
//! surface a host drives (mode changes, start/pause, reset, settings) and
//! the only place that calls the alert and notification collaborators.
//! It does not use internal threads: the host calls [`FocusEngine::tick`]
//! periodically (every 100ms is plenty) with the current wall-clock time.
//!
//! ## Completion
//!
//! ```text
//! tick(now) ── clock complete? ──> alert + notify (once)
//!                                 ──> sequencer: next mode, cycle += 1 for Work
//!                                 ──> clock configured for next mode (not expired)
//!                                 ──> auto-start scheduled at expiry + 1s
//! ```
//!
//! Re-pointing the clock at a fresh interval inside the same call is what
//! keeps later ticks from seeing the same completion again.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = FocusEngine::new(Config::default());
//! engine.toggle_running(Utc::now());
//! // In a loop:
//! for event in engine.tick(Utc::now()) { /* render */ }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::clock::SessionClock;
use super::mode::Mode;
use super::sequencer::ModeSequencer;
use crate::config::{Config, SettingsUpdate};
use crate::effects::{
    AlertPlayer, AlertRequest, NoopAlert, NoopNotifier, NotificationRequest, Notifier,
};
use crate::events::Event;

/// Pause between a completion and the automatic start of the next interval.
pub const AUTO_START_DELAY_MS: i64 = 1000;

/// A deferred start, valid only while the engine generation is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingAutoStart {
    due_at: DateTime<Utc>,
    generation: u64,
}

/// Read-only view of the engine for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub is_running: bool,
    pub cycles_completed: u64,
    pub auto_start_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// `MM:SS`.
    pub fn display(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_seconds as f64 / self.total_seconds as f64)
    }
}

/// Core timer engine.
pub struct FocusEngine {
    config: Config,
    clock: SessionClock,
    pending: Option<PendingAutoStart>,
    /// Bumped by every manual action; a pending auto-start from an older
    /// generation is stale and never fires.
    generation: u64,
    alert: Box<dyn AlertPlayer>,
    notifier: Box<dyn Notifier>,
}

impl std::fmt::Debug for FocusEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusEngine")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("pending", &self.pending)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl FocusEngine {
    /// Create an engine with no-op collaborators.
    ///
    /// Starts stopped in Work mode at the configured Work duration.
    pub fn new(config: Config) -> Self {
        Self::with_collaborators(config, Box::new(NoopAlert), Box::new(NoopNotifier))
    }

    pub fn with_collaborators(
        config: Config,
        alert: Box<dyn AlertPlayer>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let clock = SessionClock::new(Mode::Work, config.duration_secs(Mode::Work));
        Self {
            config,
            clock,
            pending: None,
            generation: 0,
            alert,
            notifier,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn mode(&self) -> Mode {
        self.clock.mode()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// When the scheduled auto-start will fire, if one is pending.
    pub fn auto_start_at(&self) -> Option<DateTime<Utc>> {
        self.pending
            .filter(|p| p.generation == self.generation)
            .map(|p| p.due_at)
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.clock.remaining_seconds(now)
    }

    /// Fresh snapshot as of `now`. Never cached.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        Snapshot {
            mode: self.clock.mode(),
            remaining_seconds: self.clock.remaining_seconds(now),
            total_seconds: self.clock.total_seconds(),
            is_running: self.clock.is_running(),
            cycles_completed: self.config.cycles_completed(),
            auto_start_at: self.auto_start_at(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Stop the clock and point it at `mode` with its full duration.
    /// Does not start it.
    pub fn set_mode(&mut self, mode: Mode, now: DateTime<Utc>) -> Event {
        self.cancel_auto_start();
        let from = self.clock.mode();
        let duration_secs = self.config.duration_secs(mode);
        self.clock.configure(mode, duration_secs);
        Event::ModeChanged {
            from,
            to: mode,
            duration_secs,
            at: now,
        }
    }

    /// Start the clock if stopped, pause it if running.
    ///
    /// Resuming continues from the banked elapsed time. Starting an
    /// interval that has already run out does nothing; change mode or
    /// reset first.
    pub fn toggle_running(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.clock.is_running() {
            self.pause(now)
        } else {
            self.start(now)
        }
    }

    /// Start (or resume) the clock. Supersedes any pending auto-start.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.clock.is_running() {
            return None;
        }
        self.cancel_auto_start();
        if !self.clock.start(now) {
            return None;
        }
        Some(Event::TimerStarted {
            mode: self.clock.mode(),
            remaining_secs: self.clock.remaining_seconds(now),
            at: now,
        })
    }

    /// Pause the clock. Also cancels a pending auto-start, which is the
    /// only effect when the clock is already stopped.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.cancel_auto_start();
        if !self.clock.pause(now) {
            return None;
        }
        Some(Event::TimerPaused {
            mode: self.clock.mode(),
            remaining_secs: self.clock.remaining_seconds(now),
            at: now,
        })
    }

    /// Rewind the current interval to its full duration and stop.
    pub fn reset_current_interval(&mut self, now: DateTime<Utc>) -> Event {
        self.cancel_auto_start();
        self.clock.reset();
        Event::TimerReset {
            mode: self.clock.mode(),
            duration_secs: self.clock.total_seconds(),
            at: now,
        }
    }

    /// Apply a partial settings change.
    ///
    /// If the current mode's duration changed and the clock is not
    /// running, the clock is re-pointed at the new duration right away.
    /// A running interval keeps its length.
    pub fn update_settings(&mut self, update: &SettingsUpdate, now: DateTime<Utc>) -> Event {
        let before = self.config.duration_secs(self.clock.mode());
        self.config.apply_update(update);
        self.after_settings_change(before, now)
    }

    /// Restore default settings, including the cycle counter.
    pub fn reset_settings(&mut self, now: DateTime<Utc>) -> Event {
        let before = self.config.duration_secs(self.clock.mode());
        self.config.reset();
        self.cancel_auto_start();
        self.after_settings_change(before, now)
    }

    /// Poll entry point.
    ///
    /// Fires a due auto-start, then checks for a completion edge. At most
    /// one completion is processed per call, so after a long suspend with
    /// auto-sequence on the engine catches up over several ticks, and each
    /// of those ticks requests its own alert and notification.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(event) = self.fire_due_auto_start(now) {
            events.push(event);
        }

        if self.clock.is_running() && self.clock.is_complete(now) {
            events.push(self.complete_interval(now));
        }

        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cancel_auto_start(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(pending) = self.pending.take() {
            tracing::info!(mode = self.clock.mode().id(), due_at = %pending.due_at, "auto-start cancelled");
        }
    }

    fn after_settings_change(&mut self, before_secs: u64, now: DateTime<Utc>) -> Event {
        let mode = self.clock.mode();
        let after_secs = self.config.duration_secs(mode);
        let reconfigured = before_secs != after_secs && !self.clock.is_running();
        if reconfigured {
            self.cancel_auto_start();
            self.clock.configure(mode, after_secs);
        }
        if !self.config.auto_sequence() && self.pending.is_some() {
            self.cancel_auto_start();
        }
        Event::SettingsUpdated { reconfigured, at: now }
    }

    fn fire_due_auto_start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let pending = self.pending?;
        if now < pending.due_at {
            return None;
        }
        self.pending = None;
        if pending.generation != self.generation {
            return None;
        }
        // Anchor at the due instant so a late poll does not stretch the interval.
        if !self.clock.start(pending.due_at) {
            return None;
        }
        tracing::info!(mode = self.clock.mode().id(), at = %pending.due_at, "auto-started");
        Some(Event::AutoStarted {
            mode: self.clock.mode(),
            at: pending.due_at,
        })
    }

    fn complete_interval(&mut self, now: DateTime<Utc>) -> Event {
        let completed = self.clock.mode();
        let expired_at = self.expiry_instant(now);
        self.clock.pause(now);
        tracing::info!(mode = completed.id(), at = %expired_at, "interval completed");

        self.request_side_effects(completed);

        let transition = ModeSequencer::on_completion(completed, &mut self.config);
        let auto_start_at = transition.map(|t| {
            self.cancel_auto_start();
            self.clock.configure(t.next_mode, t.duration_secs);
            let due_at = expired_at + Duration::milliseconds(AUTO_START_DELAY_MS);
            self.pending = Some(PendingAutoStart {
                due_at,
                generation: self.generation,
            });
            tracing::info!(from = completed.id(), to = t.next_mode.id(), %due_at, "next interval scheduled");
            due_at
        });

        Event::IntervalCompleted {
            mode: completed,
            cycles_completed: self.config.cycles_completed(),
            next_mode: transition.map(|t| t.next_mode),
            auto_start_at,
            at: expired_at,
        }
    }

    /// The instant the running interval actually ran out, which may be
    /// well before `now` if the host polled late.
    fn expiry_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.clock.anchor() {
            Some(anchor) => {
                let left_at_anchor = (self.clock.total_seconds() * 1000)
                    .saturating_sub(self.clock.banked_elapsed_ms());
                (anchor + Duration::milliseconds(left_at_anchor as i64)).min(now)
            }
            None => now,
        }
    }

    fn request_side_effects(&self, completed: Mode) {
        if self.config.play_sound_on_finish() && self.config.alert_volume() > 0 {
            let request = AlertRequest {
                sound: self.config.alert_sound(),
                volume: self.config.alert_volume(),
            };
            if let Err(e) = self.alert.play(&request) {
                tracing::warn!(error = %e, sound = request.sound.id(), "alert playback failed");
            }
        }
        if self.config.show_completion_notification() {
            let request = NotificationRequest::for_completed(completed);
            if let Err(e) = self.notifier.notify(&request) {
                tracing::warn!(error = %e, "completion notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<String>>>);

    impl Calls {
        fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    impl AlertPlayer for Calls {
        fn play(&self, request: &AlertRequest) -> Result<(), CollaboratorError> {
            self.0.lock().unwrap().push(format!("alert:{}", request.volume));
            Ok(())
        }
    }

    impl Notifier for Calls {
        fn notify(&self, request: &NotificationRequest) -> Result<(), CollaboratorError> {
            self.0.lock().unwrap().push(request.body.clone());
            Ok(())
        }
    }

    struct Failing;

    impl AlertPlayer for Failing {
        fn play(&self, _request: &AlertRequest) -> Result<(), CollaboratorError> {
            Err(CollaboratorError::Unavailable("audio device".into()))
        }
    }

    impl Notifier for Failing {
        fn notify(&self, _request: &NotificationRequest) -> Result<(), CollaboratorError> {
            Err(CollaboratorError::Rejected("permission denied".into()))
        }
    }

    fn minutes(work: i64) -> SettingsUpdate {
        SettingsUpdate {
            work_minutes: Some(work),
            ..Default::default()
        }
    }

    #[test]
    fn new_engine_is_idle_in_work_mode() {
        let engine = FocusEngine::new(Config::default());
        let snap = engine.snapshot(t(0));
        assert_eq!(snap.mode, Mode::Work);
        assert_eq!(snap.remaining_seconds, 1500);
        assert!(!snap.is_running);
        assert_eq!(snap.cycles_completed, 0);
        assert_eq!(snap.display(), "25:00");
    }

    #[test]
    fn toggle_starts_and_pauses() {
        let mut engine = FocusEngine::new(Config::default());
        assert!(matches!(engine.toggle_running(t(0)), Some(Event::TimerStarted { .. })));
        assert!(engine.is_running());
        assert!(matches!(
            engine.toggle_running(t(60)),
            Some(Event::TimerPaused { remaining_secs: 1440, .. })
        ));
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_seconds(t(500)), 1440);
    }

    #[test]
    fn set_mode_stops_and_reconfigures() {
        let mut engine = FocusEngine::new(Config::default());
        engine.toggle_running(t(0));
        assert_eq!(
            engine.set_mode(Mode::LongBreak, t(30)),
            Event::ModeChanged {
                from: Mode::Work,
                to: Mode::LongBreak,
                duration_secs: 600,
                at: t(30),
            }
        );
        assert!(!engine.is_running());
        assert_eq!(engine.clock().anchor(), None);
        assert_eq!(engine.remaining_seconds(t(100)), 600);
    }

    #[test]
    fn long_gap_catches_up_one_completion_per_tick() {
        let calls = Calls::default();
        let mut cfg = Config::default();
        cfg.apply_update(&SettingsUpdate {
            work_minutes: Some(1),
            short_break_minutes: Some(1),
            show_completion_notification: Some(true),
            ..Default::default()
        });
        let mut engine =
            FocusEngine::with_collaborators(cfg, Box::new(calls.clone()), Box::new(calls.clone()));
        engine.toggle_running(t(0));

        assert_eq!(engine.tick(t(1000)).len(), 1);
        assert_eq!(calls.count(), 2);

        let events = engine.tick(t(1000));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::AutoStarted { at, .. } if at == t(61)));
        assert!(matches!(
            events[1],
            Event::IntervalCompleted { mode: Mode::ShortBreak, .. }
        ));
        assert_eq!(calls.count(), 4);

        engine.tick(t(1000));
        assert_eq!(engine.config().cycles_completed(), 2);
        assert_eq!(calls.count(), 6);
    }

    #[test]
    fn reset_discards_progress() {
        let mut engine = FocusEngine::new(Config::default());
        engine.toggle_running(t(0));
        engine.reset_current_interval(t(100));
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_seconds(t(200)), 1500);
    }

    #[test]
    fn completion_fires_once_and_schedules_auto_start() {
        let calls = Calls::default();
        let mut cfg = Config::default();
        cfg.apply_update(&SettingsUpdate {
            work_minutes: Some(1),
            show_completion_notification: Some(true),
            ..Default::default()
        });
        let mut engine =
            FocusEngine::with_collaborators(cfg, Box::new(calls.clone()), Box::new(calls.clone()));
        engine.toggle_running(t(0));

        let events = engine.tick(t(60));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::IntervalCompleted {
                mode: Mode::Work,
                cycles_completed: 1,
                next_mode: Some(Mode::ShortBreak),
                ..
            }
        ));
        assert_eq!(calls.count(), 2);
        assert_eq!(engine.mode(), Mode::ShortBreak);
        assert!(!engine.is_running());
        assert_eq!(engine.auto_start_at(), Some(t(61)));

        // Still inside the delay: nothing happens.
        assert!(engine.tick(t(60)).is_empty());
        let events = engine.tick(t(61));
        assert_eq!(events, vec![Event::AutoStarted { mode: Mode::ShortBreak, at: t(61) }]);
        assert!(engine.is_running());
        assert_eq!(engine.config().cycles_completed(), 1);
        assert_eq!(calls.count(), 2);
    }

    #[test]
    fn manual_mode_change_cancels_pending_auto_start() {
        let mut cfg = Config::default();
        cfg.apply_update(&minutes(1));
        let mut engine = FocusEngine::new(cfg);
        engine.toggle_running(t(0));
        engine.tick(t(60));
        assert!(engine.auto_start_at().is_some());

        engine.set_mode(Mode::LongBreak, t(60));
        assert_eq!(engine.auto_start_at(), None);
        assert!(engine.tick(t(62)).is_empty());
        assert!(!engine.is_running());
        assert_eq!(engine.mode(), Mode::LongBreak);
    }

    #[test]
    fn pause_cancels_pending_auto_start() {
        let mut cfg = Config::default();
        cfg.apply_update(&minutes(1));
        let mut engine = FocusEngine::new(cfg);
        engine.toggle_running(t(0));
        engine.tick(t(60));

        assert_eq!(engine.pause(t(60)), None);
        assert!(engine.tick(t(65)).is_empty());
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_seconds(t(65)), 300);
    }

    #[test]
    fn no_auto_sequence_leaves_clock_at_zero() {
        let mut cfg = Config::default();
        cfg.apply_update(&SettingsUpdate {
            work_minutes: Some(1),
            auto_sequence: Some(false),
            ..Default::default()
        });
        let mut engine = FocusEngine::new(cfg);
        engine.toggle_running(t(0));
        let events = engine.tick(t(75));
        assert!(matches!(
            events[0],
            Event::IntervalCompleted { next_mode: None, auto_start_at: None, .. }
        ));
        assert_eq!(engine.mode(), Mode::Work);
        assert_eq!(engine.remaining_seconds(t(80)), 0);
        assert!(!engine.is_running());
        assert_eq!(engine.toggle_running(t(80)), None);
        assert!(engine.tick(t(90)).is_empty());
    }

    #[test]
    fn settings_change_reconfigures_idle_clock_only() {
        let mut engine = FocusEngine::new(Config::default());
        assert!(matches!(
            engine.update_settings(&minutes(40), t(0)),
            Event::SettingsUpdated { reconfigured: true, .. }
        ));
        assert_eq!(engine.remaining_seconds(t(0)), 2400);

        engine.toggle_running(t(0));
        assert!(matches!(
            engine.update_settings(&minutes(10), t(100)),
            Event::SettingsUpdated { reconfigured: false, .. }
        ));
        assert_eq!(engine.remaining_seconds(t(100)), 2300);
    }

    #[test]
    fn settings_for_other_modes_leave_clock_alone() {
        let mut engine = FocusEngine::new(Config::default());
        engine.toggle_running(t(0));
        engine.pause(t(50));
        engine.update_settings(
            &SettingsUpdate {
                short_break_minutes: Some(9),
                ..Default::default()
            },
            t(60),
        );
        assert_eq!(engine.remaining_seconds(t(60)), 1450);
    }

    #[test]
    fn turning_off_auto_sequence_cancels_pending_start() {
        let mut cfg = Config::default();
        cfg.apply_update(&minutes(1));
        let mut engine = FocusEngine::new(cfg);
        engine.toggle_running(t(0));
        engine.tick(t(60));
        engine.update_settings(
            &SettingsUpdate {
                auto_sequence: Some(false),
                ..Default::default()
            },
            t(60),
        );
        assert!(engine.tick(t(70)).is_empty());
        assert!(!engine.is_running());
    }

    #[test]
    fn reset_settings_restores_defaults() {
        let mut cfg = Config::default();
        cfg.apply_update(&minutes(1));
        let mut engine = FocusEngine::new(cfg);
        engine.toggle_running(t(0));
        engine.tick(t(60));
        engine.set_mode(Mode::Work, t(61));
        engine.reset_settings(t(62));
        assert_eq!(engine.config(), &Config::default());
        assert_eq!(engine.remaining_seconds(t(62)), 1500);
    }

    #[test]
    fn collaborator_failures_do_not_block_transition() {
        let mut cfg = Config::default();
        cfg.apply_update(&SettingsUpdate {
            work_minutes: Some(1),
            show_completion_notification: Some(true),
            ..Default::default()
        });
        let mut engine = FocusEngine::with_collaborators(cfg, Box::new(Failing), Box::new(Failing));
        engine.toggle_running(t(0));
        engine.tick(t(60));
        assert_eq!(engine.mode(), Mode::ShortBreak);
        assert_eq!(engine.config().cycles_completed(), 1);
    }

    #[test]
    fn muted_alert_is_not_requested() {
        let calls = Calls::default();
        let mut cfg = Config::default();
        cfg.apply_update(&SettingsUpdate {
            work_minutes: Some(1),
            alert_volume: Some(0),
            ..Default::default()
        });
        let mut engine =
            FocusEngine::with_collaborators(cfg, Box::new(calls.clone()), Box::new(calls.clone()));
        engine.toggle_running(t(0));
        engine.tick(t(60));
        assert_eq!(calls.count(), 0);
    }

    #[test]
    fn late_poll_anchors_completion_at_expiry() {
        let mut cfg = Config::default();
        cfg.apply_update(&minutes(1));
        let mut engine = FocusEngine::new(cfg);
        engine.toggle_running(t(0));
        let events = engine.tick(t(200));
        assert!(matches!(events[0], Event::IntervalCompleted { at, .. } if at == t(60)));
        assert_eq!(engine.auto_start_at(), Some(t(61)));

        let events = engine.tick(t(201));
        assert_eq!(events, vec![Event::AutoStarted { mode: Mode::ShortBreak, at: t(61) }]);
        assert_eq!(engine.remaining_seconds(t(201)), 160);
    }

    #[test]
    fn snapshot_progress() {
        let mut engine = FocusEngine::new(Config::default());
        engine.toggle_running(t(0));
        let snap = engine.snapshot(t(750));
        assert_eq!(snap.display(), "12:30");
        assert!((snap.progress() - 0.5).abs() < f64::EPSILON);
    }
}
