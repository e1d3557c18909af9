//! Async driver.
//!
//! Moves a [`FocusEngine`] into a single tokio task that ticks it on a
//! fixed cadence and applies commands from an mpsc channel one at a time.
//! That task is the engine's only owner, so multi-threaded hosts get
//! serialized access without locks. Events are broadcast to subscribers.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{Config, SettingsUpdate};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::timer::{FocusEngine, Mode, Snapshot};

/// Default poll cadence.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 64;

/// Requests accepted by the engine task.
#[derive(Debug)]
pub enum Command {
    SetMode(Mode),
    Toggle,
    Start,
    Pause,
    Reset,
    UpdateSettings(SettingsUpdate),
    ResetSettings,
    Snapshot(oneshot::Sender<Snapshot>),
    Config(oneshot::Sender<Config>),
    Shutdown,
}

/// Handle to an engine running in its own task.
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
    task: JoinHandle<FocusEngine>,
}

impl EngineHandle {
    /// Spawn the engine task using the system wall clock.
    pub fn spawn(engine: FocusEngine, tick_every: Duration) -> Self {
        Self::spawn_with_clock(engine, tick_every, Utc::now)
    }

    /// Spawn the engine task with an explicit time source.
    pub fn spawn_with_clock<F>(engine: FocusEngine, tick_every: Duration, now: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + 'static,
    {
        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let task = tokio::spawn(run(engine, rx, events.clone(), tick_every, now));
        Self {
            commands,
            events,
            task,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::EngineStopped)
    }

    pub async fn set_mode(&self, mode: Mode) -> Result<()> {
        self.send(Command::SetMode(mode)).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.send(Command::Toggle).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<()> {
        self.send(Command::UpdateSettings(update)).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| CoreError::EngineStopped)
    }

    pub async fn config(&self) -> Result<Config> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Config(tx)).await?;
        rx.await.map_err(|_| CoreError::EngineStopped)
    }

    /// Stop the task and take the engine back.
    pub async fn shutdown(self) -> Result<FocusEngine> {
        // A closed channel means the task already exited; join it anyway.
        let _ = self.commands.send(Command::Shutdown).await;
        self.task.await.map_err(|_| CoreError::EngineStopped)
    }
}

async fn run<F>(
    mut engine: FocusEngine,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    tick_every: Duration,
    now: F,
) -> FocusEngine
where
    F: Fn() -> DateTime<Utc>,
{
    let mut ticker = tokio::time::interval(tick_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in engine.tick(now()) {
                    publish(&events, event);
                }
            }
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => apply(&mut engine, command, now(), &events),
            }
        }
    }

    tracing::debug!("engine task stopped");
    engine
}

fn apply(engine: &mut FocusEngine, command: Command, now: DateTime<Utc>, events: &broadcast::Sender<Event>) {
    let event = match command {
        Command::SetMode(mode) => Some(engine.set_mode(mode, now)),
        Command::Toggle => engine.toggle_running(now),
        Command::Start => engine.start(now),
        Command::Pause => engine.pause(now),
        Command::Reset => Some(engine.reset_current_interval(now)),
        Command::UpdateSettings(update) => Some(engine.update_settings(&update, now)),
        Command::ResetSettings => Some(engine.reset_settings(now)),
        Command::Snapshot(reply) => {
            let _ = reply.send(engine.snapshot(now));
            None
        }
        Command::Config(reply) => {
            let _ = reply.send(engine.config().clone());
            None
        }
        Command::Shutdown => None,
    };
    if let Some(event) = event {
        publish(events, event);
    }
}

fn publish(events: &broadcast::Sender<Event>, event: Event) {
    // No subscribers is fine.
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::time::Instant;

    fn paused_clock() -> impl Fn() -> DateTime<Utc> + Send + 'static {
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let start = Instant::now();
        move || base + chrono::Duration::from_std(start.elapsed()).unwrap_or_else(|_| chrono::Duration::zero())
    }

    fn one_minute_work() -> FocusEngine {
        let mut cfg = Config::default();
        cfg.apply_update(&SettingsUpdate {
            work_minutes: Some(1),
            ..Default::default()
        });
        FocusEngine::new(cfg)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_through_completion_and_auto_start() {
        let handle = EngineHandle::spawn_with_clock(one_minute_work(), DEFAULT_TICK, paused_clock());
        let mut events = handle.subscribe();

        handle.toggle().await.unwrap();
        tokio::time::sleep(Duration::from_millis(62_500)).await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(matches!(seen[0], Event::TimerStarted { mode: Mode::Work, .. }));
        assert!(matches!(
            seen[1],
            Event::IntervalCompleted { mode: Mode::Work, cycles_completed: 1, .. }
        ));
        assert!(matches!(seen[2], Event::AutoStarted { mode: Mode::ShortBreak, .. }));
        assert_eq!(seen.len(), 3);

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.mode, Mode::ShortBreak);
        assert!(snap.is_running);
        assert_eq!(snap.cycles_completed, 1);

        let engine = handle.shutdown().await.unwrap();
        assert_eq!(engine.mode(), Mode::ShortBreak);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_are_applied_in_order() {
        let handle = EngineHandle::spawn_with_clock(
            FocusEngine::new(Config::default()),
            DEFAULT_TICK,
            paused_clock(),
        );
        handle.set_mode(Mode::LongBreak).await.unwrap();
        handle
            .update_settings(SettingsUpdate {
                long_break_minutes: Some(20),
                ..Default::default()
            })
            .await
            .unwrap();
        handle.toggle().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.reset().await.unwrap();

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.mode, Mode::LongBreak);
        assert_eq!(snap.remaining_seconds, 1200);
        assert!(!snap.is_running);
        assert_eq!(handle.config().await.unwrap().long_break_minutes(), 20);
        handle.shutdown().await.unwrap();
    }
}
