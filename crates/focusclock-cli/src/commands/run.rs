use chrono::Utc;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use focusclock_core::runner::{Command, EngineHandle};
use focusclock_core::{Event, FocusEngine, Mode, SettingsUpdate, Snapshot};

use crate::effects::{DesktopNotifier, TerminalBell};

const REDRAW_EVERY: Duration = Duration::from_millis(250);
const MIN_TICK_MS: u64 = 10;
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct RunArgs {
    /// Preset file to read instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override a setting, e.g. `--set work_minutes=50` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
    /// Mode to begin in
    #[arg(long, value_parser = super::parse_mode)]
    pub mode: Option<Mode>,
    /// Start the countdown immediately
    #[arg(long)]
    pub start: bool,
    /// Poll cadence in milliseconds
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,
}

/// One line of interactive input.
#[derive(Debug, PartialEq)]
pub enum Input {
    Toggle,
    Reset,
    SetMode(Mode),
    Set(SettingsUpdate),
    Defaults,
    Status,
    Help,
    Quit,
}

pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if let Some(assignment) = line.strip_prefix("set ") {
        return SettingsUpdate::parse_assignment(assignment)
            .map(Input::Set)
            .map_err(|e| e.to_string());
    }
    match line.to_ascii_lowercase().as_str() {
        "" | "s" | "start" | "pause" | "toggle" => Ok(Input::Toggle),
        "r" | "reset" => Ok(Input::Reset),
        "p" | "1" => Ok(Input::SetMode(Mode::Work)),
        "b" | "2" => Ok(Input::SetMode(Mode::ShortBreak)),
        "l" | "3" => Ok(Input::SetMode(Mode::LongBreak)),
        "defaults" => Ok(Input::Defaults),
        "status" | "config" => Ok(Input::Status),
        "h" | "?" | "help" => Ok(Input::Help),
        "q" | "quit" | "exit" => Ok(Input::Quit),
        other => Mode::from_id(other)
            .map(Input::SetMode)
            .ok_or_else(|| format!("unknown command '{other}' (h for help)")),
    }
}

pub fn status_line(snap: &Snapshot) -> String {
    let state = if snap.is_running {
        "running"
    } else if snap.auto_start_at.is_some() {
        "up next"
    } else {
        "paused"
    };
    format!(
        "{:<11} {}  [{state}]  cycles: {}",
        snap.mode.display_name(),
        snap.display(),
        snap.cycles_completed
    )
}

pub fn describe(event: &Event) -> String {
    match event {
        Event::ModeChanged { to, duration_secs, .. } => {
            format!("switched to {} ({} min)", to.display_name(), duration_secs / 60)
        }
        Event::TimerStarted { mode, .. } => format!("{} started", mode.display_name()),
        Event::TimerPaused { mode, .. } => format!("{} paused", mode.display_name()),
        Event::TimerReset { mode, .. } => format!("{} reset", mode.display_name()),
        Event::IntervalCompleted {
            mode,
            next_mode: Some(next),
            ..
        } => format!("{} finished, {} is up next", mode.display_name(), next.display_name()),
        Event::IntervalCompleted { mode, .. } => {
            format!("{} finished (auto-sequence off)", mode.display_name())
        }
        Event::AutoStarted { mode, .. } => format!("{} started automatically", mode.display_name()),
        Event::SettingsUpdated { reconfigured: true, .. } => {
            "settings saved, timer updated to the new duration".to_string()
        }
        Event::SettingsUpdated { .. } => "settings saved".to_string(),
    }
}

fn print_help() {
    println!("commands: <enter>/s start-pause  r reset  p/b/l pomodoro/short/long break");
    println!("          set KEY=VALUE  defaults  status  h help  q quit");
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(args.config.as_deref())?;
    let overrides = args
        .set
        .iter()
        .try_fold(SettingsUpdate::default(), |acc, pair| {
            SettingsUpdate::parse_assignment(pair).map(|update| acc.merge(update))
        })?;
    config.apply_update(&overrides);

    let mut engine =
        FocusEngine::with_collaborators(config, Box::new(TerminalBell), Box::new(DesktopNotifier));
    let now = Utc::now();
    if let Some(mode) = args.mode {
        engine.set_mode(mode, now);
    }
    if args.start {
        engine.start(now);
    }

    let tick = Duration::from_millis(args.tick_ms.max(MIN_TICK_MS));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(engine, tick));
    // A pending stdin read would otherwise hold up runtime shutdown.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn session(engine: FocusEngine, tick: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let handle = EngineHandle::spawn(engine, tick);
    let mut events = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut redraw = tokio::time::interval(REDRAW_EVERY);
    print_help();

    loop {
        tokio::select! {
            _ = redraw.tick() => {
                let snap = handle.snapshot().await?;
                let mut out = std::io::stdout();
                write!(out, "\r{}\x1b[K", status_line(&snap))?;
                out.flush()?;
            }
            event = events.recv() => match event {
                Ok(event) => println!("\r{}\x1b[K", describe(&event)),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => dispatch(&handle, input).await?,
                    Err(message) => println!("{message}"),
                }
            }
        }
    }

    let engine = handle.shutdown().await?;
    println!("\n{} cycle(s) completed", engine.config().cycles_completed());
    Ok(())
}

async fn dispatch(handle: &EngineHandle, input: Input) -> focusclock_core::error::Result<()> {
    match input {
        Input::Toggle => handle.toggle().await,
        Input::Reset => handle.reset().await,
        Input::SetMode(mode) => handle.set_mode(mode).await,
        Input::Set(update) => handle.update_settings(update).await,
        Input::Defaults => handle.send(Command::ResetSettings).await,
        Input::Status => {
            let config = handle.config().await?;
            println!("\n{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Input::Help => {
            print_help();
            Ok(())
        }
        Input::Quit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_maps_shortcuts() {
        assert_eq!(parse_input(""), Ok(Input::Toggle));
        assert_eq!(parse_input(" s "), Ok(Input::Toggle));
        assert_eq!(parse_input("r"), Ok(Input::Reset));
        assert_eq!(parse_input("2"), Ok(Input::SetMode(Mode::ShortBreak)));
        assert_eq!(parse_input("long-break"), Ok(Input::SetMode(Mode::LongBreak)));
        assert_eq!(parse_input("Q"), Ok(Input::Quit));
    }

    #[test]
    fn parse_input_handles_settings() {
        let parsed = parse_input("set work_minutes=45").unwrap();
        assert_eq!(
            parsed,
            Input::Set(SettingsUpdate {
                work_minutes: Some(45),
                ..Default::default()
            })
        );
        assert!(parse_input("set colour=red").is_err());
        assert!(parse_input("dance").is_err());
    }

    #[test]
    fn status_line_shows_countdown() {
        let snap = Snapshot {
            mode: Mode::ShortBreak,
            remaining_seconds: 272,
            total_seconds: 300,
            is_running: true,
            cycles_completed: 2,
            auto_start_at: None,
        };
        assert_eq!(status_line(&snap), "Short Break 04:32  [running]  cycles: 2");
    }

    #[test]
    fn describe_completion_without_next_mode() {
        let event = Event::IntervalCompleted {
            mode: Mode::Work,
            cycles_completed: 1,
            next_mode: None,
            auto_start_at: None,
            at: Utc::now(),
        };
        assert_eq!(describe(&event), "Pomodoro finished (auto-sequence off)");
    }
}
