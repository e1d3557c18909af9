//! # focusclock Core Library
//!
//! The session clock and mode-sequencing engine behind the focusclock
//! timer. Presentation, audio decoding and notification display live in
//! the host; this crate decides what the timer shows and when an alert or
//! notification is due.
//!
//! ## Architecture
//!
//! - **Session clock**: remaining time is derived from a wall-clock anchor
//!   on every read, so late or irregular polling never causes drift
//! - **Mode sequencer**: Work → Short Break → Work … with a Long Break after
//!   every third Work interval
//! - **Engine**: owns settings and clock, drives side effects exactly once
//!   per completion, and schedules a cancellable auto-start
//! - **Runner**: optional tokio task that owns an engine and ticks it
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: the facade hosts call into
//! - [`SessionClock`]: anchored countdown for one interval
//! - [`ModeSequencer`]: next-mode decision and cycle counting
//! - [`Config`]: validated settings
//! - [`EngineHandle`]: async driver

pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod runner;
pub mod timer;

pub use config::{AlertSound, Config, SettingsUpdate, Theme};
pub use effects::{AlertPlayer, AlertRequest, NotificationRequest, Notifier};
pub use error::{CollaboratorError, ConfigError, CoreError};
pub use events::Event;
pub use runner::{Command, EngineHandle};
pub use timer::{FocusEngine, Mode, ModeSequencer, SessionClock, Snapshot};
