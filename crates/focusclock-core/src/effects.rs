//! Side-effect collaborators.
//!
//! The engine decides *when* an alert or notification is due and with which
//! parameters; implementations of these traits decide how (or whether) it
//! actually reaches the user. Failures are reported back as
//! [`CollaboratorError`] and only logged by the engine.

use serde::{Deserialize, Serialize};

use crate::config::AlertSound;
use crate::error::CollaboratorError;
use crate::timer::Mode;

/// Title used for every completion notification.
pub const NOTIFICATION_TITLE: &str = "Time is up!";

/// Request to play the configured alert sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub sound: AlertSound,
    /// 1..=100; a request is never issued at volume 0.
    pub volume: u32,
}

/// Request to show a completion notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub mode: Mode,
}

impl NotificationRequest {
    pub fn for_completed(mode: Mode) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: format!("{} timer has ended.", mode.display_name()),
            mode,
        }
    }
}

/// Plays alert sounds.
pub trait AlertPlayer: Send + Sync {
    fn play(&self, request: &AlertRequest) -> Result<(), CollaboratorError>;
}

/// Shows system notifications. Owns permission checks.
pub trait Notifier: Send + Sync {
    fn notify(&self, request: &NotificationRequest) -> Result<(), CollaboratorError>;
}

/// Alert player that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAlert;

impl AlertPlayer for NoopAlert {
    fn play(&self, _request: &AlertRequest) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Notifier that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _request: &NotificationRequest) -> Result<(), CollaboratorError> {
        Ok(())
    }
}
