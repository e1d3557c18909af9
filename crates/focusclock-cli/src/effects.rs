//! Terminal-side collaborators for the engine.

use std::io::Write;

use focusclock_core::{AlertPlayer, AlertRequest, CollaboratorError, NotificationRequest, Notifier};

/// "Plays" the alert by ringing the terminal bell.
///
/// Terminals have no volume control, so the requested sound and volume are
/// only logged.
pub struct TerminalBell;

impl AlertPlayer for TerminalBell {
    fn play(&self, request: &AlertRequest) -> Result<(), CollaboratorError> {
        tracing::info!(sound = request.sound.id(), volume = request.volume, "alert");
        let mut out = std::io::stdout();
        out.write_all(b"\x07")
            .and_then(|()| out.flush())
            .map_err(|e| CollaboratorError::Unavailable(format!("terminal bell ({e})")))
    }
}

/// Desktop notifications via the platform notification service.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, request: &NotificationRequest) -> Result<(), CollaboratorError> {
        notify_rust::Notification::new()
            .summary(&request.title)
            .body(&request.body)
            .show()
            .map(|_| ())
            .map_err(|e| CollaboratorError::Unavailable(format!("desktop notifications ({e})")))
    }
}
