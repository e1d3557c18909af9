//! Core error types for focusclock-core.
//!
//! Engine operations never fail: invalid settings are clamped and
//! out-of-order commands are ignored. The types here cover the edges
//! around the engine -- reading a preset file, parsing `key=value`
//! assignments, and reporting collaborator failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Side-effect collaborator errors
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine task is gone (shut down or panicked).
    #[error("Engine task is no longer running")]
    EngineStopped,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Unknown settings key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Value that could not be interpreted for its key
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors reported by alert and notification collaborators.
///
/// The engine only logs these; a failed side effect never undoes the
/// transition that triggered it.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// Backend missing or not reachable (no audio device, no notification daemon)
    #[error("{0} is unavailable")]
    Unavailable(String),

    /// Backend refused the request (permission denied, muted)
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
