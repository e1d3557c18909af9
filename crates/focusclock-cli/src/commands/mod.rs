pub mod config;
pub mod run;
pub mod sequence;

use std::path::Path;

use focusclock_core::{Config, ConfigError, Mode};

/// The explicit preset if given, else the default preset location.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load_or_default(),
    }
}

pub fn parse_mode(value: &str) -> Result<Mode, String> {
    Mode::from_id(value)
        .ok_or_else(|| format!("unknown mode '{value}' (pomodoro, short-break, long-break)"))
}
