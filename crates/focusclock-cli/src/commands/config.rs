use clap::Subcommand;
use std::path::PathBuf;

use focusclock_core::{AlertSound, Config, ConfigError, Theme};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as JSON
    Show {
        /// Preset file to read instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Get a config value
    Get {
        /// Config key (e.g. "work_minutes", "alert_sound")
        key: String,
        /// Preset file to read instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default preset file location
    Path,
    /// List the available alert sounds
    Sounds,
    /// List the available themes
    Themes,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show { config } => {
            let config = super::load_config(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key, config } => {
            let config = super::load_config(config.as_deref())?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Path => {
            println!("{}", Config::default_path().display());
        }
        ConfigAction::Sounds => {
            for sound in AlertSound::ALL {
                let marker = if sound == AlertSound::default() { " (default)" } else { "" };
                println!("{}{marker}", sound.id());
            }
        }
        ConfigAction::Themes => {
            for theme in Theme::ALL {
                let marker = if theme == Theme::default() { " (default)" } else { "" };
                println!("{}{marker}", theme.id());
            }
        }
    }
    Ok(())
}
