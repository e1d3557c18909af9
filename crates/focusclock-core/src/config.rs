//! Validated timer settings.
//!
//! Holds the interval lengths, the auto-sequence toggle, the completed
//! cycle counter and the alert/notification preferences. Every numeric
//! field is clamped at the point of mutation so readers never see an
//! out-of-range value; unknown sound or theme identifiers fall back to
//! the default instead of failing the update.
//!
//! An optional preset file (`~/.config/focusclock/config.toml`) can seed
//! the initial values. It is read once at startup and never written.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::timer::Mode;

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 99;
pub const MAX_VOLUME: u32 = 100;

/// Id older presets store for [`AlertSound::Eagle`].
const EAGLE_DECORATED_ID: &str = "Eagle 🦅🇺🇸";

/// Alert sounds known to the playback collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AlertSound {
    #[default]
    Bell,
    Geese,
    SlotMachine,
    Alert,
    Beep,
    GtaCarHorn,
    ChaChing,
    NewBell,
    Eagle,
    VinylRewind,
    YeahBoy,
}

impl AlertSound {
    pub const ALL: [AlertSound; 11] = [
        AlertSound::Bell,
        AlertSound::Geese,
        AlertSound::SlotMachine,
        AlertSound::Alert,
        AlertSound::Beep,
        AlertSound::GtaCarHorn,
        AlertSound::ChaChing,
        AlertSound::NewBell,
        AlertSound::Eagle,
        AlertSound::VinylRewind,
        AlertSound::YeahBoy,
    ];

    pub fn id(self) -> &'static str {
        match self {
            AlertSound::Bell => "Bell",
            AlertSound::Geese => "Geese",
            AlertSound::SlotMachine => "Slot Machine",
            AlertSound::Alert => "Alert",
            AlertSound::Beep => "Beep",
            AlertSound::GtaCarHorn => "GTA Car Horn",
            AlertSound::ChaChing => "Cha Ching",
            AlertSound::NewBell => "New Bell",
            AlertSound::Eagle => "Eagle",
            AlertSound::VinylRewind => "Vinyl Rewind",
            AlertSound::YeahBoy => "Yeah Boy",
        }
    }

    /// Case-insensitive lookup by id.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        if id == EAGLE_DECORATED_ID {
            return Some(AlertSound::Eagle);
        }
        Self::ALL
            .into_iter()
            .find(|sound| sound.id().eq_ignore_ascii_case(id))
    }

    /// Lookup that never fails: unknown ids map to the default sound.
    pub fn from_id_or_default(id: &str) -> Self {
        Self::from_id(id).unwrap_or_else(|| {
            tracing::warn!(id, fallback = Self::default().id(), "unknown alert sound");
            Self::default()
        })
    }
}

impl From<AlertSound> for String {
    fn from(sound: AlertSound) -> Self {
        sound.id().to_string()
    }
}

impl From<String> for AlertSound {
    fn from(id: String) -> Self {
        Self::from_id_or_default(&id)
    }
}

/// Colour themes offered by the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Theme {
    #[default]
    Purple,
    Blue,
    Green,
    Yellow,
    Orange,
    Red,
    Pink,
}

impl Theme {
    pub const ALL: [Theme; 7] = [
        Theme::Purple,
        Theme::Blue,
        Theme::Green,
        Theme::Yellow,
        Theme::Orange,
        Theme::Red,
        Theme::Pink,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Theme::Purple => "Purple",
            Theme::Blue => "Blue",
            Theme::Green => "Green",
            Theme::Yellow => "Yellow",
            Theme::Orange => "Orange",
            Theme::Red => "Red",
            Theme::Pink => "Pink",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|theme| theme.id().eq_ignore_ascii_case(id))
    }

    pub fn from_id_or_default(id: &str) -> Self {
        Self::from_id(id).unwrap_or_else(|| {
            tracing::warn!(id, fallback = Self::default().id(), "unknown theme");
            Self::default()
        })
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        theme.id().to_string()
    }
}

impl From<String> for Theme {
    fn from(id: String) -> Self {
        Self::from_id_or_default(&id)
    }
}

/// Timer settings.
///
/// Fields are read-only outside the crate; all changes go through
/// [`Config::apply_update`], [`Config::reset`] or a Work completion.
/// Deserializing goes through the same clamping as an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredConfig")]
pub struct Config {
    work_minutes: u32,
    short_break_minutes: u32,
    long_break_minutes: u32,
    auto_sequence: bool,
    cycles_completed: u64,
    alert_sound: AlertSound,
    play_sound_on_finish: bool,
    alert_volume: u32,
    theme: Theme,
    show_completion_notification: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 10,
            auto_sequence: true,
            cycles_completed: 0,
            alert_sound: AlertSound::default(),
            play_sound_on_finish: true,
            alert_volume: 80,
            theme: Theme::default(),
            show_completion_notification: false,
        }
    }
}

/// Wire shape of [`Config`]; missing fields take their defaults.
#[derive(Deserialize)]
struct StoredConfig {
    work_minutes: Option<i64>,
    short_break_minutes: Option<i64>,
    long_break_minutes: Option<i64>,
    auto_sequence: Option<bool>,
    cycles_completed: Option<u64>,
    alert_sound: Option<String>,
    play_sound_on_finish: Option<bool>,
    alert_volume: Option<i64>,
    theme: Option<String>,
    show_completion_notification: Option<bool>,
}

impl From<StoredConfig> for Config {
    fn from(stored: StoredConfig) -> Self {
        let mut cfg = Config::default();
        cfg.apply_update(&SettingsUpdate {
            work_minutes: stored.work_minutes,
            short_break_minutes: stored.short_break_minutes,
            long_break_minutes: stored.long_break_minutes,
            auto_sequence: stored.auto_sequence,
            alert_sound: stored.alert_sound,
            play_sound_on_finish: stored.play_sound_on_finish,
            alert_volume: stored.alert_volume,
            theme: stored.theme,
            show_completion_notification: stored.show_completion_notification,
        });
        cfg.cycles_completed = stored.cycles_completed.unwrap_or(0);
        cfg
    }
}

/// A partial settings change. `None` leaves the field untouched.
///
/// Numeric fields are wide signed integers so out-of-range input such as
/// `0`, `-3` or `500` can be expressed and clamped rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsUpdate {
    pub work_minutes: Option<i64>,
    pub short_break_minutes: Option<i64>,
    pub long_break_minutes: Option<i64>,
    pub auto_sequence: Option<bool>,
    pub alert_sound: Option<String>,
    pub play_sound_on_finish: Option<bool>,
    pub alert_volume: Option<i64>,
    pub theme: Option<String>,
    pub show_completion_notification: Option<bool>,
}

impl SettingsUpdate {
    /// Keys accepted by [`SettingsUpdate::parse_assignment`].
    pub const KEYS: [&'static str; 9] = [
        "work_minutes",
        "short_break_minutes",
        "long_break_minutes",
        "auto_sequence",
        "alert_sound",
        "play_sound_on_finish",
        "alert_volume",
        "theme",
        "show_completion_notification",
    ];

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build a single-field update from `key=value`.
    ///
    /// The value is typed by the field it targets: booleans accept
    /// `true/false/on/off/yes/no/1/0`, numbers must be integers, sound and
    /// theme ids are passed through as text (and resolved with fallback
    /// when applied). Dashes in the key are treated as underscores.
    pub fn parse_assignment(assignment: &str) -> Result<Self, ConfigError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidValue {
                key: assignment.to_string(),
                message: "expected key=value".into(),
            })?;
        let key = key.trim().replace('-', "_");
        let value = value.trim();
        if !Self::KEYS.contains(&key.as_str()) {
            return Err(ConfigError::UnknownKey(key));
        }

        let defaults = serde_json::to_value(Config::default()).map_err(|e| {
            ConfigError::ParseFailed(e.to_string())
        })?;
        let typed = match defaults.get(&key) {
            Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(parse_bool(&key, value)?),
            Some(serde_json::Value::Number(_)) => {
                let n = parse_saturating(value).ok_or_else(|| ConfigError::InvalidValue {
                    key: key.clone(),
                    message: format!("cannot parse '{value}' as an integer"),
                })?;
                serde_json::Value::Number(n.into())
            }
            _ => serde_json::Value::String(value.to_string()),
        };

        let mut object = serde_json::Map::new();
        object.insert(key.clone(), typed);
        serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
            ConfigError::InvalidValue {
                key,
                message: e.to_string(),
            }
        })
    }

    /// Combine two updates; fields set in `other` win.
    pub fn merge(mut self, other: SettingsUpdate) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            work_minutes,
            short_break_minutes,
            long_break_minutes,
            auto_sequence,
            alert_sound,
            play_sound_on_finish,
            alert_volume,
            theme,
            show_completion_notification
        );
        self
    }
}

/// Integer parse that saturates instead of failing on overflow; the
/// result is clamped to the field's range later anyway.
fn parse_saturating(value: &str) -> Option<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{value}' as a boolean"),
        }),
    }
}

/// Clamp a requested interval length into `[MIN_MINUTES, MAX_MINUTES]`.
pub fn clamp_minutes(requested: i64) -> u32 {
    requested.clamp(i64::from(MIN_MINUTES), i64::from(MAX_MINUTES)) as u32
}

/// Clamp a requested volume into `[0, MAX_VOLUME]`.
pub fn clamp_volume(requested: i64) -> u32 {
    requested.clamp(0, i64::from(MAX_VOLUME)) as u32
}

fn clamp_logged(key: &'static str, requested: i64, clamp: fn(i64) -> u32) -> u32 {
    let value = clamp(requested);
    if i64::from(value) != requested {
        tracing::warn!(key, requested, clamped = value, "setting out of range");
    }
    value
}

impl Config {
    // ── Queries ──────────────────────────────────────────────────────

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn short_break_minutes(&self) -> u32 {
        self.short_break_minutes
    }

    pub fn long_break_minutes(&self) -> u32 {
        self.long_break_minutes
    }

    pub fn auto_sequence(&self) -> bool {
        self.auto_sequence
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn alert_sound(&self) -> AlertSound {
        self.alert_sound
    }

    pub fn play_sound_on_finish(&self) -> bool {
        self.play_sound_on_finish
    }

    pub fn alert_volume(&self) -> u32 {
        self.alert_volume
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn show_completion_notification(&self) -> bool {
        self.show_completion_notification
    }

    /// Configured length of `mode`, in minutes.
    pub fn minutes_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Work => self.work_minutes,
            Mode::ShortBreak => self.short_break_minutes,
            Mode::LongBreak => self.long_break_minutes,
        }
    }

    /// Configured length of `mode`, in seconds.
    pub fn duration_secs(&self, mode: Mode) -> u64 {
        u64::from(self.minutes_for(mode)) * 60
    }

    /// Get a setting rendered as a string, by field name.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key.trim().replace('-', "_"))? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply a partial update, clamping numbers and resolving ids with
    /// fallback. Never fails; a bad field does not block the others.
    pub fn apply_update(&mut self, update: &SettingsUpdate) {
        if let Some(v) = update.work_minutes {
            self.work_minutes = clamp_logged("work_minutes", v, clamp_minutes);
        }
        if let Some(v) = update.short_break_minutes {
            self.short_break_minutes = clamp_logged("short_break_minutes", v, clamp_minutes);
        }
        if let Some(v) = update.long_break_minutes {
            self.long_break_minutes = clamp_logged("long_break_minutes", v, clamp_minutes);
        }
        if let Some(v) = update.auto_sequence {
            self.auto_sequence = v;
        }
        if let Some(ref id) = update.alert_sound {
            self.alert_sound = AlertSound::from_id_or_default(id);
        }
        if let Some(v) = update.play_sound_on_finish {
            self.play_sound_on_finish = v;
        }
        if let Some(v) = update.alert_volume {
            self.alert_volume = clamp_logged("alert_volume", v, clamp_volume);
        }
        if let Some(ref id) = update.theme {
            self.theme = Theme::from_id_or_default(id);
        }
        if let Some(v) = update.show_completion_notification {
            self.show_completion_notification = v;
        }
    }

    /// Restore every field, including the cycle counter, to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Count one finished Work interval. Only the mode sequencer calls this.
    pub(crate) fn increment_cycles_completed(&mut self) {
        self.cycles_completed = self.cycles_completed.saturating_add(1);
    }

    // ── Preset file ──────────────────────────────────────────────────

    /// `$FOCUSCLOCK_CONFIG`, or `~/.config/focusclock/config.toml`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("FOCUSCLOCK_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("focusclock")
            .join("config.toml")
    }

    /// Defaults with the preset file at `path` applied on top.
    ///
    /// The file uses the [`SettingsUpdate`] keys; values go through the
    /// same clamping and fallback as any other update.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    /// for the known keys.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let update: SettingsUpdate = toml::from_str(&content)?;
        let mut cfg = Self::default();
        cfg.apply_update(&update);
        Ok(cfg)
    }

    /// Load the preset at [`Config::default_path`] if one exists,
    /// otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be parsed.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }
}
