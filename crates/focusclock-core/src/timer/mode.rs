use serde::{Deserialize, Serialize};

/// The kind of interval being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "pomodoro", alias = "work")]
    Work,
    #[serde(rename = "short-break")]
    ShortBreak,
    #[serde(rename = "long-break")]
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::ShortBreak, Mode::LongBreak];

    /// Stable identifier, matching the serde representation.
    pub fn id(self) -> &'static str {
        match self {
            Mode::Work => "pomodoro",
            Mode::ShortBreak => "short-break",
            Mode::LongBreak => "long-break",
        }
    }

    /// Human-readable name used in notifications and the terminal UI.
    pub fn display_name(self) -> &'static str {
        match self {
            Mode::Work => "Pomodoro",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    /// Parse an identifier. Accepts `work` as an alias for `pomodoro` and
    /// underscores or spaces in place of the dash.
    pub fn from_id(id: &str) -> Option<Self> {
        let normalized = id.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "pomodoro" | "work" => Some(Mode::Work),
            "short-break" | "short" => Some(Mode::ShortBreak),
            "long-break" | "long" => Some(Mode::LongBreak),
            _ => None,
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Mode::Work)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
