//! Session settings
//!
//! Persisted as a small JSON file next to the binary. Missing fields take
//! their defaults, so older files keep loading.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Difficulty preset, scales upgrade prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    #[serde(rename = "E", alias = "easy")]
    Easy,
    #[serde(rename = "M", alias = "medium")]
    Medium,
    #[serde(rename = "H", alias = "hard")]
    Hard,
    #[serde(rename = "I", alias = "impoppable")]
    Impoppable,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Impoppable => "Impoppable",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    /// Accepts full names or the single-letter codes, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "e" | "easy" => Ok(Difficulty::Easy),
            "m" | "med" | "medium" => Ok(Difficulty::Medium),
            "h" | "hard" => Ok(Difficulty::Hard),
            "i" | "impoppable" => Ok(Difficulty::Impoppable),
            _ => Err(format!("unknown difficulty {s:?} (easy, medium, hard, impoppable)")),
        }
    }
}

/// Per-session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub starting_money: u32,
    pub starting_lives: i32,

    // === Waves ===
    /// Start the next wave automatically after one completes
    pub auto_start: bool,
    /// Pause between a completed wave and the automatic start
    pub auto_start_delay_ms: u64,

    pub difficulty: Difficulty,

    /// Fixed step used by the headless runner
    pub tick_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_money: STARTING_MONEY,
            starting_lives: STARTING_LIVES,
            auto_start: false,
            auto_start_delay_ms: AUTO_START_DELAY_MS,
            difficulty: Difficulty::Easy,
            tick_ms: TICK_MS,
        }
    }
}

impl Settings {
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Load settings from a JSON file, using defaults when absent or invalid
    pub fn load(file: impl AsRef<std::path::Path>) -> Self {
        let file = file.as_ref();
        let json = match std::fs::read_to_string(file) {
            Ok(json) => json,
            Err(_) => {
                log::info!("No settings at {}, using defaults", file.display());
                return Self::default();
            }
        };

        match serde_json::from_str::<Settings>(&json) {
            Ok(mut settings) => {
                if settings.tick_ms == 0 {
                    log::warn!("tick_ms of 0 is invalid, using {}", TICK_MS);
                    settings.tick_ms = TICK_MS;
                }
                log::info!("Loaded settings from {}", file.display());
                settings
            }
            Err(e) => {
                log::warn!("Settings {} unreadable ({}), using defaults", file.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, file: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(file.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
