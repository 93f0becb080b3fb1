/// CLI configuration: load, save, and sanitize.
use std::path::Path;

use serde::{Deserialize, Serialize};
use undo_redo::HistoryConfig;

/// Largest magnitude accepted for the starting counter value.
const MAX_INITIAL_MAGNITUDE: i64 = 1_000_000_000_000;

/// Settings for a scripted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Counter value the session starts from (and `reset` returns to).
    pub initial_value: i64,
    /// Abort on the first failing command instead of reporting and continuing.
    pub strict: bool,
    pub history: HistoryConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            initial_value: 0,
            strict: false,
            history: HistoryConfig::default(),
        }
    }
}

impl CliConfig {
    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (unreadable file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<CliConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Broken file is left as-is
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges.
    pub fn sanitize(&mut self) {
        self.initial_value = self
            .initial_value
            .clamp(-MAX_INITIAL_MAGNITUDE, MAX_INITIAL_MAGNITUDE);
    }
}
