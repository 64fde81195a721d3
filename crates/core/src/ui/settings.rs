//! User settings persistence.
//!
//! Settings are stored as JSON in the user's config directory
//! (e.g., `~/.config/lens/settings.json` on Linux).

use crate::config::Config;
use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User-configurable settings persisted between sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// API key override (takes precedence over environment).
    #[serde(default)]
    pub api_key: String,
    /// Comma separated language hints sent with each request.
    #[serde(default)]
    pub language_hints: String,
    /// Copy the selection to the clipboard when pressing Done.
    #[serde(default = "default_true")]
    pub copy_on_confirm: bool,
    /// Draw outlines around every recognized block.
    #[serde(default = "default_true")]
    pub show_outlines: bool,
}

fn default_true() -> bool {
    true
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lens").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from disk, falling back to defaults if not found.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| Self::from_json(&content))
            .unwrap_or_default()
    }

    fn from_json(content: &str) -> Option<Self> {
        serde_json::from_str(content).ok()
    }

    /// Persists settings to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            let json = serde_json::to_string_pretty(self)?;
            fs::write(path, json)?;
        }
        Ok(())
    }

    /// Applies non-empty overrides on top of an environment config.
    pub fn apply_to(&self, config: &mut Config) {
        if !self.api_key.trim().is_empty() {
            config.vision_api_key = Some(self.api_key.trim().to_string());
        }
        let hints = self.hints();
        if !hints.is_empty() {
            config.language_hints = hints;
        }
    }

    /// Whether recognition would be requested differently than with
    /// `before`. Whitespace and empty hints are ignored.
    pub fn changes_recognition(&self, before: &Settings) -> bool {
        self.api_key.trim() != before.api_key.trim() || self.hints() != before.hints()
    }

    fn hints(&self) -> Vec<String> {
        self.language_hints
            .split(',')
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
            .map(String::from)
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language_hints: String::new(),
            copy_on_confirm: true,
            show_outlines: true,
        }
    }
}
