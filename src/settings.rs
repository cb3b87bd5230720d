//! File-backed persistence for per-mode settings.
//!
//! The store is read once at startup and written on every save. Storage
//! failures are logged and swallowed: losing a save must never take down a
//! capture session, and the in-memory settings stay usable either way.

use crate::models::{AppSettings, Mode, ModeSettings};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads settings from disk, merging in defaults for missing modes.
    ///
    /// A missing or unreadable file yields the defaults; persisted settings
    /// are never required for the app to start.
    pub fn load(&self) -> AppSettings {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                info!(
                    "No settings file at {} ({}), using defaults",
                    self.path.display(),
                    e
                );
                return AppSettings::default();
            }
        };

        match serde_json::from_str::<AppSettings>(&raw) {
            Ok(settings) => settings.merge_defaults(),
            Err(e) => {
                warn!(
                    "Could not parse settings file {}: {}. Using defaults.",
                    self.path.display(),
                    e
                );
                AppSettings::default()
            }
        }
    }

    /// Persists new settings for one mode, returning the updated settings.
    ///
    /// Write failures are logged, not propagated.
    pub fn save(&self, mode: Mode, settings: ModeSettings) -> AppSettings {
        let mut all = self.load();
        all.modes.insert(mode, settings);

        match serde_json::to_string_pretty(&all) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!(
                        "Failed to write settings to {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
            Err(e) => warn!("Failed to serialize settings: {}", e),
        }

        all
    }
}
