//! Data models and structures
//!
//! Defines the generation modes, their persisted settings, and the
//! environment-derived application configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = "In the main photo of the person, edit them to be holding a small card or sign that clearly displays the provided reference image.";

/// Generation mode. One mode is active per capture; each has its own
/// persisted prompt and reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Rainbow,
}

impl Mode {
    pub fn parse(input: &str) -> std::result::Result<Self, String> {
        match input {
            "rainbow" => Ok(Mode::Rainbow),
            other => Err(format!("Unknown mode '{}'. Expected: rainbow", other)),
        }
    }
}

/// Per-mode settings: the edit prompt and an optional reference image
/// stored as a data URL. A missing reference image is a valid state and is
/// reported to the user as a configuration problem before any network call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSettings {
    pub prompt: String,
    #[serde(default)]
    pub reference_image: Option<String>,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            reference_image: None,
        }
    }
}

/// All persisted settings, keyed by mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(flatten)]
    pub modes: HashMap<Mode, ModeSettings>,
}

impl Default for AppSettings {
    fn default() -> Self {
        let mut modes = HashMap::new();
        modes.insert(Mode::Rainbow, ModeSettings::default());
        Self { modes }
    }
}

impl AppSettings {
    /// Settings for a mode, falling back to that mode's defaults.
    pub fn mode(&self, mode: Mode) -> ModeSettings {
        self.modes.get(&mode).cloned().unwrap_or_default()
    }

    /// Fills in defaults for any mode missing from a persisted file, so
    /// settings written by older versions keep loading after new modes are
    /// added.
    pub fn merge_defaults(mut self) -> Self {
        for (mode, settings) in AppSettings::default().modes {
            self.modes.entry(mode).or_insert(settings);
        }
        self
    }
}

/// Which provider wire protocol to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
    Gemini,
    OpenRouter,
}

impl ImageProvider {
    fn parse(input: &str) -> Result<Self> {
        match input {
            "gemini" => Ok(ImageProvider::Gemini),
            "openrouter" => Ok(ImageProvider::OpenRouter),
            other => Err(Error::Configuration(format!(
                "IMAGE_PROVIDER must be 'gemini' or 'openrouter', got '{}'",
                other
            ))),
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            ImageProvider::Gemini => "gemini-2.5-flash-image-preview",
            ImageProvider::OpenRouter => "google/gemini-2.5-flash-image-preview",
        }
    }

    /// Environment variables consulted for this provider's API key, in
    /// order of preference.
    fn api_key_vars(self) -> &'static [&'static str] {
        match self {
            ImageProvider::Gemini => &["API_KEY", "GEMINI_API_KEY", "VITE_GEMINI_API_KEY"],
            ImageProvider::OpenRouter => &["API_KEY", "OPENROUTER_API_KEY"],
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ImageProvider,
    pub api_key: String,
    pub model: String,
    pub referer: String,
    pub app_title: String,
    pub settings_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Config {
    /// Reads configuration from the environment (and `.env` if present).
    ///
    /// A missing API key is fatal here, at startup; the key is handed to the
    /// provider client at construction and never read again.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let provider = match std::env::var("IMAGE_PROVIDER") {
            Ok(value) => ImageProvider::parse(&value)?,
            Err(_) => ImageProvider::Gemini,
        };

        let api_key = first_env(provider.api_key_vars()).ok_or_else(|| {
            Error::Configuration(format!(
                "No API key set. Checked: {}",
                provider.api_key_vars().join(", ")
            ))
        })?;

        Ok(Self {
            provider,
            api_key,
            model: std::env::var("IMAGE_MODEL")
                .unwrap_or_else(|_| provider.default_model().to_string()),
            referer: std::env::var("APP_REFERER")
                .unwrap_or_else(|_| "https://cardlens.app".to_string()),
            app_title: std::env::var("APP_TITLE").unwrap_or_else(|_| "cardlens".to_string()),
            settings_path: std::env::var("SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("settings.json")),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
        })
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|value| !value.is_empty()))
}
