//! Application wiring for one capture-to-result cycle.

use crate::ai::{GeminiImageClient, ImageEditService, OpenRouterImageClient};
use crate::generation::{GenerationSession, GenerationState};
use crate::models::{Config, ImageProvider, Mode};
use crate::settings::SettingsStore;
use crate::{data_url, mime, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Terminal outcome of one capture run. Generation failures are an outcome,
/// not an error: the session converts every adapter failure into a message.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Saved(PathBuf),
    Failed(String),
}

pub struct App {
    settings: SettingsStore,
    session: GenerationSession,
    output_dir: PathBuf,
}

impl App {
    /// Construct an app from environment configuration (`Config::from_env`).
    ///
    /// The provider strategy is picked here, once; a missing API key fails
    /// startup rather than the first request.
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;

        let service: Arc<dyn ImageEditService> = match config.provider {
            ImageProvider::Gemini => {
                info!("Image provider: Gemini (model: {})", config.model);
                Arc::new(GeminiImageClient::new(
                    config.api_key.clone(),
                    config.model.clone(),
                ))
            }
            ImageProvider::OpenRouter => {
                info!("Image provider: OpenRouter (model: {})", config.model);
                Arc::new(OpenRouterImageClient::new(
                    config.api_key.clone(),
                    config.model.clone(),
                    config.referer.clone(),
                    config.app_title.clone(),
                ))
            }
        };

        Ok(Self::with_services(
            service,
            SettingsStore::new(config.settings_path),
            config.output_dir,
        ))
    }

    /// Build an app from concrete dependencies, for tests and harnesses.
    pub fn with_services(
        service: Arc<dyn ImageEditService>,
        settings: SettingsStore,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            settings,
            session: GenerationSession::new(service),
            output_dir,
        }
    }

    /// Updates the stored prompt and/or reference image for `mode`.
    pub fn update_settings(
        &self,
        mode: Mode,
        prompt: Option<String>,
        reference_path: Option<&Path>,
    ) -> Result<()> {
        let mut settings = self.settings.load().mode(mode);

        if let Some(prompt) = prompt {
            settings.prompt = prompt;
        }
        if let Some(path) = reference_path {
            let bytes = fs::read(path)?;
            settings.reference_image = Some(data_url::encode_bytes(
                mime::detect_image_mime(&bytes),
                &bytes,
            ));
        }

        self.settings.save(mode, settings);
        info!("Updated settings for mode {:?}", mode);
        Ok(())
    }

    /// Runs one generation attempt for a captured photo.
    pub async fn run(&self, subject_path: &Path, mode: Mode) -> Result<RunOutcome> {
        let bytes = fs::read(subject_path)?;
        let subject = data_url::encode_bytes(mime::detect_image_mime(&bytes), &bytes);

        let settings = self.settings.load().mode(mode);

        match self.session.generate(&subject, &settings).await {
            GenerationState::Success { image } => Ok(RunOutcome::Saved(self.save_result(&image)?)),
            GenerationState::Failed { message } => Ok(RunOutcome::Failed(message)),
            // A lone CLI attempt cannot be superseded mid-flight.
            state => Ok(RunOutcome::Failed(format!(
                "Unexpected generation state: {:?}",
                state
            ))),
        }
    }

    fn save_result(&self, image: &str) -> Result<PathBuf> {
        let payload = data_url::decode(image)?;
        let bytes = payload.bytes()?;

        fs::create_dir_all(&self.output_dir)?;
        let filename = format!(
            "generated-{}.{}",
            Local::now().format("%Y%m%d-%H%M%S%3f"),
            extension_for_mime(&payload.mime_type)
        );
        let path = self.output_dir.join(filename);
        fs::write(&path, bytes)?;
        info!("Saved generated image to {}", path.display());

        Ok(path)
    }
}

fn extension_for_mime(mime_type: &str) -> &str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
