//! Provider integrations for image composition
//!
//! One [`ImageEditService`] contract with two wire-protocol implementations
//! (Gemini's inline-parts endpoint and OpenRouter's chat-completion
//! endpoint), selected at configuration time. Request assembly shared by
//! both lives here so the adapters stay thin strategies.

pub mod gemini;
pub mod mock;
pub mod openrouter;

pub use gemini::GeminiImageClient;
pub use mock::MockImageEditClient;
pub use openrouter::OpenRouterImageClient;

use crate::data_url::{self, ImagePayload};
use crate::{prompts, Error, Result};
use async_trait::async_trait;

#[async_trait]
pub trait ImageEditService: Send + Sync {
    /// Composites `reference_image` into `subject_image` as directed by
    /// `prompt`. All three images cross this boundary as data URLs.
    ///
    /// One network round trip per call, never retried internally. Every
    /// failure is classified into an [`Error`] variant before it surfaces.
    async fn compose(
        &self,
        subject_image: &str,
        reference_image: &str,
        prompt: &str,
    ) -> Result<String>;
}

/// Inputs for one composition attempt, decoded and ready for either wire
/// format. Built fresh per attempt and owned by the in-flight call.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub subject: ImagePayload,
    pub reference: ImagePayload,
    pub instruction: String,
}

impl EditRequest {
    /// Decodes both input images and renders the instruction string.
    ///
    /// Fails fast with [`Error::MalformedImage`] before any network call if
    /// either input does not parse as a data URL.
    pub fn build(subject_image: &str, reference_image: &str, prompt: &str) -> Result<Self> {
        let subject = data_url::decode(subject_image)?;
        let reference = data_url::decode(reference_image)?;
        let instruction = prompts::render(prompts::COMPOSE_INSTRUCTION, &[("prompt", prompt)]);

        tracing::debug!(
            "Built edit request (subject: {}, reference: {})",
            subject.mime_type,
            reference.mime_type
        );

        Ok(Self {
            subject,
            reference,
            instruction,
        })
    }
}

/// Converts a non-2xx response into a classified error before any body
/// parsing, preserving the status and body text for diagnostics.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    provider: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    tracing::error!("{} API error (status {}): {}", provider, status, body);
    Err(Error::HttpStatus {
        status: status.as_u16(),
        body,
    })
}
