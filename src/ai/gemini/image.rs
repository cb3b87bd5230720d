use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, InlineData, Part};
use crate::ai::{EditRequest, ImageEditService};
use crate::{data_url, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ComposeRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

/// [`ImageEditService`] over Gemini's inline-parts wire format: one
/// multi-part payload with both images and the instruction, answered by a
/// candidate list whose parts are scanned for inline image data.
pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(120),
                client,
            ),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageEditService for GeminiImageClient {
    async fn compose(
        &self,
        subject_image: &str,
        reference_image: &str,
        prompt: &str,
    ) -> Result<String> {
        let edit = EditRequest::build(subject_image, reference_image, prompt)?;

        let request = ComposeRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: edit.subject.mime_type,
                            data: edit.subject.base64_data,
                        },
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: edit.reference.mime_type,
                            data: edit.reference.base64_data,
                        },
                    },
                    Part::Text {
                        text: edit.instruction,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let candidate = response.candidates.first().ok_or(Error::EmptyResponse)?;

        let image = candidate
            .content
            .parts
            .iter()
            .find_map(|part| match part {
                Part::InlineData { inline_data } => Some(inline_data),
                _ => None,
            })
            .ok_or(Error::NoImageReturned)?;

        tracing::debug!("Gemini returned an image with mime_type {}", image.mime_type);

        Ok(data_url::encode(&image.mime_type, &image.data))
    }
}
