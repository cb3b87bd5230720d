use super::client::OpenRouterHttpClient;
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, ImageUrlRef,
    MessageContent, ResponseFormat,
};
use crate::ai::{EditRequest, ImageEditService};
use crate::{data_url, Error, Result};
use async_trait::async_trait;

/// [`ImageEditService`] over OpenRouter's chat-completion wire format.
///
/// The request is a single user message with an ordered content list
/// [instruction text, subject image, reference image]. The response can
/// arrive in three shapes, checked in this order:
/// 1. a raw binary image body (`content-type: image/*`),
/// 2. a JSON completion whose message content is a part list with an
///    `image_url` entry,
/// 3. a JSON completion whose message content is itself a data-URL string.
pub struct OpenRouterImageClient {
    http: OpenRouterHttpClient,
    model: String,
}

impl OpenRouterImageClient {
    pub fn new(api_key: String, model: String, referer: String, app_title: String) -> Self {
        Self {
            http: OpenRouterHttpClient::new(api_key, referer, app_title),
            model,
        }
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        referer: String,
        app_title: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: OpenRouterHttpClient::new_with_client(api_key, referer, app_title, client),
            model,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageEditService for OpenRouterImageClient {
    async fn compose(
        &self,
        subject_image: &str,
        reference_image: &str,
        prompt: &str,
    ) -> Result<String> {
        let edit = EditRequest::build(subject_image, reference_image, prompt)?;

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: edit.instruction,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrlRef {
                            url: data_url::encode(
                                &edit.subject.mime_type,
                                &edit.subject.base64_data,
                            ),
                        },
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrlRef {
                            url: data_url::encode(
                                &edit.reference.mime_type,
                                &edit.reference.base64_data,
                            ),
                        },
                    },
                ],
            }],
            response_format: ResponseFormat {
                format_type: "image".to_string(),
            },
        };

        let response = self.http.chat_completion(&request).await?;

        // Shape 1: the response body is the image itself.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.starts_with("image/") {
            let mime_type = content_type
                .split(';')
                .next()
                .unwrap_or(&content_type)
                .trim()
                .to_string();
            let bytes = response.bytes().await?;
            tracing::debug!(
                "OpenRouter returned a binary {} body ({} bytes)",
                mime_type,
                bytes.len()
            );
            return Ok(data_url::encode_bytes(&mime_type, &bytes));
        }

        // Shapes 2 and 3: a JSON chat completion.
        let body = response.text().await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| {
                tracing::error!(
                    "Failed to parse OpenRouter response ({} bytes): {}",
                    body.len(),
                    e
                );
                Error::InvalidResponse(format!("unparseable chat completion: {}", e))
            })?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(Error::NoImageReturned)?;

        match message.content {
            Some(MessageContent::Parts(parts)) => {
                tracing::debug!("OpenRouter returned a structured content list");
                parts
                    .into_iter()
                    .find_map(|part| part.image_url)
                    .map(|image_url| image_url.url)
                    .ok_or(Error::NoImageReturned)
            }
            Some(MessageContent::Text(text)) if text.starts_with("data:image") => {
                tracing::debug!("OpenRouter returned a data-URL string");
                Ok(text)
            }
            _ => Err(Error::NoImageReturned),
        }
    }
}
