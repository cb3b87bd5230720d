use super::types::ChatCompletionRequest;
use crate::ai::ensure_success;
use crate::Result;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api";

/// Lightweight OpenRouter REST client.
///
/// Returns the raw [`reqwest::Response`] (after status classification)
/// because the completion endpoint can answer with a binary image body
/// instead of JSON.
pub struct OpenRouterHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
    referer: String,
    app_title: String,
}

impl OpenRouterHttpClient {
    pub fn new(api_key: String, referer: String, app_title: String) -> Self {
        Self::new_with_client(api_key, referer, app_title, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        referer: String,
        app_title: String,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            referer,
            app_title,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Posts a chat completion, classifying any non-2xx status.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(120))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to OpenRouter: {}", e);
                e
            })?;

        ensure_success(response, "OpenRouter").await
    }
}
