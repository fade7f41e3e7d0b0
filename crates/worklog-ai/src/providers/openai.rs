use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use worklog_integrations::{build_client, ResponseExt};

use super::PROVIDER_TIMEOUT;
use crate::ai_provider::{AiProvider, CompletionRequest};

/// OpenAI API Provider (also compatible with other OpenAI-compatible APIs)
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: build_client(PROVIDER_TIMEOUT)?,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Content of the first choice; `null` content counts as an empty answer.
fn extract_content(json: &serde_json::Value) -> Result<String> {
    let message = json["choices"][0]
        .get("message")
        .context("Failed to extract message from OpenAI response")?;
    Ok(message["content"].as_str().unwrap_or_default().to_string())
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user }
            ],
            "max_tokens": request.max_tokens
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to OpenAI")?
            .ensure_success("OpenAI")
            .await?;

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        extract_content(&json)
    }
}
