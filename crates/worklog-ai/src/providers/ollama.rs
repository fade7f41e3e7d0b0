use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use worklog_integrations::{build_client, ResponseExt};

use super::PROVIDER_TIMEOUT;
use crate::ai_provider::{AiProvider, CompletionRequest};

/// Local Ollama Provider
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: Option<&str>, model: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(PROVIDER_TIMEOUT)?,
            base_url: base_url
                .unwrap_or("http://localhost:11434")
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
        })
    }

    /// Non-streaming `/api/chat` body; `num_predict` caps the answer length
    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user }
            ],
            "options": { "num_predict": request.max_tokens },
            "stream": false
        })
    }
}

/// `message.content` of a chat response; missing or `null` content is an empty answer.
fn extract_content(json: &serde_json::Value) -> Result<String> {
    let message = json
        .get("message")
        .context("Failed to extract text from Ollama response")?;
    Ok(message["content"].as_str().unwrap_or_default().to_string())
}

#[async_trait]
impl AiProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let body = self.request_body(request);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Ollama")?
            .ensure_success("Ollama")
            .await?;

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        extract_content(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let provider = OllamaProvider::new(Some("http://localhost:11434/"), "llama3.2").unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");

        let request = CompletionRequest {
            system: "You summarize work.".to_string(),
            user: "code 120 min".to_string(),
            max_tokens: 400,
        };
        assert_eq!(
            provider.request_body(&request),
            json!({
                "model": "llama3.2",
                "messages": [
                    { "role": "system", "content": "You summarize work." },
                    { "role": "user", "content": "code 120 min" }
                ],
                "options": { "num_predict": 400 },
                "stream": false
            })
        );
    }

    #[test]
    fn test_extract_content() {
        let json = json!({ "message": { "role": "assistant", "content": "Busy day." }, "done": true });
        assert_eq!(extract_content(&json).unwrap(), "Busy day.");
    }

    #[test]
    fn test_extract_missing_content_is_empty() {
        let json = json!({ "message": { "role": "assistant" }, "done": true });
        assert_eq!(extract_content(&json).unwrap(), "");
    }

    #[test]
    fn test_extract_missing_message_is_error() {
        let json = json!({ "error": "model not found" });
        assert!(extract_content(&json).is_err());
    }
}
