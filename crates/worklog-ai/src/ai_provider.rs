use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::providers::{ollama::OllamaProvider, openai::OpenAiProvider};

/// One chat completion: a fixed instruction plus user content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// Trait for summarization providers
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a completion.
    ///
    /// A response without content yields an empty string, not an error;
    /// callers decide what an empty answer means.
    ///
    /// # Errors
    ///
    /// Returns an error on transport, authentication or quota failures
    async fn generate(&self, request: &CompletionRequest) -> Result<String>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}

/// Supported summarization backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => anyhow::bail!("Unknown AI provider: {other} (expected openai or ollama)"),
        }
    }
}

/// Summarization provider settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ProviderConfig {
    #[must_use]
    pub fn effective_model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) if !model.trim().is_empty() => model.trim(),
            (_, ProviderKind::OpenAi) => "gpt-4o-mini",
            (_, ProviderKind::Ollama) => "llama3.2",
        }
    }

    #[must_use]
    pub fn effective_base_url(&self) -> &str {
        match (&self.base_url, self.provider) {
            (Some(url), _) if !url.trim().is_empty() => url.trim(),
            (_, ProviderKind::OpenAi) => "https://api.openai.com/v1",
            (_, ProviderKind::Ollama) => "http://localhost:11434",
        }
    }

    #[must_use]
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns an error if the API key is missing for `OpenAI` or the HTTP
/// client cannot be built.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn AiProvider>> {
    let model = config.effective_model();
    let base_url = config.effective_base_url();

    match config.provider {
        ProviderKind::OpenAi => {
            let api_key = config
                .effective_api_key()
                .context("API Key required for OpenAI (set OPENAI_API_KEY)")?;
            Ok(Arc::new(OpenAiProvider::new(api_key, model, Some(base_url))?))
        }
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(Some(base_url), model)?)),
    }
}
