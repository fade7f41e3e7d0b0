//! Shared HTTP plumbing for the summarization and delivery providers.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("worklog/", env!("CARGO_PKG_VERSION"));

/// Provider error bodies can be whole HTML pages; keep log lines readable.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Build a client whose every request is bounded by `timeout`
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Extension trait for reqwest::Response to handle common error patterns.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Ensure the response status is successful, returning an error with details if not.
    ///
    /// # Errors
    ///
    /// Returns an error if the response status is not successful (2xx),
    /// including the status code and the start of the response body.
    async fn ensure_success(self, api_name: &str) -> Result<Self>
    where
        Self: Sized;
}

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn ensure_success(self, api_name: &str) -> Result<Self> {
        let status = self.status();
        if !status.is_success() {
            let body = self.text().await.unwrap_or_default();
            anyhow::bail!("{api_name} API error ({status}): {}", truncate_body(&body));
        }
        Ok(self)
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
