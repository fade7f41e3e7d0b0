//! Slack Incoming Webhook delivery

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::http::build_client;
use crate::traits::DeliverySink;

pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

const CHANNEL: &str = "slack";

/// Incoming Webhook payload
#[derive(Debug, Clone, Serialize)]
pub struct SlackMessage<'a> {
    pub text: &'a str,
}

/// Posts report text to a Slack Incoming Webhook URL
pub struct SlackWebhook {
    client: Client,
    webhook_url: String,
}

impl SlackWebhook {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(webhook_url: &str) -> Result<Self> {
        Self::with_timeout(webhook_url, DEFAULT_DELIVERY_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn with_timeout(webhook_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            webhook_url: webhook_url.trim().to_string(),
        })
    }
}

#[async_trait]
impl DeliverySink for SlackWebhook {
    async fn deliver(&self, text: &str) -> bool {
        let result = self
            .client
            .post(&self.webhook_url)
            .json(&SlackMessage { text })
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                log::info!("Report delivered to Slack ({} chars)", text.len());
                true
            }
            Ok(response) => {
                log::warn!("Slack webhook rejected report: HTTP {}", response.status());
                false
            }
            Err(e) => {
                log::warn!("Slack webhook request failed: {e}");
                false
            }
        }
    }

    fn channel(&self) -> &str {
        CHANNEL
    }
}
