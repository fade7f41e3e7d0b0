use async_trait::async_trait;

/// Outbound notification channel for generated reports
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Push `text` to the channel.
    ///
    /// Returns `true` only when the endpoint acknowledged with a 2xx status.
    /// Transport errors and timeouts are reported as `false`; this never
    /// retries.
    async fn deliver(&self, text: &str) -> bool;

    /// Identifier recorded on reports delivered through this sink
    #[must_use]
    fn channel(&self) -> &str;
}
