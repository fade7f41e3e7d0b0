//! Daily report text generation.
//!
//! Turns per-process usage into a short narrative through the configured
//! summarization provider.

use anyhow::Result;
use chrono::NaiveDate;
use std::fmt::Write;
use std::sync::Arc;
use worklog_storage::ProcessUsage;

use crate::ai_provider::{AiProvider, CompletionRequest};

/// Rows beyond this are dropped from the prompt, not summarized
pub const MAX_TABLE_ROWS: usize = 30;

pub const MAX_REPORT_TOKENS: u32 = 400;

pub const EMPTY_RESPONSE_FALLBACK: &str = "No report generated.";

pub const SYSTEM_INSTRUCTION: &str = "You are a concise assistant. Given daily application usage \
statistics (process name and minutes used), write a brief professional daily work report in 3-5 \
sentences. Focus on what kind of work was likely done (e.g. coding, browsing, meetings) without \
making up details. Use neutral, formal tone.";

pub struct ReportComposer {
    provider: Arc<dyn AiProvider>,
}

impl ReportComposer {
    #[must_use]
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    /// Generate the report text for `date`.
    ///
    /// Empty `stats` short-circuit to [`Self::no_activity_text`] without
    /// contacting the provider.
    ///
    /// # Errors
    ///
    /// Provider failures propagate unchanged so callers can tell a failed
    /// generation apart from a legitimately empty day.
    pub async fn compose(&self, date: NaiveDate, stats: &[ProcessUsage]) -> Result<String> {
        if stats.is_empty() {
            return Ok(Self::no_activity_text(date));
        }

        let request = Self::build_request(date, stats);
        log::debug!(
            "Requesting daily report for {date} from {} ({} rows)",
            self.provider.model_name(),
            stats.len().min(MAX_TABLE_ROWS)
        );

        let text = self.provider.generate(&request).await?;
        let text = text.trim();
        if text.is_empty() {
            log::warn!("Provider returned an empty report for {date}");
            return Ok(EMPTY_RESPONSE_FALLBACK.to_string());
        }
        Ok(text.to_string())
    }

    #[must_use]
    pub fn no_activity_text(date: NaiveDate) -> String {
        format!(
            "Daily work report for {}: No window activity was recorded for this day.",
            date.format("%Y-%m-%d")
        )
    }

    /// Markdown two-column table of the top [`MAX_TABLE_ROWS`] entries
    #[must_use]
    pub fn build_usage_table(stats: &[ProcessUsage]) -> String {
        let mut table = String::from("Application | Total minutes\n---|---");
        for usage in stats.iter().take(MAX_TABLE_ROWS) {
            let _ = write!(table, "\n{} | {:.1}", usage.process_name, usage.total_minutes);
        }
        table
    }

    #[must_use]
    pub fn build_request(date: NaiveDate, stats: &[ProcessUsage]) -> CompletionRequest {
        CompletionRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            user: format!(
                "Date: {}\n\nUsage statistics (top applications by time):\n{}\n\nWrite the daily work report:",
                date.format("%Y-%m-%d"),
                Self::build_usage_table(stats)
            ),
            max_tokens: MAX_REPORT_TOKENS,
        }
    }
}

#[cfg(test)]
mod tests;
