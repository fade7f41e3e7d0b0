//! The daily report run shared by the scheduler and "send now".

use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use worklog_ai::ReportComposer;
use worklog_integrations::DeliverySink;
use worklog_storage::{ActivityStore, DailyReport};

use crate::aggregator::daily_stats;
use crate::clock::{Clock, SystemClock};

pub const MSG_SENT: &str = "Report sent to Slack.";
pub const MSG_SEND_FAILED: &str = "Report generated but Slack send failed.";
pub const MSG_NO_ACTIVITY: &str = "No activity recorded; placeholder report saved.";

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub success: bool,
    pub message: String,
    pub report_date: NaiveDate,
}

impl PipelineOutcome {
    fn new(success: bool, message: impl Into<String>, report_date: NaiveDate) -> Self {
        Self {
            success,
            message: message.into(),
            report_date,
        }
    }
}

struct Generated {
    text: String,
    had_activity: bool,
}

pub struct ReportPipeline {
    store: Arc<dyn ActivityStore>,
    composer: ReportComposer,
    sink: Arc<dyn DeliverySink>,
    timezone: Tz,
    clock: Arc<dyn Clock>,
}

impl ReportPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn ActivityStore>,
        composer: ReportComposer,
        sink: Arc<dyn DeliverySink>,
        timezone: Tz,
    ) -> Self {
        Self::with_clock(store, composer, sink, timezone, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        store: Arc<dyn ActivityStore>,
        composer: ReportComposer,
        sink: Arc<dyn DeliverySink>,
        timezone: Tz,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            composer,
            sink,
            timezone,
            clock,
        }
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Today's date in the configured timezone
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.timezone).date_naive()
    }

    async fn generate(&self, date: NaiveDate) -> Result<Generated> {
        let stats = daily_stats(self.store.as_ref(), date, self.timezone)?;
        let text = self.composer.compose(date, &stats).await?;
        Ok(Generated {
            text,
            had_activity: !stats.is_empty(),
        })
    }

    /// Aggregate, compose, deliver and store the report for `date`
    /// (today when `None`).
    ///
    /// Never fails: every problem is folded into the returned outcome.
    /// A day without activity stores the placeholder text and skips both
    /// the provider and the sink.
    pub async fn run(&self, date: Option<NaiveDate>) -> PipelineOutcome {
        let report_date = date.unwrap_or_else(|| self.today());
        log::info!("Running daily report for {report_date}");

        let generated = match self.generate(report_date).await {
            Ok(generated) => generated,
            Err(e) => {
                log::error!("Report generation failed for {report_date}: {e:#}");
                return PipelineOutcome::new(
                    false,
                    format!("Report generation failed: {e:#}"),
                    report_date,
                );
            }
        };

        let mut report = DailyReport::new(report_date, generated.text);
        let (success, message) = if !generated.had_activity {
            (true, MSG_NO_ACTIVITY)
        } else if self.sink.deliver(&report.report_text).await {
            report = report.mark_sent(self.clock.now(), Some(self.sink.channel().to_string()));
            (true, MSG_SENT)
        } else {
            (false, MSG_SEND_FAILED)
        };

        if let Err(e) = self.store.upsert_report(&report) {
            log::error!("Failed to save report for {report_date}: {e:#}");
            return PipelineOutcome::new(
                false,
                format!("Report generated but could not be saved: {e:#}"),
                report_date,
            );
        }

        if success {
            log::info!("Daily report for {report_date}: {message}");
        } else {
            log::warn!("Daily report for {report_date}: {message}");
        }
        PipelineOutcome::new(success, message, report_date)
    }
}
