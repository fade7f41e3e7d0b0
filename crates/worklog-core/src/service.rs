use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use worklog_ai::{create_provider, ReportComposer};
use worklog_integrations::SlackWebhook;
use worklog_storage::ActivityStore;

use crate::config::Settings;
use crate::monitor::create_probe;
use crate::pipeline::{PipelineOutcome, ReportPipeline};
use crate::scheduler::{DailyTrigger, ReportScheduler};
use crate::tracker::SessionTracker;

/// Control surface for tracking and reporting
pub struct WorklogService {
    tracker: SessionTracker,
    pipeline: Arc<ReportPipeline>,
}

impl WorklogService {
    #[must_use]
    pub fn new(tracker: SessionTracker, pipeline: Arc<ReportPipeline>) -> Self {
        Self { tracker, pipeline }
    }

    /// Wire the platform probe, the configured provider and the Slack sink
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone, webhook URL or provider settings
    /// are invalid
    pub fn from_settings(settings: &Settings, store: Arc<dyn ActivityStore>) -> Result<Self> {
        let tz = settings.tz()?;
        let sink = SlackWebhook::new(settings.webhook_url()?)?;
        let provider = create_provider(&settings.ai)?;
        log::debug!("Using {} for report text", provider.model_name());

        let pipeline = Arc::new(ReportPipeline::new(
            Arc::clone(&store),
            ReportComposer::new(provider),
            Arc::new(sink),
            tz,
        ));
        let tracker = SessionTracker::new(create_probe(), store, settings.poll_interval_seconds());
        Ok(Self::new(tracker, pipeline))
    }

    pub fn start(&self) -> bool {
        self.tracker.start()
    }

    pub async fn stop(&self) -> bool {
        self.tracker.stop().await
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tracker.is_running()
    }

    /// Flip tracking on or off, returning whether it is now running
    pub async fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop().await;
            false
        } else {
            self.start();
            true
        }
    }

    /// Run the report for today, exactly as the scheduler would
    pub async fn run_pipeline_now(&self) -> PipelineOutcome {
        self.pipeline.run(None).await
    }

    pub async fn run_pipeline_for(&self, date: NaiveDate) -> PipelineOutcome {
        self.pipeline.run(Some(date)).await
    }

    /// Scheduler sharing this service's pipeline
    #[must_use]
    pub fn scheduler(&self, trigger: DailyTrigger) -> ReportScheduler {
        ReportScheduler::new(Arc::clone(&self.pipeline), trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::NoSignalProbe;
    use crate::pipeline::MSG_NO_ACTIVITY;
    use chrono_tz::Tz;
    use worklog_ai::{ProviderConfig, ProviderKind};
    use worklog_storage::Database;

    fn offline_settings() -> Settings {
        Settings {
            slack_webhook_url: Some("http://127.0.0.1:9/unused".into()),
            ai: ProviderConfig {
                provider: ProviderKind::Ollama,
                ..ProviderConfig::default()
            },
            ..Settings::default()
        }
    }

    fn service(db: Arc<Database>) -> WorklogService {
        let settings = offline_settings();
        let provider = create_provider(&settings.ai).unwrap();
        let sink = SlackWebhook::new(settings.webhook_url().unwrap()).unwrap();
        let pipeline = Arc::new(ReportPipeline::new(
            db.clone(),
            ReportComposer::new(provider),
            Arc::new(sink),
            Tz::UTC,
        ));
        let tracker = SessionTracker::new(Arc::new(NoSignalProbe), db, 3600);
        WorklogService::new(tracker, pipeline)
    }

    #[test]
    fn test_from_settings_requires_webhook() {
        let db: Arc<dyn ActivityStore> = Arc::new(Database::open_in_memory().unwrap());
        let settings = Settings {
            slack_webhook_url: None,
            ..offline_settings()
        };
        let err = WorklogService::from_settings(&settings, Arc::clone(&db))
            .err()
            .unwrap();
        assert!(err.to_string().contains("SLACK_WEBHOOK_URL"));

        assert!(WorklogService::from_settings(&offline_settings(), db).is_ok());
    }

    #[tokio::test]
    async fn test_start_stop_toggle() {
        let service = service(Arc::new(Database::open_in_memory().unwrap()));

        assert!(!service.is_running());
        assert!(service.start());
        assert!(!service.start());
        assert!(service.is_running());

        assert!(!service.toggle().await);
        assert!(!service.is_running());
        assert!(service.toggle().await);
        assert!(service.stop().await);
        assert!(!service.stop().await);
    }

    #[tokio::test]
    async fn test_run_pipeline_for_empty_day() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let service = service(db.clone());
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        let outcome = service.run_pipeline_for(date).await;
        assert!(outcome.success);
        assert_eq!(outcome.message, MSG_NO_ACTIVITY);
        assert!(db.get_daily_report(date).unwrap().is_some());

        assert!(service.run_pipeline_now().await.success);
    }
}
