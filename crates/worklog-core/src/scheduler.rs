//! Once-a-day trigger for the report pipeline.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::pipeline::ReportPipeline;

/// Wall clock is re-read at least this often while waiting, so a suspended
/// machine notices a passed trigger soon after waking
const MAX_SLEEP_SLICE: Duration = Duration::from_secs(60);

/// How far past a nonexistent local time to look for the first valid one
const MAX_GAP_MINUTES: i64 = 180;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerParseError {
    #[error("expected a time like HH:MM, got {0:?}")]
    Format(String),
    #[error("hour must be between 0 and 23, got {0}")]
    Hour(u32),
    #[error("minute must be between 0 and 59, got {0}")]
    Minute(u32),
}

/// Local time of day at which the report runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    hour: u32,
    minute: u32,
}

impl Default for DailyTrigger {
    fn default() -> Self {
        Self { hour: 18, minute: 0 }
    }
}

impl DailyTrigger {
    /// # Errors
    ///
    /// Returns an error if the hour or minute is out of range
    pub fn new(hour: u32, minute: u32) -> Result<Self, TriggerParseError> {
        if hour > 23 {
            return Err(TriggerParseError::Hour(hour));
        }
        if minute > 59 {
            return Err(TriggerParseError::Minute(minute));
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub fn hour(&self) -> u32 {
        self.hour
    }

    #[must_use]
    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// The first trigger instant strictly after `after`.
    ///
    /// A trigger time skipped by a DST jump fires at the first local time
    /// that exists after it; a repeated one fires at its earlier occurrence.
    #[must_use]
    pub fn next_fire_after(&self, after: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
        let local_date = after.with_timezone(&tz).date_naive();
        (0..=2)
            .filter_map(|offset| local_date.checked_add_days(Days::new(offset)))
            .filter_map(|day| self.resolve_on(day, tz))
            .find(|fire| *fire > after)
            .unwrap_or_else(|| after + chrono::Duration::days(1))
    }

    fn resolve_on(&self, day: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
        let target = day.and_hms_opt(self.hour, self.minute, 0)?;
        (0..=MAX_GAP_MINUTES)
            .find_map(|step| {
                let local = target + chrono::Duration::minutes(step);
                tz.from_local_datetime(&local).earliest()
            })
            .map(|fire| fire.with_timezone(&Utc))
    }
}

impl fmt::Display for DailyTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for DailyTrigger {
    type Err = TriggerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_error = || TriggerParseError::Format(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(format_error)?;

        let is_field = |part: &str, min_len: usize| {
            (min_len..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !is_field(hour, 1) || !is_field(minute, 2) {
            return Err(format_error());
        }

        let hour = hour.parse().map_err(|_| format_error())?;
        let minute = minute.parse().map_err(|_| format_error())?;
        Self::new(hour, minute)
    }
}

/// Sleeps until `deadline` on `clock`. Returns false if cancelled first.
async fn sleep_until(clock: &dyn Clock, deadline: DateTime<Utc>, cancel: &CancellationToken) -> bool {
    loop {
        let remaining = (deadline - clock.now()).to_std().unwrap_or(Duration::ZERO);
        if remaining.is_zero() {
            return true;
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => return false,
            () = tokio::time::sleep(remaining.min(MAX_SLEEP_SLICE)) => {}
        }
    }
}

pub struct ReportScheduler {
    pipeline: Arc<ReportPipeline>,
    trigger: DailyTrigger,
    clock: Arc<dyn Clock>,
}

impl ReportScheduler {
    #[must_use]
    pub fn new(pipeline: Arc<ReportPipeline>, trigger: DailyTrigger) -> Self {
        Self::with_clock(pipeline, trigger, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        pipeline: Arc<ReportPipeline>,
        trigger: DailyTrigger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pipeline,
            trigger,
            clock,
        }
    }

    /// Next trigger instant from now
    #[must_use]
    pub fn next_fire(&self) -> DateTime<Utc> {
        self.trigger
            .next_fire_after(self.clock.now(), self.pipeline.timezone())
    }

    /// Spawn the timer task. Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let first_fire = self.next_fire();
        let handle = tokio::spawn(self.run(first_fire, cancel.clone()));
        SchedulerHandle { cancel, handle }
    }

    async fn run(self, first_fire: DateTime<Utc>, cancel: CancellationToken) {
        let tz = self.pipeline.timezone();
        let mut fire_at = first_fire;
        log::info!(
            "Daily report scheduled at {} ({tz}); next run at {fire_at}",
            self.trigger
        );

        while sleep_until(self.clock.as_ref(), fire_at, &cancel).await {
            // Each firing reports the day it was scheduled for, even when
            // it runs late
            let report_date = fire_at.with_timezone(&tz).date_naive();
            self.pipeline.run(Some(report_date)).await;

            fire_at = self
                .trigger
                .next_fire_after(fire_at.max(self.clock.now()), tz);
            log::info!("Next daily report at {fire_at}");
        }

        log::info!("Report scheduler stopped");
    }
}

/// Running scheduler; dropping it leaves the task running
pub struct SchedulerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the timer. A run already in progress is never interrupted:
    /// its report is delivered and stored before this returns.
    pub async fn stop(self) {
        let Self { cancel, mut handle } = self;
        cancel.cancel();
        let joined = match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                log::warn!(
                    "Report run still in progress after {SHUTDOWN_GRACE:?}, waiting for it to finish"
                );
                handle.await
            }
        };
        if let Err(e) = joined {
            log::warn!("Report scheduler ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use worklog_ai::{
        create_provider, AiProvider, CompletionRequest, ProviderConfig, ProviderKind,
        ReportComposer,
    };
    use worklog_integrations::{DeliverySink, SlackWebhook};
    use worklog_storage::{ActivityStore, Database, WindowSession};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn trigger(s: &str) -> DailyTrigger {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_trigger() {
        assert_eq!(trigger("18:00"), DailyTrigger::new(18, 0).unwrap());
        assert_eq!(trigger(" 7:05 "), DailyTrigger::new(7, 5).unwrap());
        assert_eq!(trigger("00:00").to_string(), "00:00");
        assert_eq!(trigger("7:05").to_string(), "07:05");

        assert_eq!("24:00".parse::<DailyTrigger>(), Err(TriggerParseError::Hour(24)));
        assert_eq!("12:60".parse::<DailyTrigger>(), Err(TriggerParseError::Minute(60)));
        for bad in ["1800", "12:5", "123:00", "ab:cd", "-1:30", "12:00:00", ""] {
            assert!(
                matches!(bad.parse::<DailyTrigger>(), Err(TriggerParseError::Format(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_next_fire_same_day_and_next_day() {
        let t = trigger("18:00");
        assert_eq!(t.next_fire_after(utc(2024, 6, 3, 9, 0), Tz::UTC), utc(2024, 6, 3, 18, 0));
        assert_eq!(t.next_fire_after(utc(2024, 6, 3, 18, 0), Tz::UTC), utc(2024, 6, 4, 18, 0));
        assert_eq!(t.next_fire_after(utc(2024, 6, 3, 20, 0), Tz::UTC), utc(2024, 6, 4, 18, 0));
    }

    #[test]
    fn test_next_fire_in_local_timezone() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        // 18:00 JST is 09:00 UTC
        let fire = trigger("18:00").next_fire_after(utc(2024, 6, 3, 10, 0), tokyo);
        assert_eq!(fire, utc(2024, 6, 4, 9, 0));
    }

    #[test]
    fn test_nonexistent_time_fires_after_gap() {
        let new_york: Tz = "America/New_York".parse().unwrap();
        // 02:30 does not exist on 2024-03-10; 03:00 EDT is 07:00 UTC
        let fire = trigger("02:30").next_fire_after(utc(2024, 3, 10, 0, 0), new_york);
        assert_eq!(fire, utc(2024, 3, 10, 7, 0));
    }

    #[test]
    fn test_ambiguous_time_fires_on_first_occurrence() {
        let new_york: Tz = "America/New_York".parse().unwrap();
        // 01:30 happens twice on 2024-11-03; the EDT one is 05:30 UTC
        let t = trigger("01:30");
        let fire = t.next_fire_after(utc(2024, 11, 3, 0, 0), new_york);
        assert_eq!(fire, utc(2024, 11, 3, 5, 30));

        // Only once that day: the next firing is the following day
        let next = t.next_fire_after(fire, new_york);
        assert_eq!(next, utc(2024, 11, 4, 6, 30));
    }

    fn placeholder_pipeline(db: Arc<Database>) -> Arc<ReportPipeline> {
        let provider = create_provider(&ProviderConfig {
            provider: ProviderKind::Ollama,
            ..ProviderConfig::default()
        })
        .unwrap();
        let sink = SlackWebhook::new("http://127.0.0.1:9/unused").unwrap();
        Arc::new(ReportPipeline::new(
            db,
            ReportComposer::new(provider),
            Arc::new(sink),
            Tz::UTC,
        ))
    }

    #[tokio::test]
    async fn test_scheduler_fires_for_scheduled_day() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let clock = ManualClock::new(utc(2024, 6, 3, 17, 59) + chrono::Duration::seconds(59));
        let scheduler = ReportScheduler::with_clock(
            placeholder_pipeline(db.clone()),
            trigger("18:00"),
            clock.clone(),
        );
        assert_eq!(scheduler.next_fire(), utc(2024, 6, 3, 18, 0));

        let handle = scheduler.start();
        // Wall clock jumps past the trigger (e.g. machine woke up the next morning)
        clock.set(utc(2024, 6, 4, 8, 0));

        let june3 = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let mut report = None;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            report = db.find_report_by_date(june3).unwrap();
            if report.is_some() {
                break;
            }
        }
        assert!(report.is_some());
        assert!(!handle.is_finished());

        handle.stop().await;
        assert_eq!(db.list_daily_reports(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_before_first_fire() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let clock = ManualClock::new(utc(2024, 6, 3, 9, 0));
        let handle =
            ReportScheduler::with_clock(placeholder_pipeline(db.clone()), trigger("18:00"), clock)
                .start();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let started = std::time::Instant::now();
        handle.stop().await;
        assert!(started.elapsed() < SHUTDOWN_GRACE);
        assert!(db.list_daily_reports(10).unwrap().is_empty());
    }

    struct FixedProvider;

    #[async_trait]
    impl AiProvider for FixedProvider {
        async fn generate(&self, _request: &CompletionRequest) -> anyhow::Result<String> {
            Ok("Coding all day.".to_string())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    /// Accepts every message, slowly
    struct SlowSink {
        entered: Notify,
        delay: Duration,
    }

    #[async_trait]
    impl DeliverySink for SlowSink {
        async fn deliver(&self, _text: &str) -> bool {
            self.entered.notify_one();
            tokio::time::sleep(self.delay).await;
            true
        }

        fn channel(&self) -> &str {
            "slack"
        }
    }

    #[tokio::test]
    async fn test_stop_lets_running_report_finish() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let start = utc(2024, 6, 3, 9, 0);
        db.insert_session(&WindowSession::closed(
            "code".into(),
            "main.rs".into(),
            start,
            start + chrono::Duration::hours(2),
        ))
        .unwrap();

        let sink = Arc::new(SlowSink {
            entered: Notify::new(),
            delay: Duration::from_millis(300),
        });
        let clock = ManualClock::new(utc(2024, 6, 3, 17, 59));
        let pipeline = Arc::new(ReportPipeline::with_clock(
            db.clone(),
            ReportComposer::new(Arc::new(FixedProvider)),
            sink.clone(),
            Tz::UTC,
            clock.clone(),
        ));
        let handle = ReportScheduler::with_clock(pipeline, trigger("18:00"), clock.clone()).start();
        clock.set(utc(2024, 6, 3, 18, 1));

        tokio::time::timeout(Duration::from_secs(5), sink.entered.notified())
            .await
            .expect("report run never reached delivery");
        handle.stop().await;

        let june3 = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let report = db.find_report_by_date(june3).unwrap().unwrap();
        assert_eq!(report.report_text, "Coding all day.");
        assert!(report.is_sent());
    }
}
