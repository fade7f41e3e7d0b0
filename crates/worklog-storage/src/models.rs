use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One continuous period of a window being in the foreground
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSession {
    pub id: Option<i64>,
    pub process_name: String,
    pub window_title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
}

impl WindowSession {
    /// Build a closed session for the interval `[started_at, ended_at]`.
    ///
    /// An end instant earlier than the start (wall clock stepped backwards)
    /// is clamped to the start, so the duration is never negative.
    #[must_use]
    pub fn closed(
        process_name: String,
        window_title: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let ended_at = ended_at.max(started_at);
        Self {
            id: None,
            process_name,
            window_title,
            started_at,
            ended_at: Some(ended_at),
            duration_seconds: Some(duration_seconds_between(started_at, ended_at)),
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Elapsed seconds between two instants, keeping sub-second precision.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn duration_seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end.signed_duration_since(start);
    let seconds = delta.num_microseconds().map_or_else(
        || delta.num_milliseconds() as f64 / 1_000.0,
        |micros| micros as f64 / 1_000_000.0,
    );
    seconds.max(0.0)
}

/// Generated report text and send metadata for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub id: Option<i64>,
    pub report_date: NaiveDate,
    pub report_text: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub channel: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl DailyReport {
    #[must_use]
    pub fn new(report_date: NaiveDate, report_text: String) -> Self {
        Self {
            id: None,
            report_date,
            report_text,
            sent_at: None,
            channel: None,
            created_at: None,
        }
    }

    /// Record a successful delivery
    #[must_use]
    pub fn mark_sent(mut self, sent_at: DateTime<Utc>, channel: Option<String>) -> Self {
        self.sent_at = Some(sent_at);
        self.channel = channel;
        self
    }

    #[must_use]
    pub const fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }
}

/// Summed session time for one process on one local day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSeconds {
    pub process_name: String,
    pub total_seconds: f64,
}

/// Active time for one process on one local day, in minutes rounded to one decimal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessUsage {
    pub process_name: String,
    pub total_minutes: f64,
}

/// Non-secret setting managed from the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSetting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_closed_session_duration() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let end = start + Duration::milliseconds(12_500);
        let session = WindowSession::closed("code".into(), "main.rs".into(), start, end);

        assert!(!session.is_open());
        assert_eq!(session.ended_at, Some(end));
        assert!((session.duration_seconds.unwrap() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_closed_session_clamps_backwards_clock() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let end = start - Duration::seconds(3);
        let session = WindowSession::closed("code".into(), String::new(), start, end);

        assert_eq!(session.ended_at, Some(start));
        assert_eq!(session.duration_seconds, Some(0.0));
    }

    #[test]
    fn test_mark_sent() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let report = DailyReport::new(date, "text".into());
        assert!(!report.is_sent());

        let at = Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap();
        let report = report.mark_sent(at, Some("slack".into()));
        assert!(report.is_sent());
        assert_eq!(report.channel.as_deref(), Some("slack"));
    }
}
