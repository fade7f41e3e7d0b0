use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::db::Database;
use crate::models::{DailyReport, ProcessSeconds, WindowSession};

/// Persistence boundary used by the tracker and the report pipeline.
///
/// Every call is atomic on its own; callers never hold a transaction open
/// across calls. Implementations must be safe to share between the tracker
/// loop and the scheduler.
pub trait ActivityStore: Send + Sync {
    /// Persist one closed session, returning its row id
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    fn insert_session(&self, session: &WindowSession) -> Result<i64>;

    /// # Errors
    ///
    /// Returns an error if the read fails
    fn find_report_by_date(&self, date: NaiveDate) -> Result<Option<DailyReport>>;

    /// Insert or overwrite the report keyed by its date
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    fn upsert_report(&self, report: &DailyReport) -> Result<()>;

    /// Per-process summed seconds for sessions starting on the local day
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails
    fn query_aggregates(&self, date: NaiveDate, tz: Tz) -> Result<Vec<ProcessSeconds>>;
}

impl ActivityStore for Database {
    fn insert_session(&self, session: &WindowSession) -> Result<i64> {
        self.insert_window_session(session)
    }

    fn find_report_by_date(&self, date: NaiveDate) -> Result<Option<DailyReport>> {
        self.get_daily_report(date)
    }

    fn upsert_report(&self, report: &DailyReport) -> Result<()> {
        self.upsert_daily_report(report)
    }

    fn query_aggregates(&self, date: NaiveDate, tz: Tz) -> Result<Vec<ProcessSeconds>> {
        self.process_totals_for_day(date, tz)
    }
}
