use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};

use super::helpers::{format_date, format_timestamp, parse_date, parse_optional_datetime};
use super::Database;
use crate::models::DailyReport;

const REPORT_COLUMNS: &str = "id, report_date, report_text, sent_at, channel, created_at";

impl Database {
    /// Insert or overwrite the report for `report.report_date`.
    ///
    /// Text, sent timestamp and channel are replaced; `created_at` of an
    /// existing row is kept. Concurrent writers for the same date: last
    /// writer wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub fn upsert_daily_report(&self, report: &DailyReport) -> Result<()> {
        self.conn().execute(
            "INSERT INTO daily_reports (report_date, report_text, sent_at, channel, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(report_date) DO UPDATE SET
                report_text = excluded.report_text,
                sent_at = excluded.sent_at,
                channel = excluded.channel",
            params![
                format_date(report.report_date),
                report.report_text,
                report.sent_at.map(format_timestamp),
                report.channel,
                format_timestamp(report.created_at.unwrap_or_else(Utc::now)),
            ],
        )?;
        Ok(())
    }

    /// Get the report for a calendar day
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_daily_report(&self, date: NaiveDate) -> Result<Option<DailyReport>> {
        let report = self
            .conn()
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM daily_reports WHERE report_date = ?1"),
                params![format_date(date)],
                Self::row_to_daily_report,
            )
            .optional()?;
        Ok(report)
    }

    /// Most recent report by date
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn latest_daily_report(&self) -> Result<Option<DailyReport>> {
        let report = self
            .conn()
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM daily_reports ORDER BY report_date DESC LIMIT 1"),
                [],
                Self::row_to_daily_report,
            )
            .optional()?;
        Ok(report)
    }

    /// Stored reports, newest date first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn list_daily_reports(&self, limit: usize) -> Result<Vec<DailyReport>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM daily_reports ORDER BY report_date DESC LIMIT ?1"
        ))?;

        let reports = stmt
            .query_map(
                params![i64::try_from(limit).unwrap_or(i64::MAX)],
                Self::row_to_daily_report,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reports)
    }

    fn row_to_daily_report(row: &rusqlite::Row) -> rusqlite::Result<DailyReport> {
        Ok(DailyReport {
            id: Some(row.get(0)?),
            report_date: parse_date(&row.get::<_, String>(1)?)?,
            report_text: row.get(2)?,
            sent_at: parse_optional_datetime(row.get(3)?)?,
            channel: row.get(4)?,
            created_at: parse_optional_datetime(row.get(5)?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_upsert_inserts_then_overwrites() {
        let db = Database::open_in_memory().unwrap();
        let sent = Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap();

        db.upsert_daily_report(&DailyReport::new(date(3), "first".into()).mark_sent(sent, Some("slack".into())))
            .unwrap();
        let first = db.get_daily_report(date(3)).unwrap().unwrap();
        assert_eq!(first.sent_at, Some(sent));

        db.upsert_daily_report(&DailyReport::new(date(3), "second".into())).unwrap();
        let second = db.get_daily_report(date(3)).unwrap().unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.report_text, "second");
        assert_eq!(second.sent_at, None);
        assert_eq!(second.channel, None);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(db.list_daily_reports(100).unwrap().len(), 1);
    }

    #[test]
    fn test_get_missing_report() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_daily_report(date(1)).unwrap().is_none());
        assert!(db.latest_daily_report().unwrap().is_none());
    }

    #[test]
    fn test_list_and_latest_order_by_date() {
        let db = Database::open_in_memory().unwrap();
        for day in [2, 5, 3] {
            db.upsert_daily_report(&DailyReport::new(date(day), format!("day {day}")))
                .unwrap();
        }

        let reports = db.list_daily_reports(2).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].report_date, date(5));
        assert_eq!(reports[1].report_date, date(3));
        assert_eq!(db.latest_daily_report().unwrap().unwrap().report_date, date(5));
    }
}
