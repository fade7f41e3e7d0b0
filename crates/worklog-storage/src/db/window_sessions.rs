use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use rusqlite::params;

use super::helpers::{format_timestamp, parse_datetime, parse_optional_datetime};
use super::Database;
use crate::day::local_day_bounds;
use crate::models::{ProcessSeconds, WindowSession};

impl Database {
    /// Insert a closed window session
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert operation fails
    pub fn insert_window_session(&self, session: &WindowSession) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO window_sessions
             (process_name, window_title, started_at, ended_at, duration_seconds, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.process_name,
                session.window_title,
                format_timestamp(session.started_at),
                session.ended_at.map(format_timestamp),
                session.duration_seconds,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Sessions that started on the local day `date` in `tz`, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is corrupted
    pub fn sessions_for_day(
        &self,
        date: NaiveDate,
        tz: Tz,
        limit: usize,
    ) -> Result<Vec<WindowSession>> {
        let (start, end) = local_day_bounds(date, tz);
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, process_name, window_title, started_at, ended_at, duration_seconds
             FROM window_sessions
             WHERE started_at >= ?1 AND started_at < ?2
             ORDER BY started_at DESC
             LIMIT ?3",
        )?;

        let sessions = stmt
            .query_map(
                params![
                    format_timestamp(start),
                    format_timestamp(end),
                    i64::try_from(limit).unwrap_or(i64::MAX)
                ],
                Self::row_to_window_session,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Total session seconds per process for the local day `date` in `tz`.
    ///
    /// Membership is decided by the start instant only: a session crossing
    /// local midnight counts entirely toward the day it started.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn process_totals_for_day(&self, date: NaiveDate, tz: Tz) -> Result<Vec<ProcessSeconds>> {
        let (start, end) = local_day_bounds(date, tz);
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT process_name, COALESCE(SUM(duration_seconds), 0.0) AS total_seconds
             FROM window_sessions
             WHERE started_at >= ?1 AND started_at < ?2
             GROUP BY process_name
             ORDER BY total_seconds DESC, process_name ASC",
        )?;

        let totals = stmt
            .query_map(
                params![format_timestamp(start), format_timestamp(end)],
                |row| {
                    Ok(ProcessSeconds {
                        process_name: row.get(0)?,
                        total_seconds: row.get(1)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(totals)
    }

    fn row_to_window_session(row: &rusqlite::Row) -> rusqlite::Result<WindowSession> {
        Ok(WindowSession {
            id: Some(row.get(0)?),
            process_name: row.get(1)?,
            window_title: row.get(2)?,
            started_at: parse_datetime(&row.get::<_, String>(3)?)?,
            ended_at: parse_optional_datetime(row.get(4)?)?,
            duration_seconds: row.get(5)?,
        })
    }
}
