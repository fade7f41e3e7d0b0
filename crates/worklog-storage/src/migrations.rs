use anyhow::Result;
use rusqlite::Connection;

/// Initialize database schema
///
/// # Errors
///
/// Returns an error if database table creation or index creation fails
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Window sessions - one row per closed foreground interval
    conn.execute(
        "CREATE TABLE IF NOT EXISTS window_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            process_name TEXT NOT NULL,
            window_title TEXT NOT NULL DEFAULT '',
            started_at TEXT NOT NULL,
            ended_at TEXT,
            duration_seconds REAL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_window_sessions_process ON window_sessions(process_name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_window_sessions_started ON window_sessions(started_at)",
        [],
    )?;

    // Daily reports - at most one row per calendar day
    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            report_date TEXT NOT NULL UNIQUE,
            report_text TEXT NOT NULL,
            sent_at TEXT,
            channel TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // App settings - non-secret key/value overrides
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}
