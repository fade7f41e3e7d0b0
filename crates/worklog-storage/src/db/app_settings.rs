//! App settings database operations

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::helpers::{format_timestamp, parse_datetime};
use super::Database;
use crate::models::AppSetting;

impl Database {
    /// Get a setting value by key
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_app_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a setting
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub fn set_app_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO app_settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value, format_timestamp(Utc::now())],
        )?;
        Ok(())
    }

    /// Remove a setting. Returns whether a row existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub fn delete_app_setting(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM app_settings WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    /// All settings ordered by key
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn list_app_settings(&self) -> Result<Vec<AppSetting>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key, value, updated_at FROM app_settings ORDER BY key")?;
        let settings = stmt
            .query_map([], |row| {
                Ok(AppSetting {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: parse_datetime(&row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_overwrite_delete() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_app_setting("report_time").unwrap(), None);

        db.set_app_setting("report_time", "17:30").unwrap();
        db.set_app_setting("report_time", "18:15").unwrap();
        assert_eq!(db.get_app_setting("report_time").unwrap().as_deref(), Some("18:15"));

        db.set_app_setting("timezone", "Europe/Berlin").unwrap();
        let keys: Vec<String> = db.list_app_settings().unwrap().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["report_time", "timezone"]);

        assert!(db.delete_app_setting("report_time").unwrap());
        assert!(!db.delete_app_setting("report_time").unwrap());
    }
}
