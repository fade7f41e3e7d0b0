//! Settings and database shared by every command

use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::sync::Arc;
use worklog_core::config::{self, Settings, ENV_DB_PATH};
use worklog_storage::{today_in, Database};

pub struct AppContext {
    pub config_path: PathBuf,
    pub settings: Settings,
    pub db: Arc<Database>,
}

impl AppContext {
    /// Load settings from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file, database or a setting is invalid
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_with(config_path, |name| std::env::var(name).ok())
    }

    /// `config.toml`, then stored settings, then `env`
    pub fn load_with(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => config::config_path()?,
        };
        let file = Settings::load_file(&config_path)?;

        let db_path = env(ENV_DB_PATH)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| file.database_path.clone());
        let db = Arc::new(Database::new(db_path)?);

        let stored = db.list_app_settings()?;
        let settings = file.layered(&stored, env)?;

        Ok(Self {
            config_path,
            settings,
            db,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the configured timezone is invalid
    pub fn tz(&self) -> Result<Tz> {
        Ok(self.settings.tz()?)
    }

    /// `date`, or today in the configured timezone
    pub fn date_or_today(&self, date: Option<NaiveDate>) -> Result<NaiveDate> {
        match date {
            Some(date) => Ok(date),
            None => Ok(today_in(self.tz()?)),
        }
    }
}
