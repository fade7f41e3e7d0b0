//! Layered settings: `config.toml`, then `app_settings` rows, then the
//! environment.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use worklog_ai::ProviderConfig;
use worklog_storage::AppSetting;

use crate::scheduler::{DailyTrigger, TriggerParseError};

pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_DB_PATH: &str = "WORKLOG_DB_PATH";

/// Environment variables for keys that can also be stored in `app_settings`
const ENV_KEYS: &[(&str, &str)] = &[
    ("WORKLOG_REPORT_TIME", "report_time"),
    ("WORKLOG_TIMEZONE", "timezone"),
    ("WORKLOG_POLL_INTERVAL_SECONDS", "poll_interval_seconds"),
    ("WORKLOG_AI_PROVIDER", "ai.provider"),
    ("WORKLOG_AI_MODEL", "ai.model"),
    ("WORKLOG_AI_BASE_URL", "ai.base_url"),
];

/// Non-secret keys accepted by `config set`
pub const SETTING_KEYS: &[&str] = &[
    "report_time",
    "timezone",
    "poll_interval_seconds",
    "ai.provider",
    "ai.model",
    "ai.base_url",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid report_time: {0}")]
    ReportTime(#[from] TriggerParseError),
    #[error("unknown timezone {0:?} (expected an IANA name such as Europe/Berlin)")]
    Timezone(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    #[error("unknown setting {0:?} (known: {known})", known = SETTING_KEYS.join(", "))]
    UnknownKey(String),
    #[error("Slack webhook URL is not configured (set SLACK_WEBHOOK_URL)")]
    MissingWebhookUrl,
}

/// Get the local data directory for worklog.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("worklog");
    Ok(path)
}

/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn config_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("config.toml"))
}

fn parse_timezone(value: &str) -> Result<Tz, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Timezone(value.to_string()))
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Local `HH:MM` at which the daily report runs
    pub report_time: String,
    /// IANA timezone for report days and the trigger
    pub timezone: String,
    pub poll_interval_seconds: u64,
    pub database_path: Option<PathBuf>,
    pub slack_webhook_url: Option<String>,
    pub ai: ProviderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            report_time: DailyTrigger::default().to_string(),
            timezone: "UTC".to_string(),
            poll_interval_seconds: 5,
            database_path: None,
            slack_webhook_url: None,
            ai: ProviderConfig::default(),
        }
    }
}

impl Settings {
    /// Read `path`, falling back to defaults when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Write a default config file unless one already exists.
    /// Returns whether a file was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }

    /// Apply stored overrides, then the environment, then validate
    ///
    /// # Errors
    ///
    /// Returns an error on the first invalid value
    pub fn layered(
        mut self,
        stored: &[AppSetting],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        self.apply_stored(stored)?;
        self.apply_env(env)?;
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns an error if a known key holds an invalid value
    pub fn apply_stored(&mut self, stored: &[AppSetting]) -> Result<(), ConfigError> {
        for setting in stored {
            match self.set(&setting.key, &setting.value) {
                Err(ConfigError::UnknownKey(key)) => {
                    log::warn!("Ignoring unknown stored setting {key:?}");
                }
                other => other?,
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let env = |name: &str| env(name).and_then(|value| non_empty(&value));

        for &(name, key) in ENV_KEYS {
            if let Some(value) = env(name) {
                self.set(key, &value)?;
            }
        }
        if let Some(url) = env(ENV_SLACK_WEBHOOK_URL) {
            self.slack_webhook_url = Some(url);
        }
        if let Some(key) = env(ENV_OPENAI_API_KEY) {
            self.ai.api_key = Some(key);
        }
        if let Some(path) = env(ENV_DB_PATH) {
            self.database_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Set one of [`SETTING_KEYS`] from its string form
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys or invalid values
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "report_time" => self.report_time = value.parse::<DailyTrigger>()?.to_string(),
            "timezone" => self.timezone = parse_timezone(value)?.name().to_string(),
            "poll_interval_seconds" => {
                self.poll_interval_seconds = value.parse().map_err(|_| invalid())?;
            }
            "ai.provider" => self.ai.provider = value.parse().map_err(|_| invalid())?,
            "ai.model" => self.ai.model = non_empty(value),
            "ai.base_url" => self.ai.base_url = non_empty(value),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Effective value of one of [`SETTING_KEYS`]
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        Ok(match key {
            "report_time" => self.report_time.clone(),
            "timezone" => self.timezone.clone(),
            "poll_interval_seconds" => self.poll_interval_seconds.to_string(),
            "ai.provider" => self.ai.provider.to_string(),
            "ai.model" => self.ai.effective_model().to_string(),
            "ai.base_url" => self.ai.effective_base_url().to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the report time or timezone is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trigger()?;
        self.tz()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if `report_time` is not `HH:MM`
    pub fn trigger(&self) -> Result<DailyTrigger, ConfigError> {
        Ok(self.report_time.parse()?)
    }

    /// # Errors
    ///
    /// Returns an error if `timezone` is not a known IANA name
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.timezone)
    }

    /// Poll interval, never below one second
    #[must_use]
    pub fn poll_interval_seconds(&self) -> u64 {
        self.poll_interval_seconds.max(1)
    }

    /// # Errors
    ///
    /// Returns an error if no webhook URL is configured
    pub fn webhook_url(&self) -> Result<&str, ConfigError> {
        self.slack_webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingWebhookUrl)
    }
}
