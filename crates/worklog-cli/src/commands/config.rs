/// Stored settings command handlers
use anyhow::Result;
use tabled::{Table, Tabled};
use worklog_core::config::SETTING_KEYS;
use worklog_core::Settings;

use super::context::AppContext;

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Stored")]
    stored: String,
}

pub fn handle_config_get(ctx: &AppContext, key: &str) -> Result<()> {
    println!("{key} = {}", ctx.settings.get(key)?);
    Ok(())
}

pub fn handle_config_set(ctx: &AppContext, key: &str, value: &str) -> Result<()> {
    // Validate and normalize before anything is written
    let mut scratch = Settings::default();
    scratch.set(key, value)?;
    let normalized = scratch.get(key)?;

    ctx.db.set_app_setting(key, &normalized)?;
    println!("Set {key} = {normalized}");
    if key == "poll_interval_seconds" || key == "report_time" || key == "timezone" {
        println!("Restart `worklog run` for the change to take effect.");
    }
    Ok(())
}

pub fn handle_config_unset(ctx: &AppContext, key: &str) -> Result<()> {
    if ctx.db.delete_app_setting(key)? {
        println!("Removed stored {key}");
    } else {
        println!("{key} is not stored");
    }
    Ok(())
}

pub fn handle_config_list(ctx: &AppContext) -> Result<()> {
    let stored = ctx.db.list_app_settings()?;

    let rows = SETTING_KEYS
        .iter()
        .map(|&key| -> Result<SettingRow> {
            Ok(SettingRow {
                key: key.to_string(),
                value: ctx.settings.get(key)?,
                stored: stored
                    .iter()
                    .find(|setting| setting.key == key)
                    .map(|setting| setting.value.clone())
                    .unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    println!("Config file: {}\n", ctx.config_path.display());
    println!("{}", Table::new(rows));
    println!("\nEnvironment variables (WORKLOG_*, SLACK_WEBHOOK_URL, OPENAI_API_KEY) take precedence.");
    Ok(())
}
