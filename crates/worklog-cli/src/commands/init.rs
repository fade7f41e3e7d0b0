//! First-time setup: config file, database, platform hints

use anyhow::Result;
use std::path::PathBuf;
use worklog_core::config::{self, Settings};
use worklog_storage::Database;

/// # Errors
///
/// Returns an error if the config file or the database cannot be created
pub fn init_command(config_path: Option<PathBuf>) -> Result<()> {
    println!("Initializing worklog...\n");

    println!("Step 1/3: Configuration");
    println!("{}", "-".repeat(40));
    let config_path = match config_path {
        Some(path) => path,
        None => config::config_path()?,
    };
    if Settings::write_default(&config_path)? {
        println!("Wrote default config to {}", config_path.display());
    } else {
        println!("Keeping existing config at {}", config_path.display());
    }
    let settings = Settings::load_file(&config_path)?;

    println!("\nStep 2/3: Database");
    println!("{}", "-".repeat(40));
    let db_path = settings
        .database_path
        .clone()
        .unwrap_or_else(Database::default_db_path);
    Database::new(Some(db_path.clone()))?;
    println!("Database ready at {}", db_path.display());

    println!("\nStep 3/3: System Requirements");
    println!("{}", "-".repeat(40));
    show_platform_guidance();

    println!("\nSet these before `worklog run`:");
    println!("  SLACK_WEBHOOK_URL   Slack Incoming Webhook for the daily report");
    println!("  OPENAI_API_KEY      unless ai.provider is set to ollama");
    println!("\nThe report runs daily at {} ({}).", settings.report_time, settings.timezone);
    println!("Change it with: worklog config set report_time HH:MM");

    Ok(())
}

fn show_platform_guidance() {
    if cfg!(target_os = "macos") {
        println!("worklog reads the frontmost window through System Events.");
        println!("Grant your terminal Accessibility access in");
        println!("  System Settings > Privacy & Security > Accessibility");
    } else if cfg!(target_os = "linux") {
        println!("worklog reads the active X11 window with xdotool.");
        println!("Install it with your package manager, e.g. `sudo apt install xdotool`.");
        println!("Wayland sessions without XWayland report no activity.");
    } else if cfg!(target_os = "windows") {
        println!("No extra setup needed on Windows.");
    } else {
        println!("This platform has no foreground window support; no activity will be recorded.");
    }
}
