mod commands;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::context::AppContext;

#[derive(Parser)]
#[command(name = "worklog")]
#[command(about = "Foreground window tracking with daily Slack reports", long_about = None)]
struct Cli {
    /// Use this config file instead of the one in the data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database and a default config file
    Init,
    /// Track windows and send the daily report until Ctrl-C
    Run,
    /// Generate and send the report right now
    SendNow {
        /// Report date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Per-application time for a day
    Stats {
        /// Day to aggregate (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Sessions recorded on a day, newest first
    Activity {
        /// Day to list (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Maximum number of sessions
        #[arg(short, long, default_value_t = 500)]
        limit: usize,
    },
    /// Stored daily reports, newest first
    Reports {
        /// Maximum number of reports
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },
    /// Print one stored report
    Report {
        /// Report date (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// Schedule, delivery settings and the latest report
    Status,
    /// Manage stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective value of a setting
    Get { key: String },
    /// Store a setting (overrides config.toml)
    Set { key: String, value: String },
    /// Remove a stored setting
    Unset { key: String },
    /// Show all settings
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = cli.config;
    let load = || AppContext::load(config.clone());

    match cli.command {
        Commands::Init => commands::init::init_command(config.clone()),
        Commands::Run => commands::run::run_command(&load()?).await,
        Commands::SendNow { date } => commands::report::handle_send_now(&load()?, date).await,
        Commands::Stats { date } => commands::activity::handle_stats(&load()?, date),
        Commands::Activity { date, limit } => {
            commands::activity::handle_activity(&load()?, date, limit)
        }
        Commands::Reports { limit } => commands::report::handle_reports(&load()?, limit),
        Commands::Report { date } => commands::report::handle_report(&load()?, date),
        Commands::Status => commands::report::handle_status(&load()?),
        Commands::Config { action } => {
            let ctx = load()?;
            match action {
                ConfigAction::Get { key } => commands::config::handle_config_get(&ctx, &key),
                ConfigAction::Set { key, value } => {
                    commands::config::handle_config_set(&ctx, &key, &value)
                }
                ConfigAction::Unset { key } => commands::config::handle_config_unset(&ctx, &key),
                ConfigAction::List => commands::config::handle_config_list(&ctx),
            }
        }
    }
}
