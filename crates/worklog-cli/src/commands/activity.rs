/// Stats and session listing command handlers
use anyhow::Result;
use chrono::NaiveDate;
use tabled::{Table, Tabled};
use worklog_core::daily_stats;

use super::context::AppContext;
use super::helpers::{format_duration, local_time, truncate_str};

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Application")]
    application: String,
    #[tabled(rename = "Minutes")]
    minutes: String,
}

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Process")]
    process: String,
    #[tabled(rename = "Window")]
    title: String,
}

pub fn handle_stats(ctx: &AppContext, date: Option<NaiveDate>) -> Result<()> {
    let tz = ctx.tz()?;
    let date = ctx.date_or_today(date)?;
    let stats = daily_stats(ctx.db.as_ref(), date, tz)?;

    if stats.is_empty() {
        println!("No activity recorded on {date} ({tz}).");
        return Ok(());
    }

    let total: f64 = stats.iter().map(|usage| usage.total_minutes).sum();
    let rows: Vec<StatsRow> = stats
        .into_iter()
        .map(|usage| StatsRow {
            application: usage.process_name,
            minutes: format!("{:.1}", usage.total_minutes),
        })
        .collect();

    println!("Activity on {date} ({tz})\n");
    println!("{}", Table::new(rows));
    println!("\nTotal: {total:.1} minutes");
    Ok(())
}

pub fn handle_activity(ctx: &AppContext, date: Option<NaiveDate>, limit: usize) -> Result<()> {
    let tz = ctx.tz()?;
    let date = ctx.date_or_today(date)?;
    let sessions = ctx.db.sessions_for_day(date, tz, limit)?;

    if sessions.is_empty() {
        println!("No sessions recorded on {date} ({tz}).");
        return Ok(());
    }

    let count = sessions.len();
    let rows: Vec<SessionRow> = sessions
        .into_iter()
        .map(|session| SessionRow {
            start: local_time(session.started_at, tz, "%H:%M:%S"),
            end: session
                .ended_at
                .map(|end| local_time(end, tz, "%H:%M:%S"))
                .unwrap_or_default(),
            duration: session
                .duration_seconds
                .map(format_duration)
                .unwrap_or_default(),
            process: session.process_name,
            title: truncate_str(&session.window_title, 60),
        })
        .collect();

    println!("Sessions on {date} ({tz}), newest first\n");
    println!("{}", Table::new(rows));
    if count == limit {
        println!("\nShowing the latest {limit}; use --limit to see more.");
    }
    Ok(())
}
