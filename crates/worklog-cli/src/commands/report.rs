/// Report command handlers
use anyhow::Result;
use chrono::NaiveDate;
use tabled::{Table, Tabled};
use worklog_core::WorklogService;
use worklog_storage::DailyReport;

use super::context::AppContext;
use super::helpers::{local_time, truncate_str};

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Sent")]
    sent: String,
    #[tabled(rename = "Channel")]
    channel: String,
    #[tabled(rename = "Report")]
    preview: String,
}

fn sent_label(report: &DailyReport, ctx: &AppContext) -> Result<String> {
    Ok(match report.sent_at {
        Some(at) => local_time(at, ctx.tz()?, "%Y-%m-%d %H:%M"),
        None => "not sent".to_string(),
    })
}

pub async fn handle_send_now(ctx: &AppContext, date: Option<NaiveDate>) -> Result<()> {
    let service = WorklogService::from_settings(&ctx.settings, ctx.db.clone())?;
    let outcome = match date {
        Some(date) => service.run_pipeline_for(date).await,
        None => service.run_pipeline_now().await,
    };

    println!("{}: {}", outcome.report_date, outcome.message);
    if !outcome.success {
        anyhow::bail!("Daily report for {} did not complete", outcome.report_date);
    }
    Ok(())
}

pub fn handle_reports(ctx: &AppContext, limit: usize) -> Result<()> {
    let reports = ctx.db.list_daily_reports(limit)?;
    if reports.is_empty() {
        println!("No reports yet. Generate one with: worklog send-now");
        return Ok(());
    }

    let rows = reports
        .iter()
        .map(|report| -> Result<ReportRow> {
            Ok(ReportRow {
                date: report.report_date.to_string(),
                sent: sent_label(report, ctx)?,
                channel: report.channel.clone().unwrap_or_default(),
                preview: truncate_str(&report.report_text.replace('\n', " "), 60),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    println!("{}", Table::new(rows));
    Ok(())
}

pub fn handle_report(ctx: &AppContext, date: NaiveDate) -> Result<()> {
    let Some(report) = ctx.db.get_daily_report(date)? else {
        println!("No report stored for {date}.");
        return Ok(());
    };

    println!("Daily report for {date}");
    println!("{}", "=".repeat(40));
    println!("{}\n", report.report_text);
    match &report.channel {
        Some(channel) => println!("Sent: {} via {channel}", sent_label(&report, ctx)?),
        None => println!("Sent: {}", sent_label(&report, ctx)?),
    }
    Ok(())
}

pub fn handle_status(ctx: &AppContext) -> Result<()> {
    let settings = &ctx.settings;
    let tz = ctx.tz()?;
    let trigger = settings.trigger()?;
    let next = trigger.next_fire_after(chrono::Utc::now(), tz);

    println!("worklog status");
    println!("{}", "-".repeat(40));
    println!("Config file:    {}", ctx.config_path.display());
    println!("Daily report:   {trigger} ({tz})");
    println!("Next report:    {}", local_time(next, tz, "%Y-%m-%d %H:%M"));
    println!("Poll interval:  {}s", settings.poll_interval_seconds());
    println!(
        "Provider:       {} ({})",
        settings.ai.provider,
        settings.ai.effective_model()
    );
    println!(
        "Slack webhook:  {}",
        if settings.webhook_url().is_ok() { "configured" } else { "missing" }
    );

    match ctx.db.latest_daily_report()? {
        Some(report) => println!(
            "Latest report:  {} ({})",
            report.report_date,
            sent_label(&report, ctx)?
        ),
        None => println!("Latest report:  none"),
    }
    Ok(())
}
