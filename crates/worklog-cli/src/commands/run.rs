use anyhow::{Context, Result};
use worklog_core::WorklogService;

use super::context::AppContext;

/// Track and report until Ctrl-C
///
/// # Errors
///
/// Returns an error if the service cannot be configured
pub async fn run_command(ctx: &AppContext) -> Result<()> {
    let trigger = ctx.settings.trigger()?;
    let service = WorklogService::from_settings(&ctx.settings, ctx.db.clone())?;

    service.start();
    let scheduler = service.scheduler(trigger);
    log::info!("Next daily report at {}", scheduler.next_fire());
    let scheduler = scheduler.start();

    println!("worklog is running. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    log::info!("Shutting down");
    scheduler.stop().await;
    service.stop().await;
    Ok(())
}
