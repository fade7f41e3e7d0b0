use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use worklog_storage::{ActivityStore, ProcessSeconds, ProcessUsage};

/// Seconds to minutes, rounded to one decimal place
#[must_use]
pub fn round_minutes(seconds: f64) -> f64 {
    (seconds / 60.0 * 10.0).round() / 10.0
}

/// Per-process active time for the local calendar day `date` in `tz`.
///
/// Sessions count toward the day they started on, even when they run past
/// local midnight. Ordered by time spent, largest first, ties by name.
///
/// # Errors
///
/// Returns an error if the store query fails
pub fn daily_stats(store: &dyn ActivityStore, date: NaiveDate, tz: Tz) -> Result<Vec<ProcessUsage>> {
    let mut totals = store
        .query_aggregates(date, tz)
        .with_context(|| format!("Failed to aggregate sessions for {date}"))?;

    totals.sort_by(|a, b| {
        b.total_seconds
            .total_cmp(&a.total_seconds)
            .then_with(|| a.process_name.cmp(&b.process_name))
    });

    Ok(totals
        .into_iter()
        .map(|ProcessSeconds { process_name, total_seconds }| ProcessUsage {
            process_name,
            total_minutes: round_minutes(total_seconds),
        })
        .collect())
}
