//! Scheduled batch tasks

use super::config::DailyRollupJobConfig;
use super::error::SchedulerResult;
use super::jobs::{Job, JobMetadata};
use crate::analytics::RollupWriter;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;

pub const DAILY_ROLLUP_JOB: &str = "daily_rollup";

/// Day range covered by a rollup run at `now`: the trailing `range_days`
/// days, today included
pub fn rollup_range(now: DateTime<Utc>, range_days: u32) -> (NaiveDate, NaiveDate) {
    let end = now.date_naive();
    let span = i64::from(range_days.max(1)) - 1;
    (end - Duration::days(span), end)
}

/// Recompute rollup rows for the trailing range
///
/// Default schedule: daily at 01:15 UTC (`0 15 1 * * *`)
pub async fn run_daily_rollup(
    writer: &RollupWriter,
    range_days: u32,
    now: DateTime<Utc>,
) -> SchedulerResult<usize> {
    let (start, end) = rollup_range(now, range_days);
    info!(%start, %end, "Starting daily rollup task");

    let written = writer.run(start, end, now).await?;

    info!(rows_written = written, "Daily rollup task completed");
    Ok(written)
}

/// Job wrapping [`run_daily_rollup`]; each tick uses the wall clock as "now"
pub fn daily_rollup_job(writer: Arc<RollupWriter>, config: &DailyRollupJobConfig) -> Job {
    let range_days = config.range_days;
    let metadata = JobMetadata::new(DAILY_ROLLUP_JOB, config.schedule.clone()).with_description(
        format!("Recompute daily ticket metrics for the trailing {} days", range_days),
    );

    Job::new(metadata, move || {
        let writer = writer.clone();
        async move {
            run_daily_rollup(&writer, range_days, Utc::now()).await?;
            Ok(())
        }
    })
}
