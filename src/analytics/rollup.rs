//! Batch pass that persists one metrics row per calendar day

use crate::analytics::aggregation::{bucket_by_day, day_range};
use crate::analytics::engine::AnalyticsConfig;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::statistics::rounded_mean;
use crate::analytics::ticket_metrics::EvaluatedTicket;
use crate::analytics::timeline::TimelineIndex;
use crate::metrics::{ROLLUP_ROWS_WRITTEN_TOTAL, ROLLUP_RUNS_TOTAL, TICKETS_EVALUATED_TOTAL};
use crate::models::TicketMetricsDaily;
use crate::state::{RangeEnd, RollupStore, TicketQuery, TicketSource};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;

/// Recomputes daily rollup rows from the ticket store and upserts them
pub struct RollupWriter {
    source: Arc<dyn TicketSource>,
    store: Arc<dyn RollupStore>,
    config: AnalyticsConfig,
    lookback_days: i64,
}

impl RollupWriter {
    pub fn new(
        source: Arc<dyn TicketSource>,
        store: Arc<dyn RollupStore>,
        config: AnalyticsConfig,
        lookback_days: i64,
    ) -> Self {
        Self {
            source,
            store,
            config,
            lookback_days: lookback_days.max(0),
        }
    }

    /// Recompute and upsert every day in `[start, end]`; returns rows written.
    /// Re-running with the same data and `now` writes identical rows.
    pub async fn run(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<usize> {
        let result = self.write(start, end, now).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        ROLLUP_RUNS_TOTAL.with_label_values(&[outcome]).inc();

        match &result {
            Ok(written) => {
                ROLLUP_ROWS_WRITTEN_TOTAL.inc_by(*written as f64);
                tracing::info!(%start, %end, rows = written, "Rollup rows written");
            }
            Err(e) => tracing::error!(%start, %end, error = %e, "Rollup run failed"),
        }

        result
    }

    async fn write(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<usize> {
        let rows = self.compute_rows(start, end, now).await?;

        self.store
            .upsert_daily(&rows)
            .await
            .map_err(|e| AnalyticsError::RollupWrite(e.to_string()))
    }

    /// Rows for `[start, end]` without writing them
    pub async fn compute_rows(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<TicketMetricsDaily>> {
        if start > end {
            return Err(AnalyticsError::InvalidDateRange(format!(
                "rollup start {} is after end {}",
                start, end
            )));
        }

        // Tickets opened before the range can still resolve inside it
        let created_from = Duration::try_days(self.lookback_days)
            .and_then(|lookback| start_of(start).checked_sub_signed(lookback))
            .ok_or_else(|| {
                AnalyticsError::InvalidConfiguration(format!(
                    "rollup lookback of {} days is out of range",
                    self.lookback_days
                ))
            })?;
        let query = TicketQuery {
            created_from: Some(created_from),
            created_until: Some(RangeEnd::Exclusive(start_of(end) + Duration::days(1))),
            ..Default::default()
        };

        let tickets = self.source.fetch_tickets(&query).await?;
        let ticket_ids: Vec<_> = tickets.iter().map(|t| t.id).collect();

        let (events, sla_rows) = futures::try_join!(
            self.source.fetch_events(&ticket_ids, &[]),
            self.source.fetch_sla_config(),
        )?;

        tracing::debug!(
            tickets = tickets.len(),
            events = events.len(),
            lookback_days = self.lookback_days,
            "Loaded rollup inputs"
        );

        let sla = self.config.sla_policy(&sla_rows);
        let timelines = TimelineIndex::build(events);

        TICKETS_EVALUATED_TOTAL
            .with_label_values(&["rollup"])
            .inc_by(tickets.len() as f64);
        let evaluated = EvaluatedTicket::evaluate_all(
            tickets,
            &timelines,
            &sla,
            self.config.resolution_policy,
            now,
        );

        Ok(daily_rows(&evaluated, &day_range(start, end), now))
    }
}

/// One row per day, zero-filled
pub fn daily_rows(
    evaluated: &[EvaluatedTicket],
    days: &[NaiveDate],
    now: DateTime<Utc>,
) -> Vec<TicketMetricsDaily> {
    bucket_by_day(evaluated, days)
        .into_iter()
        .map(|(day, bucket)| TicketMetricsDaily {
            day,
            opened: bucket.opened,
            resolved: bucket.resolved,
            sla_breached: bucket.sla_breached,
            mtta_minutes: rounded_mean(&bucket.ack_minutes),
            mttr_minutes: rounded_mean(&bucket.resolution_minutes),
            updated_at: now,
        })
        .collect()
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}
