//! Ticket SLA analytics
//!
//! Turns ticket rows and their append-only event log into service-level
//! metrics. One pass runs leaf-first:
//!
//! - **Timeline**: events grouped per ticket and ordered by time
//! - **Per-ticket metrics**: acknowledgement, waiting time, canonical
//!   resolution, SLA breach, reopen and first-contact resolution
//! - **Aggregation**: breakdowns, daily trend series, backlog aging,
//!   engineer leaderboard and workload, SLA table
//! - **Comparison**: totals against the preceding period of equal length
//! - **Rollup**: one persisted row per calendar day (batch only)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::{NaiveDate, Utc};
//! use ticket_sla_analytics::analytics::{AnalyticsEngine, DashboardQuery, ReportWindow};
//! use ticket_sla_analytics::state::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = AnalyticsEngine::with_defaults(Arc::new(InMemoryStore::new()));
//!
//!     let window = ReportWindow::from_days(
//!         NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//!     )?;
//!     let payload = engine
//!         .dashboard(&DashboardQuery::new(window).with_domain("IT"), Utc::now())
//!         .await?;
//!
//!     println!("{} tickets, {} breached", payload.summary.total, payload.summary.breached);
//!     Ok(())
//! }
//! ```

mod aggregation;
mod comparison;
mod dashboard;
mod engine;
mod error;
mod rollup;
mod statistics;
mod ticket_metrics;
mod timeline;

pub use aggregation::{
    bucket_by_day, day_range, AgingBucket, Aggregation, Breakdowns, DailyCount, DailyMinutes,
    DailyVolume, DayBucket, EngineerPerformance, EngineerWorkload, LatencyMetrics,
    MetricsAggregator, ReportWindow, SlaPriorityRow, SummaryCounters, TrendSeries, AGING_BANDS,
};
pub use comparison::{
    ComparisonPair, PeriodComparator, PeriodComparison, PeriodTotals,
    PREVIOUS_PERIOD_EVENT_KINDS,
};
pub use dashboard::{compute_dashboard, DashboardInputs, DashboardPayload, DashboardQuery};
pub use engine::{AnalyticsConfig, AnalyticsEngine};
pub use error::{AnalyticsError, AnalyticsResult};
pub use rollup::{daily_rows, RollupWriter};
pub use statistics::{mean, rate, rounded_mean, Percentiles, TrendAnalysis, TrendDirection};
pub use ticket_metrics::{
    acknowledgement_instant, minutes_between, resolution_instant, was_reopened,
    EvaluatedTicket, ResolutionPolicy, TicketMetrics,
};
pub use timeline::{status_intervals, status_segments, Interval, StatusSegment, TimelineIndex};
