//! Batch scheduling for rollup recomputation
//!
//! Runs the rollup writer on a cron schedule using tokio-cron-scheduler,
//! tracking per-job run counts, durations and Prometheus metrics.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ticket_sla_analytics::analytics::{AnalyticsConfig, RollupWriter};
//! use ticket_sla_analytics::scheduler::{SchedulerConfig, SchedulerService};
//! use ticket_sla_analytics::state::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let writer = Arc::new(RollupWriter::new(
//!         store.clone(),
//!         store,
//!         AnalyticsConfig::default(),
//!         90,
//!     ));
//!
//!     let mut scheduler = SchedulerService::new(SchedulerConfig::default()).await?;
//!     scheduler.register_daily_rollup(writer).await?;
//!     scheduler.start().await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     scheduler.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod jobs;
mod metrics;
mod tasks;

pub use config::{DailyRollupJobConfig, SchedulerConfig, SchedulerConfigBuilder};
pub use self::core::{SchedulerService, SchedulerStats};
pub use error::{SchedulerError, SchedulerResult};
pub use jobs::{Job, JobId, JobMetadata, JobStatus};
pub use metrics::{init_scheduler_metrics, SchedulerMetrics, SCHEDULER_METRICS};
pub use tasks::{daily_rollup_job, rollup_range, run_daily_rollup, DAILY_ROLLUP_JOB};
