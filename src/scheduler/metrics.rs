//! Prometheus metrics for scheduled jobs

use crate::metrics::register_collector;
use lazy_static::lazy_static;
use prometheus::{CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts};

/// Scheduler metrics collection
pub struct SchedulerMetrics {
    /// Number of registered jobs
    pub jobs_registered: Gauge,

    /// Job executions by outcome (success, failed, timeout)
    pub executions_total: CounterVec,

    /// Job execution duration in seconds
    pub execution_duration: HistogramVec,

    /// Number of currently running executions
    pub running_jobs: GaugeVec,

    /// Unix timestamp of the last execution
    pub last_execution: GaugeVec,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self {
            jobs_registered: Gauge::with_opts(
                Opts::new("scheduler_jobs_registered", "Number of registered jobs")
                    .namespace("ticket_sla"),
            )
            .expect("Failed to create scheduler_jobs_registered metric"),

            executions_total: CounterVec::new(
                Opts::new("scheduler_executions_total", "Total number of job executions")
                    .namespace("ticket_sla"),
                &["job_name", "outcome"],
            )
            .expect("Failed to create scheduler_executions_total metric"),

            execution_duration: HistogramVec::new(
                HistogramOpts::new(
                    "scheduler_execution_duration_seconds",
                    "Job execution duration in seconds",
                )
                .namespace("ticket_sla")
                .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
                &["job_name"],
            )
            .expect("Failed to create scheduler_execution_duration_seconds metric"),

            running_jobs: GaugeVec::new(
                Opts::new("scheduler_running_jobs", "Number of currently running jobs")
                    .namespace("ticket_sla"),
                &["job_name"],
            )
            .expect("Failed to create scheduler_running_jobs metric"),

            last_execution: GaugeVec::new(
                Opts::new(
                    "scheduler_last_execution_timestamp",
                    "Unix timestamp of last job execution",
                )
                .namespace("ticket_sla"),
                &["job_name"],
            )
            .expect("Failed to create scheduler_last_execution_timestamp metric"),
        }
    }

    /// Record job execution start
    pub fn record_execution_start(&self, job_name: &str) {
        self.running_jobs.with_label_values(&[job_name]).inc();
    }

    /// Record job execution completion
    pub fn record_execution_complete(&self, job_name: &str, outcome: &str, duration_secs: f64) {
        self.running_jobs.with_label_values(&[job_name]).dec();

        self.executions_total
            .with_label_values(&[job_name, outcome])
            .inc();

        self.execution_duration
            .with_label_values(&[job_name])
            .observe(duration_secs);

        self.last_execution
            .with_label_values(&[job_name])
            .set(chrono::Utc::now().timestamp() as f64);
    }

    pub fn update_job_count(&self, count: usize) {
        self.jobs_registered.set(count as f64);
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Global scheduler metrics instance
    pub static ref SCHEDULER_METRICS: SchedulerMetrics = SchedulerMetrics::new();
}

/// Register scheduler metrics with the engine registry (idempotent)
pub fn init_scheduler_metrics() -> Result<(), prometheus::Error> {
    register_collector(&SCHEDULER_METRICS.jobs_registered)?;
    register_collector(&SCHEDULER_METRICS.executions_total)?;
    register_collector(&SCHEDULER_METRICS.execution_duration)?;
    register_collector(&SCHEDULER_METRICS.running_jobs)?;
    register_collector(&SCHEDULER_METRICS.last_execution)?;
    Ok(())
}
