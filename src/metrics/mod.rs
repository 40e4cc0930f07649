//! Prometheus metrics for the analytics engine.
//!
//! Covers dashboard computations, per-ticket evaluation volume, SLA table
//! fallbacks, dataset loading and rollup writes. Scheduler job metrics live in
//! `crate::scheduler`.
//!
//! # Example
//! ```no_run
//! use ticket_sla_analytics::metrics::{self, DASHBOARD_COMPUTATIONS_TOTAL};
//!
//! metrics::init_metrics().ok();
//! DASHBOARD_COMPUTATIONS_TOTAL.with_label_values(&["success"]).inc();
//! println!("{}", metrics::gather_metrics());
//! ```
use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};

const NAMESPACE: &str = "ticket_sla";

lazy_static! {
    /// Global Prometheus registry for engine metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Dashboard Metrics
    // ============================================================================

    /// Dashboard computations
    ///
    /// Labels: outcome (success, invalid_range, upstream_error, error)
    pub static ref DASHBOARD_COMPUTATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("dashboard_computations_total", "Total number of dashboard computations")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create DASHBOARD_COMPUTATIONS_TOTAL metric");

    /// Wall time of one dashboard computation, fetches included
    pub static ref DASHBOARD_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "dashboard_duration_seconds",
            "Dashboard computation duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    ).expect("Failed to create DASHBOARD_DURATION_SECONDS metric");

    /// Tickets run through the per-ticket calculator
    ///
    /// Labels: pass (current, previous, rollup)
    pub static ref TICKETS_EVALUATED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("tickets_evaluated_total", "Total number of tickets evaluated")
            .namespace(NAMESPACE),
        &["pass"]
    ).expect("Failed to create TICKETS_EVALUATED_TOTAL metric");

    // ============================================================================
    // SLA Configuration Metrics
    // ============================================================================

    /// Times the built-in SLA defaults were used
    ///
    /// Labels: reason (empty_table, invalid_row)
    pub static ref SLA_CONFIG_FALLBACKS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("sla_config_fallbacks_total", "Total number of SLA configuration fallbacks")
            .namespace(NAMESPACE),
        &["reason"]
    ).expect("Failed to create SLA_CONFIG_FALLBACKS_TOTAL metric");

    // ============================================================================
    // Storage Metrics
    // ============================================================================

    /// Event rows dropped or clamped while loading a dataset
    ///
    /// Labels: reason (ignored_type, rejected, clamped_timestamp)
    pub static ref DATASET_EVENTS_DROPPED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("dataset_events_dropped_total", "Total number of dataset event rows dropped")
            .namespace(NAMESPACE),
        &["reason"]
    ).expect("Failed to create DATASET_EVENTS_DROPPED_TOTAL metric");

    /// Rollup runs
    ///
    /// Labels: outcome (success, error)
    pub static ref ROLLUP_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("rollup_runs_total", "Total number of rollup runs")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create ROLLUP_RUNS_TOTAL metric");

    /// Daily rollup rows upserted
    pub static ref ROLLUP_ROWS_WRITTEN_TOTAL: Counter = Counter::with_opts(
        Opts::new("rollup_rows_written_total", "Total number of daily rollup rows written")
            .namespace(NAMESPACE)
    ).expect("Failed to create ROLLUP_ROWS_WRITTEN_TOTAL metric");
}

/// Register all engine metrics with the global registry
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register_collector(&*DASHBOARD_COMPUTATIONS_TOTAL)?;
    register_collector(&*DASHBOARD_DURATION_SECONDS)?;
    register_collector(&*TICKETS_EVALUATED_TOTAL)?;
    register_collector(&*SLA_CONFIG_FALLBACKS_TOTAL)?;
    register_collector(&*DATASET_EVENTS_DROPPED_TOTAL)?;
    register_collector(&*ROLLUP_RUNS_TOTAL)?;
    register_collector(&*ROLLUP_ROWS_WRITTEN_TOTAL)?;

    tracing::debug!("Prometheus metrics initialized");
    Ok(())
}

/// Register one collector, treating an existing registration as success
pub fn register_collector<C: Collector + Clone + 'static>(collector: &C) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(Box::new(collector.clone())) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Prometheus text exposition of the engine registry
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
