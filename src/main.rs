use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ticket_sla_analytics::{
    analytics::{AnalyticsEngine, DashboardQuery, ReportWindow, RollupWriter},
    config::{Config, ObservabilityConfig},
    models::{Priority, TicketStatus},
    scheduler::{init_scheduler_metrics, SchedulerService},
    state::{create_rollup_store, InMemoryStore, TicketDataset, TicketFilter},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ticket-sla")]
#[command(about = "Ticket SLA & analytics aggregation", version, long_about = None)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "TICKET_SLA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the dashboard payload for a date range
    Report {
        #[command(flatten)]
        range: RangeArgs,

        /// Restrict to one domain (case-insensitive)
        #[arg(short, long)]
        domain: Option<String>,

        #[arg(long, value_delimiter = ',')]
        status: Vec<TicketStatus>,

        #[arg(long, value_delimiter = ',')]
        priority: Vec<Priority>,

        #[arg(long, value_delimiter = ',')]
        category: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        subcategory: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        project: Vec<String>,

        /// Engineer IDs; tickets need an active assignment to one of them
        #[arg(long, value_delimiter = ',')]
        engineer: Vec<String>,

        /// Print Prometheus metrics to stderr after the payload
        #[arg(long)]
        metrics: bool,
    },

    /// Recompute and store daily rollup rows
    Rollup {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Run the rollup job on its cron schedule until interrupted
    Schedule {
        /// Ticket export (JSON)
        #[arg(long)]
        dataset: PathBuf,
    },
}

#[derive(Args)]
struct RangeArgs {
    /// Ticket export (JSON)
    #[arg(long)]
    dataset: PathBuf,

    /// First day, YYYY-MM-DD
    #[arg(long)]
    from: NaiveDate,

    /// Last day, YYYY-MM-DD (inclusive)
    #[arg(long)]
    to: NaiveDate,

    /// Reference instant (RFC 3339); defaults to the current time
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

impl RangeArgs {
    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(&path.to_string_lossy()),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config.observability);

    if config.observability.prometheus_enabled {
        if let Err(e) = ticket_sla_analytics::metrics::init_metrics()
            .and_then(|_| init_scheduler_metrics())
        {
            tracing::warn!(error = %e, "Failed to initialize metrics, continuing without them");
        }
    }

    match cli.command {
        Commands::Report {
            range,
            domain,
            status,
            priority,
            category,
            subcategory,
            project,
            engineer,
            metrics,
        } => {
            let store = load_dataset(&range.dataset)?;
            let engine = AnalyticsEngine::new(store, config.analytics.clone());

            let window = ReportWindow::from_days(range.from, range.to)?;
            let mut query = DashboardQuery::new(window).with_filter(TicketFilter {
                statuses: status,
                priorities: priority,
                categories: category,
                subcategories: subcategory,
                project_codes: project,
                engineer_ids: engineer,
            });
            if let Some(domain) = domain {
                query = query.with_domain(domain);
            }

            let payload = engine.dashboard(&query, range.now()).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);

            if metrics {
                eprintln!("{}", ticket_sla_analytics::metrics::gather_metrics());
            }
        }

        Commands::Rollup { range } => {
            if !config.rollup.is_persistent() {
                tracing::warn!("Rollup backend is in-memory; rows will be discarded on exit");
            }
            let store = load_dataset(&range.dataset)?;
            let rollup_store = create_rollup_store(&config.rollup)?;
            let writer = RollupWriter::new(
                store,
                rollup_store,
                config.analytics.clone(),
                config.rollup.lookback_days,
            );

            let written = writer.run(range.from, range.to, range.now()).await?;
            println!("{}", written);
        }

        Commands::Schedule { dataset } => {
            let store = load_dataset(&dataset)?;
            let rollup_store = create_rollup_store(&config.rollup)?;
            let writer = Arc::new(RollupWriter::new(
                store,
                rollup_store,
                config.analytics.clone(),
                config.rollup.lookback_days,
            ));

            let mut scheduler = SchedulerService::new(config.scheduler.clone()).await?;
            scheduler.register_daily_rollup(writer).await?;
            scheduler.start().await?;

            tracing::info!("Scheduler running, press Ctrl-C to stop");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;

            scheduler.shutdown().await?;
            let stats = scheduler.get_stats().await;
            tracing::info!(
                executions = stats.total_executions,
                failures = stats.total_failures,
                "Scheduler stopped"
            );
        }
    }

    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("ticket_sla_analytics={}", observability.log_level).into()
    });

    // Logs go to stderr so stdout stays machine-readable
    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_dataset(path: &Path) -> anyhow::Result<Arc<InMemoryStore>> {
    let dataset = TicketDataset::from_path(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let (store, report) = dataset.into_store()?;

    if report.rejected_events > 0 {
        tracing::warn!(
            rejected_events = report.rejected_events,
            "Some event rows were rejected and will not count toward metrics"
        );
    }

    Ok(Arc::new(store))
}
