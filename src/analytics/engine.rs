//! Analytics engine: fetches rows for a dashboard query and computes the payload

use crate::analytics::aggregation::MetricsAggregator;
use crate::analytics::comparison::{PeriodComparator, PREVIOUS_PERIOD_EVENT_KINDS};
use crate::analytics::dashboard::{compute_dashboard, DashboardInputs, DashboardPayload, DashboardQuery};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::ticket_metrics::ResolutionPolicy;
use crate::error::Result;
use crate::metrics::{
    DASHBOARD_COMPUTATIONS_TOTAL, DASHBOARD_DURATION_SECONDS, SLA_CONFIG_FALLBACKS_TOTAL,
    TICKETS_EVALUATED_TOTAL,
};
use crate::models::{
    default_sla_targets, Priority, SlaConfigRow, SlaPolicy, Ticket, TicketEvent, TicketId,
};
use crate::state::{TicketFilter, TicketQuery, TicketSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for the analytics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Built-in SLA targets in minutes, keyed by priority label
    #[serde(default = "default_sla_target_labels")]
    pub sla_targets: HashMap<String, i64>,

    /// Which resolution counts after a reopen
    #[serde(default)]
    pub resolution_policy: ResolutionPolicy,

    /// Engineers shown on the leaderboard
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,

    /// Engineers shown in the workload table
    #[serde(default = "default_workload_size")]
    pub workload_size: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            sla_targets: default_sla_target_labels(),
            resolution_policy: ResolutionPolicy::default(),
            leaderboard_size: default_leaderboard_size(),
            workload_size: default_workload_size(),
        }
    }
}

impl AnalyticsConfig {
    /// Configured default targets, falling back to the built-in value for
    /// any priority the table leaves out
    pub fn default_targets(&self) -> HashMap<Priority, i64> {
        let mut targets = default_sla_targets();

        for (label, minutes) in &self.sla_targets {
            match Priority::from_str(label) {
                Ok(priority) if *minutes > 0 => {
                    targets.insert(priority, *minutes);
                }
                _ => {
                    tracing::warn!(priority = %label, minutes, "Ignoring configured SLA default");
                }
            }
        }

        targets
    }

    /// SLA policy from stored rows over the configured defaults. Fallbacks are
    /// counted in `SLA_CONFIG_FALLBACKS_TOTAL`.
    pub fn sla_policy(&self, rows: &[SlaConfigRow]) -> SlaPolicy {
        let policy = SlaPolicy::from_rows(rows, &self.default_targets());

        if rows.is_empty() {
            SLA_CONFIG_FALLBACKS_TOTAL
                .with_label_values(&["empty_table"])
                .inc();
        }
        if policy.rejected_rows() > 0 {
            SLA_CONFIG_FALLBACKS_TOTAL
                .with_label_values(&["invalid_row"])
                .inc_by(policy.rejected_rows() as f64);
        }

        policy
    }

    pub fn aggregator(&self) -> MetricsAggregator {
        MetricsAggregator::new(self.leaderboard_size, self.workload_size)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.leaderboard_size == 0 || self.workload_size == 0 {
            return Err(AnalyticsError::InvalidConfiguration(
                "leaderboard_size and workload_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_sla_target_labels() -> HashMap<String, i64> {
    default_sla_targets()
        .into_iter()
        .map(|(priority, minutes)| (priority.to_string().to_lowercase(), minutes))
        .collect()
}

fn default_leaderboard_size() -> usize {
    6
}

fn default_workload_size() -> usize {
    8
}

/// Main analytics engine
///
/// Stateless between calls: every dashboard is computed from a fresh fetch.
pub struct AnalyticsEngine {
    source: Arc<dyn TicketSource>,
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    /// Create a new analytics engine
    pub fn new(source: Arc<dyn TicketSource>, config: AnalyticsConfig) -> Self {
        Self { source, config }
    }

    /// Create with default configuration
    pub fn with_defaults(source: Arc<dyn TicketSource>) -> Self {
        Self::new(source, AnalyticsConfig::default())
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Compute the dashboard for `query` as of `now`
    pub async fn dashboard(
        &self,
        query: &DashboardQuery,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<DashboardPayload> {
        let timer = DASHBOARD_DURATION_SECONDS.start_timer();
        let result = self.compute(query, now).await;
        timer.observe_duration();

        let outcome = match &result {
            Ok(_) => "success",
            Err(AnalyticsError::InvalidDateRange(_)) => "invalid_range",
            Err(AnalyticsError::UpstreamFetch(_)) => "upstream_error",
            Err(_) => "error",
        };
        DASHBOARD_COMPUTATIONS_TOTAL
            .with_label_values(&[outcome])
            .inc();

        if let Err(e) = &result {
            tracing::error!(error = %e, outcome, "Dashboard computation failed");
        }

        result
    }

    async fn compute(
        &self,
        query: &DashboardQuery,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<DashboardPayload> {
        query.window.validate()?;
        self.config.validate()?;

        let tickets = self.source.fetch_tickets(&query.ticket_query()).await?;
        let tickets = self.restrict_to_engineers(tickets, &query.filter).await?;
        let ticket_ids: Vec<TicketId> = tickets.iter().map(|t| t.id).collect();

        tracing::debug!(
            tickets = ticket_ids.len(),
            domain = ?query.domain,
            start = %query.window.start,
            end = %query.window.end,
            "Fetched window tickets"
        );

        let previous_query = PeriodComparator::previous_query(
            query.domain.as_deref(),
            &query.filter,
            &query.window,
        );

        let (assignments, events, sla_rows, (previous_tickets, previous_events)) = futures::try_join!(
            self.source.fetch_active_assignments(Some(ticket_ids.as_slice()), None),
            self.source.fetch_events(&ticket_ids, &[]),
            self.source.fetch_sla_config(),
            self.fetch_previous_period(&previous_query),
        )?;

        let sla = self.config.sla_policy(&sla_rows);

        TICKETS_EVALUATED_TOTAL
            .with_label_values(&["previous"])
            .inc_by(previous_tickets.len() as f64);
        let previous = PeriodComparator::evaluate_previous(
            previous_tickets,
            previous_events,
            &sla,
            self.config.resolution_policy,
            now,
        );

        TICKETS_EVALUATED_TOTAL
            .with_label_values(&["current"])
            .inc_by(tickets.len() as f64);
        let inputs = DashboardInputs {
            tickets,
            events,
            assignments,
            sla,
            previous,
        };

        let payload = compute_dashboard(query, inputs, &self.config, now);

        tracing::info!(
            total = payload.summary.total,
            resolved = payload.summary.resolved,
            breached = payload.summary.breached,
            previous_total = payload.comparison.total.previous,
            "Dashboard computed"
        );

        Ok(payload)
    }

    /// Tickets and status events for the preceding period
    async fn fetch_previous_period(
        &self,
        query: &TicketQuery,
    ) -> Result<(Vec<Ticket>, Vec<TicketEvent>)> {
        let tickets = self.source.fetch_tickets(query).await?;
        let tickets = self.restrict_to_engineers(tickets, &query.filter).await?;
        let ticket_ids: Vec<TicketId> = tickets.iter().map(|t| t.id).collect();

        let events = self
            .source
            .fetch_events(&ticket_ids, PREVIOUS_PERIOD_EVENT_KINDS)
            .await?;

        Ok((tickets, events))
    }

    /// Keep tickets actively assigned to one of the filtered engineers
    async fn restrict_to_engineers(
        &self,
        tickets: Vec<Ticket>,
        filter: &TicketFilter,
    ) -> Result<Vec<Ticket>> {
        if !filter.has_engineer_filter() || tickets.is_empty() {
            return Ok(tickets);
        }

        let ticket_ids: Vec<TicketId> = tickets.iter().map(|t| t.id).collect();
        let assigned: HashSet<TicketId> = self
            .source
            .fetch_active_assignments(Some(ticket_ids.as_slice()), Some(filter.engineer_ids.as_slice()))
            .await?
            .into_iter()
            .map(|a| a.ticket_id)
            .collect();

        Ok(tickets
            .into_iter()
            .filter(|t| assigned.contains(&t.id))
            .collect())
    }
}
