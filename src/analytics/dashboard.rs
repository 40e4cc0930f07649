//! Dashboard request and response types, and the pure compute pass behind them

use crate::analytics::aggregation::{
    AgingBucket, Breakdowns, EngineerPerformance, EngineerWorkload, LatencyMetrics,
    ReportWindow, SlaPriorityRow, SummaryCounters, TrendSeries,
};
use crate::analytics::comparison::{PeriodComparator, PeriodComparison, PeriodTotals};
use crate::analytics::engine::AnalyticsConfig;
use crate::analytics::ticket_metrics::{EvaluatedTicket, ResolutionPolicy};
use crate::analytics::timeline::TimelineIndex;
use crate::models::{SlaPolicy, Ticket, TicketAssignment, TicketEvent};
use crate::state::{RangeEnd, TicketFilter, TicketQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One dashboard read: a domain, a window and set filters
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardQuery {
    pub domain: Option<String>,
    pub window: ReportWindow,
    pub filter: TicketFilter,
}

impl DashboardQuery {
    pub fn new(window: ReportWindow) -> Self {
        Self {
            domain: None,
            window,
            filter: TicketFilter::default(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_filter(mut self, filter: TicketFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Tickets created inside the window under the row-level filters
    pub fn ticket_query(&self) -> TicketQuery {
        TicketQuery {
            domain: self.domain.clone(),
            created_from: Some(self.window.start),
            created_until: Some(RangeEnd::Inclusive(self.window.end)),
            filter: self.filter.clone(),
        }
    }
}

/// Full dashboard response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub generated_at: DateTime<Utc>,
    pub domain: Option<String>,
    pub window: ReportWindow,
    pub resolution_policy: ResolutionPolicy,
    pub summary: SummaryCounters,
    pub metrics: LatencyMetrics,
    pub breakdowns: Breakdowns,
    pub trends: TrendSeries,
    pub backlog_aging: Vec<AgingBucket>,
    pub leaderboard: Vec<EngineerPerformance>,
    pub workload: Vec<EngineerWorkload>,
    pub comparison: PeriodComparison,
    pub sla_table: Vec<SlaPriorityRow>,
}

/// Rows already fetched for one dashboard pass
#[derive(Debug, Clone)]
pub struct DashboardInputs {
    pub tickets: Vec<Ticket>,
    pub events: Vec<TicketEvent>,
    pub assignments: Vec<TicketAssignment>,
    pub sla: SlaPolicy,
    pub previous: PeriodTotals,
}

/// Compute the dashboard from fetched rows. Performs no I/O.
pub fn compute_dashboard(
    query: &DashboardQuery,
    inputs: DashboardInputs,
    config: &AnalyticsConfig,
    now: DateTime<Utc>,
) -> DashboardPayload {
    let DashboardInputs {
        tickets,
        events,
        assignments,
        sla,
        previous,
    } = inputs;

    let timelines = TimelineIndex::build(events);
    let evaluated =
        EvaluatedTicket::evaluate_all(tickets, &timelines, &sla, config.resolution_policy, now);

    let aggregation =
        config
            .aggregator()
            .aggregate(&evaluated, &assignments, &query.window, &sla, now);

    let comparison = PeriodComparator::compare(
        &query.window,
        PeriodTotals::from_evaluated(&evaluated),
        previous,
    );

    DashboardPayload {
        generated_at: now,
        domain: query.domain.clone(),
        window: query.window,
        resolution_policy: config.resolution_policy,
        summary: aggregation.summary,
        metrics: aggregation.metrics,
        breakdowns: aggregation.breakdowns,
        trends: aggregation.trends,
        backlog_aging: aggregation.backlog_aging,
        leaderboard: aggregation.leaderboard,
        workload: aggregation.workload,
        comparison,
        sla_table: aggregation.sla_table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_sla_targets, Priority, TicketStatus};
    use chrono::{Duration, NaiveDate};

    fn window() -> ReportWindow {
        ReportWindow::from_days(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_inputs_zero_fill() {
        let query = DashboardQuery::new(window()).with_domain("IT");
        let inputs = DashboardInputs {
            tickets: vec![],
            events: vec![],
            assignments: vec![],
            sla: SlaPolicy::from_defaults(&default_sla_targets()),
            previous: PeriodTotals::default(),
        };

        let payload = compute_dashboard(&query, inputs, &AnalyticsConfig::default(), window().end);

        assert_eq!(payload.summary.total, 0);
        assert_eq!(payload.trends.volume.len(), 7);
        assert_eq!(payload.trends.sla_breaches.len(), 7);
        assert_eq!(payload.backlog_aging.len(), 4);
        assert_eq!(payload.comparison.total.current, 0);
        assert_eq!(payload.domain.as_deref(), Some("IT"));
    }

    #[test]
    fn test_status_breakdown_sums_to_total() {
        let w = window();
        let now = w.end;
        let statuses = [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            TicketStatus::Resolved,
            TicketStatus::WaitingOnRequester,
        ];
        let tickets: Vec<Ticket> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                Ticket::new("Access", Priority::Medium, "IT", w.start + Duration::hours(i as i64))
                    .with_status(*status)
            })
            .collect();

        let inputs = DashboardInputs {
            tickets,
            events: vec![],
            assignments: vec![],
            sla: SlaPolicy::from_defaults(&default_sla_targets()),
            previous: PeriodTotals {
                total: 3,
                resolved: 1,
                breached: 0,
            },
        };

        let payload = compute_dashboard(&DashboardQuery::new(w), inputs, &AnalyticsConfig::default(), now);
        let sum: u64 = payload.breakdowns.by_status.values().sum();
        assert_eq!(sum, 5);
        assert_eq!(payload.breakdowns.by_status["RESOLVED"], 2);
        assert_eq!(payload.breakdowns.by_priority["MEDIUM"], 5);
        assert_eq!(payload.comparison.total.previous, 3);
        assert_eq!(payload.comparison.total.current, 5);
    }

    #[test]
    fn test_ticket_query_bounds() {
        let w = window();
        let query = DashboardQuery::new(w).ticket_query();
        assert_eq!(query.created_from, Some(w.start));
        assert_eq!(query.created_until, Some(RangeEnd::Inclusive(w.end)));
    }
}
