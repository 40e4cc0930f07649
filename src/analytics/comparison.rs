//! Current-versus-previous period totals

use crate::analytics::aggregation::ReportWindow;
use crate::analytics::ticket_metrics::{EvaluatedTicket, ResolutionPolicy};
use crate::analytics::timeline::TimelineIndex;
use crate::models::{EventKind, SlaPolicy, Ticket, TicketEvent};
use crate::state::{RangeEnd, TicketFilter, TicketQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event kinds the previous period needs: resolution and breach only
pub const PREVIOUS_PERIOD_EVENT_KINDS: &[EventKind] = &[EventKind::StatusChanged];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPair {
    pub current: u64,
    pub previous: u64,
}

impl ComparisonPair {
    /// Signed change from the previous period
    pub fn delta(&self) -> i64 {
        self.current as i64 - self.previous as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    pub previous_start: Option<DateTime<Utc>>,
    pub previous_end: Option<DateTime<Utc>>,
    pub total: ComparisonPair,
    pub resolved: ComparisonPair,
    pub breached: ComparisonPair,
}

/// Totals for one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodTotals {
    pub total: u64,
    pub resolved: u64,
    pub breached: u64,
}

impl PeriodTotals {
    pub fn from_evaluated(evaluated: &[EvaluatedTicket]) -> Self {
        evaluated.iter().fold(Self::default(), |mut totals, item| {
            totals.total += 1;
            totals.resolved += u64::from(item.metrics.is_resolved());
            totals.breached += u64::from(item.metrics.is_breached);
            totals
        })
    }
}

/// Re-selects the preceding period of equal length and compares totals
pub struct PeriodComparator;

impl PeriodComparator {
    /// Ticket query for the period before `window`, under the same filters
    pub fn previous_query(
        domain: Option<&str>,
        filter: &TicketFilter,
        window: &ReportWindow,
    ) -> TicketQuery {
        let (start, end) = window.previous();
        TicketQuery {
            domain: domain.map(str::to_string),
            created_from: Some(start),
            created_until: Some(RangeEnd::Exclusive(end)),
            filter: filter.clone(),
        }
    }

    /// Evaluate previous-period tickets against their status events
    pub fn evaluate_previous(
        tickets: Vec<Ticket>,
        events: Vec<TicketEvent>,
        sla: &SlaPolicy,
        policy: ResolutionPolicy,
        now: DateTime<Utc>,
    ) -> PeriodTotals {
        let timelines = TimelineIndex::build(events);
        let evaluated = EvaluatedTicket::evaluate_all(tickets, &timelines, sla, policy, now);
        PeriodTotals::from_evaluated(&evaluated)
    }

    pub fn compare(
        window: &ReportWindow,
        current: PeriodTotals,
        previous: PeriodTotals,
    ) -> PeriodComparison {
        let (previous_start, previous_end) = window.previous();
        PeriodComparison {
            previous_start: Some(previous_start),
            previous_end: Some(previous_end),
            total: ComparisonPair {
                current: current.total,
                previous: previous.total,
            },
            resolved: ComparisonPair {
                current: current.resolved,
                previous: previous.resolved,
            },
            breached: ComparisonPair {
                current: current.breached,
                previous: previous.breached,
            },
        }
    }
}
