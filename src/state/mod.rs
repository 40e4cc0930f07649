pub mod dataset;
pub mod factory;
pub mod sled_store;
pub mod store;

pub use dataset::{DatasetLoadReport, TicketDataset};
pub use factory::{create_in_memory_store, create_rollup_store};
pub use sled_store::SledRollupStore;
pub use store::*;

use crate::error::Result;
use crate::models::{
    EngineerId, EventKind, Priority, SlaConfigRow, Ticket, TicketAssignment, TicketEvent,
    TicketId, TicketMetricsDaily, TicketStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Read access to ticket data owned by the ticket service
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Tickets matching the query, ordered by creation time
    async fn fetch_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>>;

    /// Active assignments (`unassigned_at` is null). `None` leaves a
    /// dimension unfiltered.
    async fn fetch_active_assignments(
        &self,
        ticket_ids: Option<&[TicketId]>,
        engineer_ids: Option<&[EngineerId]>,
    ) -> Result<Vec<TicketAssignment>>;

    /// Events of the given kinds for the given tickets
    async fn fetch_events(
        &self,
        ticket_ids: &[TicketId],
        kinds: &[EventKind],
    ) -> Result<Vec<TicketEvent>>;

    /// Stored SLA rows (may be empty)
    async fn fetch_sla_config(&self) -> Result<Vec<SlaConfigRow>>;
}

/// Persistence for daily rollup rows
#[async_trait]
pub trait RollupStore: Send + Sync {
    /// Insert or replace each row by its day; returns rows written
    async fn upsert_daily(&self, rows: &[TicketMetricsDaily]) -> Result<usize>;

    /// Rows for days in `[start, end]`, ordered by day
    async fn daily_range(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<TicketMetricsDaily>>;
}

/// Upper bound of a creation-time range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    Inclusive(DateTime<Utc>),
    Exclusive(DateTime<Utc>),
}

impl RangeEnd {
    pub fn admits(&self, instant: DateTime<Utc>) -> bool {
        match self {
            RangeEnd::Inclusive(end) => instant <= *end,
            RangeEnd::Exclusive(end) => instant < *end,
        }
    }
}

/// Set-membership filters shared by the current and previous period
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub statuses: Vec<TicketStatus>,
    pub priorities: Vec<Priority>,
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
    pub project_codes: Vec<String>,
    /// Applied through active assignments, not the ticket row
    pub engineer_ids: Vec<EngineerId>,
}

impl TicketFilter {
    /// Whether the ticket row passes every row-level filter
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let status_match = self.statuses.is_empty() || self.statuses.contains(&ticket.status);

        let priority_match =
            self.priorities.is_empty() || self.priorities.contains(&ticket.priority);

        let category_match = self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| c.trim().to_lowercase() == ticket.category_key());

        let subcategory_match = self.subcategories.is_empty()
            || self
                .subcategories
                .iter()
                .any(|s| s.trim().to_lowercase() == ticket.subcategory_key());

        let project_match = self.project_codes.is_empty()
            || ticket
                .project_code
                .as_ref()
                .map(|code| self.project_codes.contains(code))
                .unwrap_or(false);

        status_match && priority_match && category_match && subcategory_match && project_match
    }

    pub fn has_engineer_filter(&self) -> bool {
        !self.engineer_ids.is_empty()
    }
}

/// Ticket selection pushed down to the ticket store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketQuery {
    pub domain: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<RangeEnd>,
    pub filter: TicketFilter,
}

impl TicketQuery {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let domain_match = self
            .domain
            .as_ref()
            .map(|d| d.eq_ignore_ascii_case(&ticket.domain))
            .unwrap_or(true);

        let from_match = self
            .created_from
            .map(|from| ticket.created_at >= from)
            .unwrap_or(true);

        let until_match = self
            .created_until
            .map(|until| until.admits(ticket.created_at))
            .unwrap_or(true);

        domain_match && from_match && until_match && self.filter.matches(ticket)
    }
}
