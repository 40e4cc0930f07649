use crate::error::Result;
use crate::models::{
    EngineerId, EventKind, SlaConfigRow, Ticket, TicketAssignment, TicketEvent, TicketId,
    TicketMetricsDaily,
};
use crate::state::{RollupStore, TicketQuery, TicketSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// In-memory ticket and rollup store (for the CLI dataset mode and testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tickets: Arc<DashMap<TicketId, Ticket>>,
    events: Arc<DashMap<TicketId, Vec<TicketEvent>>>,
    assignments: Arc<DashMap<TicketId, Vec<TicketAssignment>>>,
    sla_rows: Arc<RwLock<Vec<SlaConfigRow>>>,
    rollups: Arc<DashMap<NaiveDate, TicketMetricsDaily>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_ticket(&self, ticket: Ticket) {
        tracing::debug!(ticket_id = %ticket.id, "Ticket stored");
        self.tickets.insert(ticket.id, ticket);
    }

    /// Append an event; per-ticket insertion order is kept
    pub fn append_event(&self, event: TicketEvent) {
        self.events.entry(event.ticket_id).or_default().push(event);
    }

    pub fn insert_assignment(&self, assignment: TicketAssignment) {
        self.assignments
            .entry(assignment.ticket_id)
            .or_default()
            .push(assignment);
    }

    pub fn set_sla_config(&self, rows: Vec<SlaConfigRow>) {
        *self.sla_rows.write() = rows;
    }

    pub fn ticket_count(&self) -> usize {
        self.tickets.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.iter().map(|entry| entry.value().len()).sum()
    }
}

#[async_trait]
impl TicketSource for InMemoryStore {
    async fn fetch_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        // Oldest first, id as tie-breaker so output is stable
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        tracing::debug!(count = tickets.len(), "Tickets fetched");
        Ok(tickets)
    }

    async fn fetch_active_assignments(
        &self,
        ticket_ids: Option<&[TicketId]>,
        engineer_ids: Option<&[EngineerId]>,
    ) -> Result<Vec<TicketAssignment>> {
        let ticket_set: Option<HashSet<&TicketId>> = ticket_ids.map(|ids| ids.iter().collect());

        let mut assignments: Vec<TicketAssignment> = self
            .assignments
            .iter()
            .filter(|entry| {
                ticket_set
                    .as_ref()
                    .map(|set| set.contains(entry.key()))
                    .unwrap_or(true)
            })
            .flat_map(|entry| entry.value().clone())
            .filter(|assignment| assignment.is_active())
            .filter(|assignment| {
                engineer_ids
                    .map(|ids| ids.contains(&assignment.engineer_id))
                    .unwrap_or(true)
            })
            .collect();

        assignments.sort_by(|a, b| {
            a.assigned_at
                .cmp(&b.assigned_at)
                .then(a.ticket_id.cmp(&b.ticket_id))
        });

        Ok(assignments)
    }

    async fn fetch_events(
        &self,
        ticket_ids: &[TicketId],
        kinds: &[EventKind],
    ) -> Result<Vec<TicketEvent>> {
        let mut events = Vec::new();

        for ticket_id in ticket_ids {
            if let Some(entry) = self.events.get(ticket_id) {
                events.extend(
                    entry
                        .value()
                        .iter()
                        .filter(|event| kinds.is_empty() || kinds.contains(&event.kind()))
                        .cloned(),
                );
            }
        }

        tracing::debug!(
            tickets = ticket_ids.len(),
            count = events.len(),
            "Events fetched"
        );
        Ok(events)
    }

    async fn fetch_sla_config(&self) -> Result<Vec<SlaConfigRow>> {
        Ok(self.sla_rows.read().clone())
    }
}

#[async_trait]
impl RollupStore for InMemoryStore {
    async fn upsert_daily(&self, rows: &[TicketMetricsDaily]) -> Result<usize> {
        for row in rows {
            self.rollups.insert(row.day, row.clone());
        }
        Ok(rows.len())
    }

    async fn daily_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TicketMetricsDaily>> {
        let mut rows: Vec<TicketMetricsDaily> = self
            .rollups
            .iter()
            .filter(|entry| *entry.key() >= start && *entry.key() <= end)
            .map(|entry| entry.value().clone())
            .collect();

        rows.sort_by_key(|row| row.day);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TicketStatus};
    use crate::state::TicketFilter;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_fetch_tickets_with_filter() {
        let store = InMemoryStore::new();
        let now = Utc::now();

        for i in 0..5 {
            let priority = if i % 2 == 0 { Priority::Urgent } else { Priority::Low };
            store.insert_ticket(Ticket::new(
                format!("Ticket {}", i),
                priority,
                "IT",
                now - Duration::hours(i),
            ));
        }

        let query = TicketQuery {
            filter: TicketFilter {
                priorities: vec![Priority::Urgent],
                ..Default::default()
            },
            ..Default::default()
        };

        let tickets = store.fetch_tickets(&query).await.unwrap();
        assert_eq!(tickets.len(), 3); // 0, 2, 4
        assert!(tickets.iter().all(|t| t.priority == Priority::Urgent));
        assert!(tickets.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_fetch_events_by_kind_keeps_order() {
        let store = InMemoryStore::new();
        let ticket = Ticket::new("Laptop", Priority::Medium, "IT", Utc::now());
        let at = ticket.created_at;

        store.append_event(TicketEvent::assigned(ticket.id, at, "eng-1"));
        store.append_event(TicketEvent::status_changed(
            ticket.id,
            at,
            Some(TicketStatus::Open),
            TicketStatus::InProgress,
        ));
        store.append_event(TicketEvent::status_changed(
            ticket.id,
            at,
            Some(TicketStatus::InProgress),
            TicketStatus::Resolved,
        ));

        let all = store.fetch_events(&[ticket.id], &[]).await.unwrap();
        assert_eq!(all.len(), 3);

        let status_only = store
            .fetch_events(&[ticket.id], &[EventKind::StatusChanged])
            .await
            .unwrap();
        assert_eq!(status_only.len(), 2);
        assert_eq!(
            status_only[1].status_change().unwrap().new_status,
            TicketStatus::Resolved
        );
    }

    #[tokio::test]
    async fn test_active_assignments_only() {
        let store = InMemoryStore::new();
        let ticket = Ticket::new("VPN", Priority::High, "IT", Utc::now());
        let at = ticket.created_at;

        let mut old = TicketAssignment::new(ticket.id, "eng-1", at);
        old.unassigned_at = Some(at + Duration::minutes(5));
        store.insert_assignment(old);
        store.insert_assignment(TicketAssignment::new(ticket.id, "eng-2", at + Duration::minutes(5)));

        let active = store
            .fetch_active_assignments(Some(&[ticket.id]), None)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].engineer_id, "eng-2");

        let by_engineer = store
            .fetch_active_assignments(None, Some(&["eng-1".to_string()]))
            .await
            .unwrap();
        assert!(by_engineer.is_empty());
    }

    #[tokio::test]
    async fn test_rollup_upsert_replaces_by_day() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let day = now.date_naive();

        let mut row = TicketMetricsDaily::empty(day, now);
        row.opened = 3;
        store.upsert_daily(&[row.clone()]).await.unwrap();

        row.opened = 5;
        store.upsert_daily(&[row]).await.unwrap();

        let rows = store.daily_range(day, day).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].opened, 5);
    }
}
