//! Shared fixtures for integration tests
//!
//! Builds small ticket histories in an [`InMemoryStore`] with explicit
//! timestamps so every scenario is reproducible.

#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use ticket_sla_analytics::models::{
    Priority, Ticket, TicketAssignment, TicketEvent, TicketId, TicketStatus,
};
use ticket_sla_analytics::state::InMemoryStore;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Builder over a fresh in-memory store
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
        }
    }

    /// Insert an open ticket with no events
    pub fn open(&self, priority: Priority, created_at: DateTime<Utc>) -> TicketId {
        self.insert(Ticket::new("Open ticket", priority, "IT", created_at))
    }

    /// Insert a ticket acknowledged after `ack` and resolved after `resolve`
    pub fn resolved(
        &self,
        priority: Priority,
        created_at: DateTime<Utc>,
        ack: Duration,
        resolve: Duration,
    ) -> TicketId {
        let ticket = Ticket::new("Resolved ticket", priority, "IT", created_at)
            .with_status(TicketStatus::Resolved);
        let id = self.insert(ticket);
        self.transition(id, created_at + ack, TicketStatus::Open, TicketStatus::InProgress);
        self.transition(
            id,
            created_at + resolve,
            TicketStatus::InProgress,
            TicketStatus::Resolved,
        );
        id
    }

    pub fn insert(&self, ticket: Ticket) -> TicketId {
        let id = ticket.id;
        self.store.insert_ticket(ticket);
        id
    }

    pub fn transition(
        &self,
        ticket_id: TicketId,
        at: DateTime<Utc>,
        from: TicketStatus,
        to: TicketStatus,
    ) {
        self.store
            .append_event(TicketEvent::status_changed(ticket_id, at, Some(from), to));
    }

    pub fn assign(&self, ticket_id: TicketId, engineer: &str, name: &str, at: DateTime<Utc>) {
        self.store
            .append_event(TicketEvent::assigned(ticket_id, at, engineer));
        self.store
            .insert_assignment(TicketAssignment::new(ticket_id, engineer, at).with_name(name));
    }
}

/// Dataset document in the export format read by the CLI
pub fn dataset_json() -> String {
    let ticket_id = "6f1c1f0e-3a43-4a8e-9f3e-0b6f1b7c2d11";
    let other_id = "0d9a7c55-58d1-4f0e-8c0e-51a4c3f0a7b2";

    serde_json::json!({
        "tickets": [
            {
                "id": ticket_id,
                "title": "VPN drops every hour",
                "priority": "HIGH",
                "status": "RESOLVED",
                "category": "Network",
                "domain": "IT",
                "createdAt": "2024-06-03T09:00:00Z",
                "resolvedAt": "2024-06-03T12:00:00Z"
            },
            {
                "id": other_id,
                "title": "New laptop request",
                "priority": "LOW",
                "status": "OPEN",
                "projectCode": "OPS",
                "domain": "IT",
                "createdAt": "2024-06-04T08:00:00Z"
            }
        ],
        "events": [
            {
                "ticketId": ticket_id,
                "type": "ASSIGNED",
                "payload": { "action": "assigned", "engineerId": "eng-1" },
                "createdAt": "2024-06-03T09:05:00Z"
            },
            {
                "ticketId": ticket_id,
                "type": "STATUS_CHANGED",
                "payload": { "oldStatus": "IN_PROGRESS", "newStatus": "RESOLVED" },
                "createdAt": "2024-06-03T11:00:00Z"
            },
            {
                "ticketId": ticket_id,
                "type": "COMMENT_ADDED",
                "payload": { "body": "rebooted the concentrator" },
                "createdAt": "2024-06-03T10:00:00Z"
            },
            {
                "ticketId": other_id,
                "type": "STATUS_CHANGED",
                "payload": { "status": "nonsense" },
                "createdAt": "2024-06-04T09:00:00Z"
            }
        ],
        "assignments": [
            {
                "ticketId": ticket_id,
                "engineerId": "eng-1",
                "engineerName": "Ada",
                "assignedAt": "2024-06-03T09:05:00Z"
            }
        ],
        "slaConfig": [
            { "priority": "HIGH", "targetMinutes": 240 },
            { "priority": "CRITICAL", "targetMinutes": 10 }
        ]
    })
    .to_string()
}

/// Per-day opened counts keyed by day, for quick assertions
pub fn opened_by_day(
    volume: &[ticket_sla_analytics::analytics::DailyVolume],
) -> HashMap<NaiveDate, u64> {
    volume.iter().map(|v| (v.day, v.opened)).collect()
}
