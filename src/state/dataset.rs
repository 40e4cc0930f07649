//! JSON ticket exports loaded into the in-memory store.
//!
//! This is the storage boundary for the CLI: raw event rows carry an untyped
//! payload and are converted into typed [`TicketEvent`]s here, so nothing past
//! this point inspects loose JSON.

use crate::error::{AppError, Result};
use crate::metrics::DATASET_EVENTS_DROPPED_TOTAL;
use crate::models::{RawTicketEvent, SlaConfigRow, Ticket, TicketAssignment, TicketEvent};
use crate::state::InMemoryStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use validator::Validate;

/// A full export of ticket data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDataset {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub events: Vec<RawTicketEvent>,
    #[serde(default)]
    pub assignments: Vec<TicketAssignment>,
    #[serde(default)]
    pub sla_config: Vec<SlaConfigRow>,
}

/// What happened while loading a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetLoadReport {
    pub tickets: usize,
    pub events: usize,
    pub assignments: usize,
    /// Rows of event types analytics does not use
    pub ignored_events: usize,
    /// Rows whose payload did not match their type, or whose ticket is unknown
    pub rejected_events: usize,
    /// Kept rows whose missing or malformed timestamp was set to the ticket's creation time
    pub clamped_timestamps: usize,
}

impl TicketDataset {
    /// Read a dataset from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate rows and load them into a fresh in-memory store
    pub fn into_store(self) -> Result<(InMemoryStore, DatasetLoadReport)> {
        let store = InMemoryStore::new();
        let mut report = DatasetLoadReport::default();
        let mut known: HashMap<_, _> = HashMap::with_capacity(self.tickets.len());

        for ticket in self.tickets {
            ticket.validate().map_err(|e| {
                AppError::Validation(format!("ticket {} is invalid: {}", ticket.id, e))
            })?;
            known.insert(ticket.id, ticket.created_at);
            store.insert_ticket(ticket);
            report.tickets += 1;
        }

        for mut raw in self.events {
            if raw.kind().is_none() {
                tracing::debug!(event_id = %raw.id, event_type = %raw.event_type, "Skipping event type");
                report.ignored_events += 1;
                DATASET_EVENTS_DROPPED_TOTAL
                    .with_label_values(&["ignored_type"])
                    .inc();
                continue;
            }

            let Some(&ticket_created) = known.get(&raw.ticket_id) else {
                tracing::warn!(event_id = %raw.id, ticket_id = %raw.ticket_id, "Event references unknown ticket");
                report.rejected_events += 1;
                DATASET_EVENTS_DROPPED_TOTAL.with_label_values(&["rejected"]).inc();
                continue;
            };

            // Durations measured from a clamped event collapse to zero
            if raw.clamp_timestamp(ticket_created) {
                tracing::warn!(
                    event_id = %raw.id,
                    ticket_id = %raw.ticket_id,
                    "Event has no usable createdAt, using ticket creation time"
                );
                report.clamped_timestamps += 1;
                DATASET_EVENTS_DROPPED_TOTAL
                    .with_label_values(&["clamped_timestamp"])
                    .inc();
            }

            match TicketEvent::try_from(raw) {
                Ok(event) => {
                    store.append_event(event);
                    report.events += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Rejecting event row");
                    report.rejected_events += 1;
                    DATASET_EVENTS_DROPPED_TOTAL.with_label_values(&["rejected"]).inc();
                }
            }
        }

        for assignment in self.assignments {
            store.insert_assignment(assignment);
            report.assignments += 1;
        }

        store.set_sla_config(self.sla_config);

        tracing::info!(
            tickets = report.tickets,
            events = report.events,
            assignments = report.assignments,
            ignored_events = report.ignored_events,
            rejected_events = report.rejected_events,
            clamped_timestamps = report.clamped_timestamps,
            "Dataset loaded"
        );

        Ok((store, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "tickets": [{
                "id": "6f1f6d8e-1d1c-4f0a-9a55-3f4d2a1c0b01",
                "title": "Email not syncing",
                "priority": "HIGH",
                "status": "IN_PROGRESS",
                "category": "Email",
                "domain": "IT",
                "createdAt": "2024-03-01T09:00:00Z"
            }],
            "events": [
                {
                    "ticketId": "6f1f6d8e-1d1c-4f0a-9a55-3f4d2a1c0b01",
                    "type": "STATUS_CHANGED",
                    "payload": {"oldStatus": "OPEN", "newStatus": "IN_PROGRESS"},
                    "createdAt": "2024-03-01T09:30:00Z"
                },
                {
                    "ticketId": "6f1f6d8e-1d1c-4f0a-9a55-3f4d2a1c0b01",
                    "type": "COMMENT_ADDED",
                    "payload": {"body": "looking"},
                    "createdAt": "2024-03-01T09:31:00Z"
                },
                {
                    "ticketId": "6f1f6d8e-1d1c-4f0a-9a55-3f4d2a1c0b01",
                    "type": "STATUS_CHANGED",
                    "payload": {"status": "broken"},
                    "createdAt": "2024-03-01T09:32:00Z"
                }
            ],
            "assignments": [{
                "ticketId": "6f1f6d8e-1d1c-4f0a-9a55-3f4d2a1c0b01",
                "engineerId": "eng-7",
                "engineerName": "Sam",
                "assignedAt": "2024-03-01T09:10:00Z"
            }],
            "slaConfig": [{"priority": "HIGH", "targetMinutes": 360}]
        })
    }

    #[test]
    fn test_load_dataset() {
        let dataset = TicketDataset::from_json(&sample().to_string()).unwrap();
        let (store, report) = dataset.into_store().unwrap();

        assert_eq!(report.tickets, 1);
        assert_eq!(report.events, 1);
        assert_eq!(report.ignored_events, 1);
        assert_eq!(report.rejected_events, 1);
        assert_eq!(report.assignments, 1);
        assert_eq!(store.ticket_count(), 1);
        assert_eq!(store.event_count(), 1);
    }

    #[test]
    fn test_bad_event_timestamps_are_clamped() {
        let mut value = sample();
        value["events"] = json!([
            {
                "ticketId": "6f1f6d8e-1d1c-4f0a-9a55-3f4d2a1c0b01",
                "type": "STATUS_CHANGED",
                "payload": {"oldStatus": "OPEN", "newStatus": "IN_PROGRESS"},
                "createdAt": "not-a-date"
            },
            {
                "ticketId": "6f1f6d8e-1d1c-4f0a-9a55-3f4d2a1c0b01",
                "type": "ASSIGNED",
                "payload": {"action": "assigned", "engineerId": "eng-7"}
            }
        ]);

        let dataset = TicketDataset::from_json(&value.to_string()).unwrap();
        let (store, report) = dataset.into_store().unwrap();

        assert_eq!(report.events, 2);
        assert_eq!(report.clamped_timestamps, 2);
        assert_eq!(report.rejected_events, 0);
        assert_eq!(store.event_count(), 2);
    }

    #[test]
    fn test_invalid_ticket_fails_load() {
        let mut value = sample();
        value["tickets"][0]["title"] = json!("");
        let dataset = TicketDataset::from_json(&value.to_string()).unwrap();

        assert!(matches!(dataset.into_store(), Err(AppError::Validation(_))));
    }
}
