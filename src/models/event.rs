use crate::error::{AppError, Result};
use crate::models::{TicketId, TicketStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Assignment action that marks an engineer being removed from a ticket
pub const UNASSIGNED_ACTION: &str = "unassigned";

/// Kind of lifecycle event the analytics engine understands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    StatusChanged,
    Assigned,
}

/// Details of a status transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedPayload {
    #[serde(default)]
    pub old_status: Option<TicketStatus>,
    pub new_status: TicketStatus,
}

/// Details of an assignment change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssignedPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub engineer_id: Option<String>,
}

impl AssignedPayload {
    /// Whether this event removes an engineer rather than adding one
    pub fn is_unassignment(&self) -> bool {
        self.action
            .as_deref()
            .map(|a| a.trim().eq_ignore_ascii_case(UNASSIGNED_ACTION))
            .unwrap_or(false)
    }
}

/// Typed event payload, one variant per event kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    StatusChanged(StatusChangedPayload),
    Assigned(AssignedPayload),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::StatusChanged(_) => EventKind::StatusChanged,
            EventPayload::Assigned(_) => EventKind::Assigned,
        }
    }
}

/// A validated ticket lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEvent {
    pub id: Uuid,
    pub ticket_id: TicketId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl TicketEvent {
    pub fn status_changed(
        ticket_id: TicketId,
        created_at: DateTime<Utc>,
        old_status: Option<TicketStatus>,
        new_status: TicketStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            created_at,
            payload: EventPayload::StatusChanged(StatusChangedPayload {
                old_status,
                new_status,
            }),
        }
    }

    pub fn assigned(ticket_id: TicketId, created_at: DateTime<Utc>, engineer_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            created_at,
            payload: EventPayload::Assigned(AssignedPayload {
                action: Some("assigned".to_string()),
                engineer_id: Some(engineer_id.to_string()),
            }),
        }
    }

    pub fn unassigned(ticket_id: TicketId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            created_at,
            payload: EventPayload::Assigned(AssignedPayload {
                action: Some(UNASSIGNED_ACTION.to_string()),
                engineer_id: None,
            }),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// The status transition carried by this event, if it is one
    pub fn status_change(&self) -> Option<&StatusChangedPayload> {
        match &self.payload {
            EventPayload::StatusChanged(change) => Some(change),
            EventPayload::Assigned(_) => None,
        }
    }

    /// The assignment change carried by this event, if it is one
    pub fn assignment(&self) -> Option<&AssignedPayload> {
        match &self.payload {
            EventPayload::Assigned(assignment) => Some(assignment),
            EventPayload::StatusChanged(_) => None,
        }
    }
}

/// An event row as stored, with an untyped payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicketEvent {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub ticket_id: TicketId,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Kept loose so one bad timestamp does not reject the whole export
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
}

impl RawTicketEvent {
    /// Event kind named by the row, `None` for kinds analytics ignores
    pub fn kind(&self) -> Option<EventKind> {
        self.event_type.parse().ok()
    }

    /// The row's timestamp, `None` when missing or not RFC 3339
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match &self.created_at {
            Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Replace an unusable timestamp with `fallback`. Returns true if it did.
    pub fn clamp_timestamp(&mut self, fallback: DateTime<Utc>) -> bool {
        if self.timestamp().is_some() {
            return false;
        }
        self.created_at = Some(serde_json::Value::String(fallback.to_rfc3339()));
        true
    }
}

impl TryFrom<RawTicketEvent> for TicketEvent {
    type Error = AppError;

    fn try_from(raw: RawTicketEvent) -> Result<Self> {
        let created_at = raw.timestamp().ok_or_else(|| {
            AppError::Validation(format!("event {} has no usable createdAt", raw.id))
        })?;
        let kind = raw.kind().ok_or_else(|| {
            AppError::Validation(format!(
                "event {} has unsupported type {}",
                raw.id, raw.event_type
            ))
        })?;

        let payload = match kind {
            EventKind::StatusChanged => {
                let change: StatusChangedPayload = serde_json::from_value(raw.payload)
                    .map_err(|e| {
                        AppError::Validation(format!(
                            "event {} has malformed STATUS_CHANGED payload: {}",
                            raw.id, e
                        ))
                    })?;
                EventPayload::StatusChanged(change)
            }
            EventKind::Assigned => {
                let assignment: AssignedPayload = if raw.payload.is_null() {
                    AssignedPayload::default()
                } else {
                    serde_json::from_value(raw.payload).map_err(|e| {
                        AppError::Validation(format!(
                            "event {} has malformed ASSIGNED payload: {}",
                            raw.id, e
                        ))
                    })?
                };
                EventPayload::Assigned(assignment)
            }
        };

        Ok(Self {
            id: raw.id,
            ticket_id: raw.ticket_id,
            created_at,
            payload,
        })
    }
}
