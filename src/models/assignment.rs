use crate::models::TicketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engineer identifier
pub type EngineerId = String;

/// Link between a ticket and the engineer working it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAssignment {
    pub ticket_id: TicketId,
    pub engineer_id: EngineerId,
    #[serde(default)]
    pub engineer_name: Option<String>,
    pub assigned_at: DateTime<Utc>,
    /// `None` while the assignment is active
    #[serde(default)]
    pub unassigned_at: Option<DateTime<Utc>>,
}

impl TicketAssignment {
    pub fn new(ticket_id: TicketId, engineer_id: impl Into<String>, assigned_at: DateTime<Utc>) -> Self {
        Self {
            ticket_id,
            engineer_id: engineer_id.into(),
            engineer_name: None,
            assigned_at,
            unassigned_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.engineer_name = Some(name.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.unassigned_at.is_none()
    }

    /// Name to display, falling back to the engineer ID
    pub fn display_name(&self) -> &str {
        self.engineer_name.as_deref().unwrap_or(&self.engineer_id)
    }
}
