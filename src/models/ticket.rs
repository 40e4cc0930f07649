use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;
use validator::Validate;

/// Ticket identifier
pub type TicketId = Uuid;

/// Category label used when a ticket carries none
pub const UNCATEGORIZED: &str = "uncategorized";

/// Subcategory label used when a ticket carries none
pub const GENERAL_SUBCATEGORY: &str = "general";

/// A support ticket as read from the ticket store
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique identifier
    pub id: TicketId,

    /// Human-readable title
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// Priority level, selects the SLA target
    pub priority: Priority,

    /// Latest status (events are authoritative for when it changed)
    pub status: TicketStatus,

    /// Free-text category
    #[serde(default)]
    pub category: Option<String>,

    /// Free-text subcategory
    #[serde(default)]
    pub subcategory: Option<String>,

    /// Owning project code
    #[serde(default)]
    pub project_code: Option<String>,

    /// Scope the ticket belongs to (e.g. "IT")
    #[validate(length(min = 1, max = 64))]
    pub domain: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Resolution timestamp written by the ticket service
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Close timestamp written by the ticket service
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Create a new open ticket created at `created_at`
    pub fn new(
        title: impl Into<String>,
        priority: Priority,
        domain: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            priority,
            status: TicketStatus::Open,
            category: None,
            subcategory: None,
            project_code: None,
            domain: domain.into(),
            created_at,
            resolved_at: None,
            closed_at: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_project(mut self, project_code: impl Into<String>) -> Self {
        self.project_code = Some(project_code.into());
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }

    /// Case-folded category used for grouping
    pub fn category_key(&self) -> String {
        fold_label(self.category.as_deref(), UNCATEGORIZED)
    }

    /// Case-folded subcategory used for grouping
    pub fn subcategory_key(&self) -> String {
        fold_label(self.subcategory.as_deref(), GENERAL_SUBCATEGORY)
    }

    /// Resolution timestamp recorded on the row itself, if any
    pub fn recorded_resolution(&self) -> Option<DateTime<Utc>> {
        self.resolved_at.or(self.closed_at)
    }
}

fn fold_label(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_lowercase(),
        _ => fallback.to_string(),
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TicketStatus {
    Open,
    Assigned,
    InProgress,
    WaitingOnRequester,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Every status, in lifecycle order
    pub fn all() -> Vec<TicketStatus> {
        TicketStatus::iter().collect()
    }

    /// Whether this status ends the ticket's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Every priority, least urgent first
    pub fn all() -> Vec<Priority> {
        Priority::iter().collect()
    }

    /// Built-in resolution target in minutes
    pub fn default_target_minutes(&self) -> i64 {
        match self {
            Priority::Low => 4320,
            Priority::Medium => 1440,
            Priority::High => 480,
            Priority::Urgent => 240,
        }
    }
}
