use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One calendar day of pre-aggregated ticket counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMetricsDaily {
    /// UTC calendar day, the upsert key
    pub day: NaiveDate,

    /// Tickets created on this day
    pub opened: u64,

    /// Tickets whose canonical resolution falls on this day
    pub resolved: u64,

    /// Tickets created on this day that breached their SLA
    pub sla_breached: u64,

    /// Mean acknowledgement minutes of tickets created on this day
    pub mtta_minutes: i64,

    /// Mean effective resolution minutes of tickets resolved on this day
    pub mttr_minutes: i64,

    pub updated_at: DateTime<Utc>,
}

impl TicketMetricsDaily {
    pub fn empty(day: NaiveDate, updated_at: DateTime<Utc>) -> Self {
        Self {
            day,
            opened: 0,
            resolved: 0,
            sla_breached: 0,
            mtta_minutes: 0,
            mttr_minutes: 0,
            updated_at,
        }
    }

    /// Storage key, ordered lexicographically by day
    pub fn key(&self) -> String {
        day_key(self.day)
    }
}

/// ISO-8601 key for a day
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
