//! Per-ticket SLA metrics derived from a ticket's event timeline

use crate::analytics::timeline::{status_intervals, status_segments, Interval, TimelineIndex};
use crate::models::{Priority, SlaPolicy, Ticket, TicketEvent, TicketId, TicketStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which resolution transition counts when a ticket was resolved more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionPolicy {
    /// First transition into RESOLVED or CLOSED, even if later reopened
    #[default]
    Earliest,
    /// First resolution after the last reopen; a reopened ticket that was
    /// not resolved again counts as open
    Latest,
}

/// Derived SLA facts for one ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMetrics {
    pub ticket_id: TicketId,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,

    /// First IN_PROGRESS transition or assignment
    pub ack_at: Option<DateTime<Utc>>,
    pub ack_minutes: Option<f64>,

    /// Time spent WAITING_ON_REQUESTER, excluded from SLA time
    pub waiting_minutes: f64,

    /// Canonical resolution instant; `None` while open
    pub resolved_at: Option<DateTime<Utc>>,

    /// Elapsed minutes until resolution (or now) less waiting time
    pub effective_resolution_minutes: f64,

    pub sla_target_minutes: i64,
    pub is_breached: bool,
    pub is_reopened: bool,
    pub is_first_contact_resolution: bool,

    /// Whether the ticket ever entered WAITING_ON_REQUESTER
    pub entered_waiting: bool,

    /// ASSIGNED events that were not unassignments
    pub assignment_count: usize,
}

impl TicketMetrics {
    /// Compute metrics for one ticket from its sorted events
    pub fn compute(
        ticket: &Ticket,
        events: &[TicketEvent],
        now: DateTime<Utc>,
        sla_target_minutes: i64,
        policy: ResolutionPolicy,
    ) -> Self {
        let ack_at = acknowledgement_instant(events);
        let ack_minutes = ack_at.map(|at| minutes_between(ticket.created_at, at));

        let segments = status_segments(events);
        let waiting = status_intervals(&segments, TicketStatus::WaitingOnRequester, now);
        let waiting_minutes = total_minutes(&waiting);

        let resolved_at = resolution_instant(ticket, events, policy);
        let elapsed_minutes = minutes_between(ticket.created_at, resolved_at.unwrap_or(now));
        let effective_resolution_minutes = (elapsed_minutes - waiting_minutes).max(0.0);

        let is_breached = effective_resolution_minutes > sla_target_minutes as f64;
        let is_reopened = was_reopened(events);
        let entered_waiting = !waiting.is_empty();
        let assignment_count = events
            .iter()
            .filter_map(TicketEvent::assignment)
            .filter(|assignment| !assignment.is_unassignment())
            .count();

        let is_first_contact_resolution =
            resolved_at.is_some() && !is_reopened && !entered_waiting && assignment_count <= 1;

        Self {
            ticket_id: ticket.id,
            priority: ticket.priority,
            created_at: ticket.created_at,
            ack_at,
            ack_minutes,
            waiting_minutes,
            resolved_at,
            effective_resolution_minutes,
            sla_target_minutes,
            is_breached,
            is_reopened,
            is_first_contact_resolution,
            entered_waiting,
            assignment_count,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    pub fn is_acknowledged(&self) -> bool {
        self.ack_at.is_some()
    }
}

/// A ticket paired with the metrics derived for it in one pass
#[derive(Debug, Clone)]
pub struct EvaluatedTicket {
    pub ticket: Ticket,
    pub metrics: TicketMetrics,
}

impl EvaluatedTicket {
    /// Derive metrics for every ticket against its timeline and SLA target
    pub fn evaluate_all(
        tickets: Vec<Ticket>,
        timelines: &TimelineIndex,
        sla: &SlaPolicy,
        policy: ResolutionPolicy,
        now: DateTime<Utc>,
    ) -> Vec<Self> {
        tickets
            .into_iter()
            .map(|ticket| {
                let metrics = TicketMetrics::compute(
                    &ticket,
                    timelines.events_for(&ticket.id),
                    now,
                    sla.target_minutes(ticket.priority),
                    policy,
                );
                Self { ticket, metrics }
            })
            .collect()
    }
}

/// Earliest IN_PROGRESS transition or non-unassignment ASSIGNED event
pub fn acknowledgement_instant(events: &[TicketEvent]) -> Option<DateTime<Utc>> {
    events
        .iter()
        .filter(|event| {
            if let Some(change) = event.status_change() {
                change.new_status == TicketStatus::InProgress
            } else if let Some(assignment) = event.assignment() {
                !assignment.is_unassignment()
            } else {
                false
            }
        })
        .map(|event| event.created_at)
        .min()
}

/// Canonical resolution instant under `policy`. Falls back to the row's
/// `resolved_at`/`closed_at` only when no event records a resolution.
pub fn resolution_instant(
    ticket: &Ticket,
    events: &[TicketEvent],
    policy: ResolutionPolicy,
) -> Option<DateTime<Utc>> {
    let transitions: Vec<(DateTime<Utc>, TicketStatus)> = events
        .iter()
        .filter_map(|event| {
            event
                .status_change()
                .map(|change| (event.created_at, change.new_status))
        })
        .collect();

    if !transitions.iter().any(|(_, status)| status.is_terminal()) {
        return ticket.recorded_resolution();
    }

    match policy {
        ResolutionPolicy::Earliest => transitions
            .iter()
            .filter(|(_, status)| status.is_terminal())
            .map(|(at, _)| *at)
            .min(),
        ResolutionPolicy::Latest => {
            let mut current: Option<DateTime<Utc>> = None;
            for (at, status) in &transitions {
                if status.is_terminal() {
                    current.get_or_insert(*at);
                } else {
                    current = None;
                }
            }
            current
        }
    }
}

/// Whether any transition moved the ticket from RESOLVED/CLOSED back to OPEN
pub fn was_reopened(events: &[TicketEvent]) -> bool {
    events.iter().filter_map(TicketEvent::status_change).any(|change| {
        change.new_status == TicketStatus::Open
            && change
                .old_status
                .map(|old| old.is_terminal())
                .unwrap_or(false)
    })
}

/// Minutes from `start` to `end`, clamped at zero
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = end.signed_duration_since(start).num_milliseconds().max(0);
    millis as f64 / 60_000.0
}

fn total_minutes(intervals: &[Interval]) -> f64 {
    intervals
        .iter()
        .map(|interval| minutes_between(interval.start, interval.end))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket(priority: Priority, created_at: DateTime<Utc>) -> Ticket {
        Ticket::new("Test ticket", priority, "IT", created_at)
    }

    fn change(
        ticket: &Ticket,
        minutes: i64,
        old: Option<TicketStatus>,
        new: TicketStatus,
    ) -> TicketEvent {
        TicketEvent::status_changed(ticket.id, ticket.created_at + Duration::minutes(minutes), old, new)
    }

    #[test]
    fn test_waiting_time_is_excluded() {
        let t0 = Utc::now() - Duration::days(1);
        let t = ticket(Priority::Medium, t0);
        let events = vec![
            TicketEvent::assigned(t.id, t0 + Duration::minutes(10), "eng-1"),
            change(&t, 60, Some(TicketStatus::Assigned), TicketStatus::WaitingOnRequester),
            change(&t, 180, Some(TicketStatus::WaitingOnRequester), TicketStatus::InProgress),
            change(&t, 300, Some(TicketStatus::InProgress), TicketStatus::Resolved),
        ];

        let m = TicketMetrics::compute(&t, &events, Utc::now(), 1440, ResolutionPolicy::Earliest);

        assert_eq!(m.ack_minutes, Some(10.0));
        assert_eq!(m.waiting_minutes, 120.0);
        assert_eq!(m.effective_resolution_minutes, 180.0);
        assert!(!m.is_breached);
        assert!(!m.is_first_contact_resolution);
        assert!(m.entered_waiting);
    }

    #[test]
    fn test_unacknowledged_open_ticket_breaches() {
        let t0 = Utc::now();
        let t = ticket(Priority::Urgent, t0);

        let m = TicketMetrics::compute(&t, &[], t0 + Duration::hours(5), 240, ResolutionPolicy::Earliest);

        assert!(m.ack_at.is_none());
        assert!(m.ack_minutes.is_none());
        assert!(m.resolved_at.is_none());
        assert_eq!(m.effective_resolution_minutes, 300.0);
        assert!(m.is_breached);
    }

    #[test]
    fn test_reopen_keeps_earliest_resolution_by_default() {
        let t0 = Utc::now() - Duration::days(2);
        let t = ticket(Priority::High, t0);
        let events = vec![
            change(&t, 30, Some(TicketStatus::Open), TicketStatus::InProgress),
            change(&t, 60, Some(TicketStatus::InProgress), TicketStatus::Resolved),
            change(&t, 120, Some(TicketStatus::Resolved), TicketStatus::Open),
            change(&t, 600, Some(TicketStatus::Open), TicketStatus::Resolved),
        ];

        let earliest = TicketMetrics::compute(&t, &events, Utc::now(), 480, ResolutionPolicy::Earliest);
        assert!(earliest.is_reopened);
        assert!(!earliest.is_first_contact_resolution);
        assert_eq!(earliest.resolved_at, Some(t0 + Duration::minutes(60)));
        assert!(!earliest.is_breached);

        let latest = TicketMetrics::compute(&t, &events, Utc::now(), 480, ResolutionPolicy::Latest);
        assert_eq!(latest.resolved_at, Some(t0 + Duration::minutes(600)));
        assert!(latest.is_breached);
    }

    #[test]
    fn test_latest_policy_treats_unresolved_reopen_as_open() {
        let t0 = Utc::now() - Duration::hours(10);
        let t = ticket(Priority::Low, t0);
        let events = vec![
            change(&t, 60, Some(TicketStatus::InProgress), TicketStatus::Closed),
            change(&t, 90, Some(TicketStatus::Closed), TicketStatus::Open),
        ];

        assert_eq!(resolution_instant(&t, &events, ResolutionPolicy::Latest), None);
        assert_eq!(
            resolution_instant(&t, &events, ResolutionPolicy::Earliest),
            Some(t0 + Duration::minutes(60))
        );
    }

    #[test]
    fn test_resolution_falls_back_to_row_fields() {
        let t0 = Utc::now() - Duration::hours(10);
        let mut t = ticket(Priority::Low, t0);
        t.closed_at = Some(t0 + Duration::hours(4));

        assert_eq!(
            resolution_instant(&t, &[], ResolutionPolicy::Earliest),
            Some(t0 + Duration::hours(4))
        );

        t.resolved_at = Some(t0 + Duration::hours(2));
        assert_eq!(
            resolution_instant(&t, &[], ResolutionPolicy::Earliest),
            Some(t0 + Duration::hours(2))
        );
    }

    #[test]
    fn test_first_contact_resolution() {
        let t0 = Utc::now() - Duration::hours(6);
        let t = ticket(Priority::Medium, t0);
        let events = vec![
            TicketEvent::assigned(t.id, t0 + Duration::minutes(5), "eng-1"),
            change(&t, 45, Some(TicketStatus::Assigned), TicketStatus::Resolved),
        ];

        let m = TicketMetrics::compute(&t, &events, Utc::now(), 1440, ResolutionPolicy::Earliest);
        assert!(m.is_first_contact_resolution);
        assert_eq!(m.assignment_count, 1);

        let mut reassigned = events.clone();
        reassigned.insert(1, TicketEvent::unassigned(t.id, t0 + Duration::minutes(10)));
        reassigned.insert(2, TicketEvent::assigned(t.id, t0 + Duration::minutes(11), "eng-2"));

        let m = TicketMetrics::compute(&t, &reassigned, Utc::now(), 1440, ResolutionPolicy::Earliest);
        assert_eq!(m.assignment_count, 2);
        assert!(!m.is_first_contact_resolution);
    }

    #[test]
    fn test_inverted_timestamps_clamp_to_zero() {
        let t0 = Utc::now();
        let t = ticket(Priority::Medium, t0);
        let events = vec![
            TicketEvent::status_changed(t.id, t0 - Duration::hours(2), None, TicketStatus::InProgress),
            TicketEvent::status_changed(t.id, t0 - Duration::hours(1), None, TicketStatus::Resolved),
        ];

        let m = TicketMetrics::compute(&t, &events, t0, 1440, ResolutionPolicy::Earliest);
        assert_eq!(m.ack_minutes, Some(0.0));
        assert_eq!(m.effective_resolution_minutes, 0.0);
        assert!(m.waiting_minutes >= 0.0);
    }

    #[test]
    fn test_minutes_between_never_negative() {
        let t0 = Utc::now();
        assert_eq!(minutes_between(t0, t0 - Duration::minutes(5)), 0.0);
        assert_eq!(minutes_between(t0, t0 + Duration::seconds(90)), 1.5);
    }
}
