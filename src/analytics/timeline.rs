//! Per-ticket event timelines and the status segments derived from them

use crate::models::{TicketEvent, TicketId, TicketStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Events grouped by ticket, each group ascending by `created_at`
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    timelines: HashMap<TicketId, Vec<TicketEvent>>,
}

impl TimelineIndex {
    /// Group events by ticket. The sort is stable, so events sharing a
    /// timestamp keep their row order.
    pub fn build(events: impl IntoIterator<Item = TicketEvent>) -> Self {
        let mut timelines: HashMap<TicketId, Vec<TicketEvent>> = HashMap::new();

        for event in events {
            timelines.entry(event.ticket_id).or_default().push(event);
        }

        for timeline in timelines.values_mut() {
            timeline.sort_by_key(|event| event.created_at);
        }

        Self { timelines }
    }

    /// Sorted events for a ticket; empty when none were logged
    pub fn events_for(&self, ticket_id: &TicketId) -> &[TicketEvent] {
        self.timelines
            .get(ticket_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of tickets with at least one event
    pub fn ticket_count(&self) -> usize {
        self.timelines.len()
    }

    pub fn event_count(&self) -> usize {
        self.timelines.values().map(Vec::len).sum()
    }
}

/// A span of time a ticket spent in one status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSegment {
    pub status: TicketStatus,
    pub entered_at: DateTime<Utc>,
    /// `None` while the ticket is still in this status
    pub left_at: Option<DateTime<Utc>>,
}

/// Status segments from a sorted timeline. Each STATUS_CHANGED event opens a
/// segment and closes the previous one; assignment events are ignored.
pub fn status_segments(events: &[TicketEvent]) -> Vec<StatusSegment> {
    let mut segments: Vec<StatusSegment> = Vec::new();

    for event in events {
        let Some(change) = event.status_change() else {
            continue;
        };

        if let Some(last) = segments.last_mut() {
            last.left_at = Some(event.created_at);
        }

        segments.push(StatusSegment {
            status: change.new_status,
            entered_at: event.created_at,
            left_at: None,
        });
    }

    segments
}

/// A closed time interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Intervals spent in `status`, open segments ending at `now`. Adjacent or
/// overlapping spans are merged, so the result is sorted and disjoint.
pub fn status_intervals(
    segments: &[StatusSegment],
    status: TicketStatus,
    now: DateTime<Utc>,
) -> Vec<Interval> {
    let mut intervals: Vec<Interval> = segments
        .iter()
        .filter(|segment| segment.status == status)
        .map(|segment| {
            let end = segment.left_at.unwrap_or(now);
            Interval {
                start: segment.entered_at,
                // inverted timestamps collapse to an empty interval
                end: end.max(segment.entered_at),
            }
        })
        .collect();

    intervals.sort_by_key(|interval| interval.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }

    merged
}
