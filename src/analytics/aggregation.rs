//! Folding per-ticket metrics into breakdowns, daily series and rankings

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::statistics::{rate, rounded_mean, Percentiles, TrendAnalysis};
use crate::analytics::ticket_metrics::EvaluatedTicket;
use crate::models::{
    EngineerId, Priority, SlaPolicy, SlaTargetSource, TicketAssignment, TicketId, TicketStatus,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Inclusive reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AnalyticsResult<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    /// Window covering whole UTC days `first..=last`
    pub fn from_days(first: NaiveDate, last: NaiveDate) -> AnalyticsResult<Self> {
        let start = first.and_time(NaiveTime::MIN).and_utc();
        let end = last.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
            - Duration::milliseconds(1);
        Self::new(start, end)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.start > self.end {
            return Err(AnalyticsError::InvalidDateRange(format!(
                "window start {} is after window end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// Every calendar day touched by the window, in order
    pub fn days(&self) -> Vec<NaiveDate> {
        day_range(self.first_day(), self.last_day())
    }

    /// Number of calendar days in the window, at least 1
    pub fn day_count(&self) -> i64 {
        ((self.last_day() - self.first_day()).num_days() + 1).max(1)
    }

    /// The preceding period of equal length, `[start - days, start)`
    pub fn previous(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start - Duration::days(self.day_count()), self.start)
    }
}

/// Days `first..=last`; empty when `first > last`
pub fn day_range(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    first
        .iter_days()
        .take_while(|day| *day <= last)
        .collect()
}

/// Per-day accumulator shared by the dashboard trends and the rollup
#[derive(Debug, Clone, Default)]
pub struct DayBucket {
    pub opened: u64,
    pub resolved: u64,
    pub sla_breached: u64,
    /// Acknowledgement minutes of tickets created this day
    pub ack_minutes: Vec<f64>,
    /// Effective resolution minutes of tickets resolved this day
    pub resolution_minutes: Vec<f64>,
}

/// Bucket tickets into `days`. Opened, breached and acknowledgement follow
/// the creation day; resolved and resolution time follow the canonical
/// resolution day. Instants outside `days` are dropped.
pub fn bucket_by_day(
    evaluated: &[EvaluatedTicket],
    days: &[NaiveDate],
) -> BTreeMap<NaiveDate, DayBucket> {
    let mut buckets: BTreeMap<NaiveDate, DayBucket> =
        days.iter().map(|day| (*day, DayBucket::default())).collect();

    for item in evaluated {
        let metrics = &item.metrics;

        if let Some(bucket) = buckets.get_mut(&metrics.created_at.date_naive()) {
            bucket.opened += 1;
            if metrics.is_breached {
                bucket.sla_breached += 1;
            }
            if let Some(ack) = metrics.ack_minutes {
                bucket.ack_minutes.push(ack);
            }
        }

        if let Some(resolved_at) = metrics.resolved_at {
            if let Some(bucket) = buckets.get_mut(&resolved_at.date_naive()) {
                bucket.resolved += 1;
                bucket
                    .resolution_minutes
                    .push(metrics.effective_resolution_minutes);
            }
        }
    }

    buckets
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounters {
    pub total: u64,
    pub open: u64,
    pub resolved: u64,
    pub breached: u64,
    pub reopened: u64,
    pub first_contact_resolutions: u64,
    pub unacknowledged: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyMetrics {
    /// Mean acknowledgement minutes over acknowledged tickets
    pub mtta_minutes: i64,
    /// Mean effective resolution minutes over resolved tickets
    pub mttr_minutes: i64,
    pub resolution_percentiles: Percentiles,
    /// Share of tickets within SLA
    pub sla_compliance_rate: f64,
    /// Share of resolved tickets that were reopened
    pub reopen_rate: f64,
    /// Share of resolved tickets closed on first contact
    pub first_contact_resolution_rate: f64,
    pub total_waiting_minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdowns {
    /// All six statuses, zero-filled
    pub by_status: BTreeMap<String, u64>,
    /// All four priorities, zero-filled
    pub by_priority: BTreeMap<String, u64>,
    pub by_category: BTreeMap<String, u64>,
    pub by_subcategory: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyVolume {
    pub day: NaiveDate,
    pub opened: u64,
    pub resolved: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMinutes {
    pub day: NaiveDate,
    pub minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSeries {
    pub volume: Vec<DailyVolume>,
    pub sla_breaches: Vec<DailyCount>,
    pub ack_minutes: Vec<DailyMinutes>,
    pub resolution_minutes: Vec<DailyMinutes>,
    /// Fit over daily opened counts; absent for single-day windows
    pub opened_trend: Option<TrendAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingBucket {
    pub band: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerPerformance {
    pub engineer_id: EngineerId,
    pub engineer_name: String,
    pub assigned: u64,
    pub resolved: u64,
    pub breached: u64,
    pub avg_resolution_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerWorkload {
    pub engineer_id: EngineerId,
    pub engineer_name: String,
    pub open: u64,
    pub resolved: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaPriorityRow {
    pub priority: Priority,
    pub target_minutes: i64,
    pub source: SlaTargetSource,
    pub tickets: u64,
    pub breached: u64,
    pub compliance_rate: f64,
}

/// Everything one aggregation pass produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub summary: SummaryCounters,
    pub metrics: LatencyMetrics,
    pub breakdowns: Breakdowns,
    pub trends: TrendSeries,
    pub backlog_aging: Vec<AgingBucket>,
    pub leaderboard: Vec<EngineerPerformance>,
    pub workload: Vec<EngineerWorkload>,
    pub sla_table: Vec<SlaPriorityRow>,
}

/// Backlog aging bands as `(label, lowest day, highest day)`
pub const AGING_BANDS: [(&str, i64, i64); 4] = [
    ("0-2", 0, 2),
    ("3-7", 3, 7),
    ("8-14", 8, 14),
    ("15+", 15, i64::MAX),
];

/// Folds evaluated tickets into dashboard sections
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    leaderboard_size: usize,
    workload_size: usize,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(6, 8)
    }
}

impl MetricsAggregator {
    pub fn new(leaderboard_size: usize, workload_size: usize) -> Self {
        Self {
            leaderboard_size,
            workload_size,
        }
    }

    pub fn aggregate(
        &self,
        evaluated: &[EvaluatedTicket],
        assignments: &[TicketAssignment],
        window: &ReportWindow,
        sla: &SlaPolicy,
        now: DateTime<Utc>,
    ) -> Aggregation {
        let (summary, metrics) = Self::summarize(evaluated);

        Aggregation {
            summary,
            metrics,
            breakdowns: Self::breakdowns(evaluated),
            trends: Self::trends(evaluated, window),
            backlog_aging: Self::backlog_aging(evaluated, now),
            leaderboard: self.leaderboard(evaluated, assignments),
            workload: self.workload(evaluated, assignments),
            sla_table: Self::sla_table(evaluated, sla),
        }
    }

    pub fn summarize(evaluated: &[EvaluatedTicket]) -> (SummaryCounters, LatencyMetrics) {
        let mut summary = SummaryCounters::default();
        let mut ack_minutes = Vec::new();
        let mut resolution_minutes = Vec::new();
        let mut waiting_minutes = 0.0;

        for item in evaluated {
            let m = &item.metrics;
            summary.total += 1;

            if let Some(ack) = m.ack_minutes {
                ack_minutes.push(ack);
            } else {
                summary.unacknowledged += 1;
            }

            if m.is_resolved() {
                summary.resolved += 1;
                resolution_minutes.push(m.effective_resolution_minutes);
            } else {
                summary.open += 1;
            }

            if m.is_breached {
                summary.breached += 1;
            }
            if m.is_reopened {
                summary.reopened += 1;
            }
            if m.is_first_contact_resolution {
                summary.first_contact_resolutions += 1;
            }
            waiting_minutes += m.waiting_minutes;
        }

        let metrics = LatencyMetrics {
            mtta_minutes: rounded_mean(&ack_minutes),
            mttr_minutes: rounded_mean(&resolution_minutes),
            resolution_percentiles: Percentiles::from_data(resolution_minutes),
            sla_compliance_rate: rate(summary.total - summary.breached, summary.total),
            reopen_rate: rate(summary.reopened, summary.resolved),
            first_contact_resolution_rate: rate(
                summary.first_contact_resolutions,
                summary.resolved,
            ),
            total_waiting_minutes: waiting_minutes.round() as i64,
        };

        (summary, metrics)
    }

    pub fn breakdowns(evaluated: &[EvaluatedTicket]) -> Breakdowns {
        let mut by_status: BTreeMap<String, u64> = TicketStatus::all()
            .into_iter()
            .map(|status| (status.to_string(), 0))
            .collect();
        let mut by_priority: BTreeMap<String, u64> = Priority::all()
            .into_iter()
            .map(|priority| (priority.to_string(), 0))
            .collect();
        let mut by_category = BTreeMap::new();
        let mut by_subcategory = BTreeMap::new();

        for item in evaluated {
            let ticket = &item.ticket;
            *by_status.entry(ticket.status.to_string()).or_insert(0) += 1;
            *by_priority.entry(ticket.priority.to_string()).or_insert(0) += 1;
            *by_category.entry(ticket.category_key()).or_insert(0) += 1;
            *by_subcategory.entry(ticket.subcategory_key()).or_insert(0) += 1;
        }

        Breakdowns {
            by_status,
            by_priority,
            by_category,
            by_subcategory,
        }
    }

    pub fn trends(evaluated: &[EvaluatedTicket], window: &ReportWindow) -> TrendSeries {
        let buckets = bucket_by_day(evaluated, &window.days());

        let mut series = TrendSeries::default();
        for (day, bucket) in &buckets {
            series.volume.push(DailyVolume {
                day: *day,
                opened: bucket.opened,
                resolved: bucket.resolved,
            });
            series.sla_breaches.push(DailyCount {
                day: *day,
                count: bucket.sla_breached,
            });
            series.ack_minutes.push(DailyMinutes {
                day: *day,
                minutes: rounded_mean(&bucket.ack_minutes),
            });
            series.resolution_minutes.push(DailyMinutes {
                day: *day,
                minutes: rounded_mean(&bucket.resolution_minutes),
            });
        }

        let opened: Vec<f64> = series.volume.iter().map(|v| v.opened as f64).collect();
        series.opened_trend = TrendAnalysis::analyze(&opened).ok();

        series
    }

    /// Unresolved tickets by whole days open
    pub fn backlog_aging(evaluated: &[EvaluatedTicket], now: DateTime<Utc>) -> Vec<AgingBucket> {
        let mut counts = [0u64; AGING_BANDS.len()];

        for item in evaluated.iter().filter(|item| !item.metrics.is_resolved()) {
            let age_days = now
                .signed_duration_since(item.metrics.created_at)
                .num_days()
                .max(0);

            if let Some(index) = AGING_BANDS
                .iter()
                .position(|(_, low, high)| (*low..=*high).contains(&age_days))
            {
                counts[index] += 1;
            }
        }

        AGING_BANDS
            .iter()
            .zip(counts)
            .map(|((band, _, _), count)| AgingBucket {
                band: band.to_string(),
                count,
            })
            .collect()
    }

    pub fn leaderboard(
        &self,
        evaluated: &[EvaluatedTicket],
        assignments: &[TicketAssignment],
    ) -> Vec<EngineerPerformance> {
        let mut rows: Vec<EngineerPerformance> = engineer_tickets(evaluated, assignments)
            .into_iter()
            .map(|(engineer_id, (engineer_name, tickets))| {
                let resolved: Vec<f64> = tickets
                    .iter()
                    .filter(|item| item.metrics.is_resolved())
                    .map(|item| item.metrics.effective_resolution_minutes)
                    .collect();

                EngineerPerformance {
                    engineer_id,
                    engineer_name,
                    assigned: tickets.len() as u64,
                    resolved: resolved.len() as u64,
                    breached: tickets.iter().filter(|item| item.metrics.is_breached).count()
                        as u64,
                    avg_resolution_minutes: rounded_mean(&resolved),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.resolved
                .cmp(&a.resolved)
                .then_with(|| a.engineer_id.cmp(&b.engineer_id))
        });
        rows.truncate(self.leaderboard_size);
        rows
    }

    pub fn workload(
        &self,
        evaluated: &[EvaluatedTicket],
        assignments: &[TicketAssignment],
    ) -> Vec<EngineerWorkload> {
        let mut rows: Vec<EngineerWorkload> = engineer_tickets(evaluated, assignments)
            .into_iter()
            .map(|(engineer_id, (engineer_name, tickets))| {
                let resolved = tickets
                    .iter()
                    .filter(|item| item.metrics.is_resolved())
                    .count() as u64;

                EngineerWorkload {
                    engineer_id,
                    engineer_name,
                    open: tickets.len() as u64 - resolved,
                    resolved,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.open
                .cmp(&a.open)
                .then_with(|| a.engineer_id.cmp(&b.engineer_id))
        });
        rows.truncate(self.workload_size);
        rows
    }

    pub fn sla_table(evaluated: &[EvaluatedTicket], sla: &SlaPolicy) -> Vec<SlaPriorityRow> {
        Priority::all()
            .into_iter()
            .map(|priority| {
                let target = sla.target(priority);
                let (tickets, breached) = evaluated
                    .iter()
                    .filter(|item| item.ticket.priority == priority)
                    .fold((0u64, 0u64), |(n, b), item| {
                        (n + 1, b + u64::from(item.metrics.is_breached))
                    });

                SlaPriorityRow {
                    priority,
                    target_minutes: target.minutes,
                    source: target.source,
                    tickets,
                    breached,
                    compliance_rate: rate(tickets - breached, tickets),
                }
            })
            .collect()
    }
}

/// Engineer → (display name, distinct tickets) over active assignments of
/// tickets in the set
fn engineer_tickets<'a>(
    evaluated: &'a [EvaluatedTicket],
    assignments: &[TicketAssignment],
) -> HashMap<EngineerId, (String, Vec<&'a EvaluatedTicket>)> {
    let by_id: HashMap<TicketId, &EvaluatedTicket> = evaluated
        .iter()
        .map(|item| (item.ticket.id, item))
        .collect();

    let mut seen: HashSet<(&str, TicketId)> = HashSet::new();
    let mut engineers: HashMap<EngineerId, (String, Vec<&EvaluatedTicket>)> = HashMap::new();

    for assignment in assignments.iter().filter(|a| a.is_active()) {
        let Some(item) = by_id.get(&assignment.ticket_id) else {
            continue;
        };
        if !seen.insert((assignment.engineer_id.as_str(), assignment.ticket_id)) {
            continue;
        }

        let entry = engineers
            .entry(assignment.engineer_id.clone())
            .or_insert_with(|| (assignment.display_name().to_string(), Vec::new()));
        if entry.0 == assignment.engineer_id && assignment.engineer_name.is_some() {
            entry.0 = assignment.display_name().to_string();
        }
        entry.1.push(*item);
    }

    engineers
}
