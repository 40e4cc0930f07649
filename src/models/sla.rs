use crate::models::Priority;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use strum::Display;

/// A priority → target row as stored in the SLA configuration table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaConfigRow {
    pub priority: String,
    pub target_minutes: i64,
}

impl SlaConfigRow {
    pub fn new(priority: impl Into<String>, target_minutes: i64) -> Self {
        Self {
            priority: priority.into(),
            target_minutes,
        }
    }
}

/// Where a resolved SLA target came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SlaTargetSource {
    Configured,
    Default,
}

/// Resolved SLA target for one priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaTarget {
    pub minutes: i64,
    pub source: SlaTargetSource,
}

/// Priority → resolution target, built from stored rows over a default table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaPolicy {
    targets: HashMap<Priority, SlaTarget>,
    fallback_minutes: i64,
    rejected_rows: usize,
}

impl SlaPolicy {
    /// Policy using only the given default table
    pub fn from_defaults(defaults: &HashMap<Priority, i64>) -> Self {
        let targets = defaults
            .iter()
            .map(|(priority, minutes)| {
                (
                    *priority,
                    SlaTarget {
                        minutes: *minutes,
                        source: SlaTargetSource::Default,
                    },
                )
            })
            .collect();

        Self {
            targets,
            fallback_minutes: defaults
                .get(&Priority::Medium)
                .copied()
                .unwrap_or_else(|| Priority::Medium.default_target_minutes()),
            rejected_rows: 0,
        }
    }

    /// Overlay stored rows on the default table. Rows naming an unknown
    /// priority or a non-positive target are skipped.
    pub fn from_rows(rows: &[SlaConfigRow], defaults: &HashMap<Priority, i64>) -> Self {
        let mut policy = Self::from_defaults(defaults);

        for row in rows {
            let priority = match Priority::from_str(row.priority.trim()) {
                Ok(priority) => priority,
                Err(_) => {
                    tracing::warn!(
                        priority = %row.priority,
                        target_minutes = row.target_minutes,
                        "Ignoring SLA row with unknown priority"
                    );
                    policy.rejected_rows += 1;
                    continue;
                }
            };

            if row.target_minutes <= 0 {
                tracing::warn!(
                    priority = %priority,
                    target_minutes = row.target_minutes,
                    "Ignoring SLA row with non-positive target"
                );
                policy.rejected_rows += 1;
                continue;
            }

            policy.targets.insert(
                priority,
                SlaTarget {
                    minutes: row.target_minutes,
                    source: SlaTargetSource::Configured,
                },
            );
        }

        if rows.is_empty() {
            tracing::warn!("No SLA configuration stored, using default targets");
        }

        policy
    }

    /// Target for a priority; unmapped priorities use the MEDIUM default
    pub fn target(&self, priority: Priority) -> SlaTarget {
        self.targets.get(&priority).copied().unwrap_or(SlaTarget {
            minutes: self.fallback_minutes,
            source: SlaTargetSource::Default,
        })
    }

    pub fn target_minutes(&self, priority: Priority) -> i64 {
        self.target(priority).minutes
    }

    /// Number of stored rows that could not be used
    pub fn rejected_rows(&self) -> usize {
        self.rejected_rows
    }

    /// Whether any priority falls back to a default target
    pub fn uses_defaults(&self) -> bool {
        Priority::all()
            .into_iter()
            .any(|p| self.target(p).source == SlaTargetSource::Default)
    }
}

/// The built-in target table
pub fn default_sla_targets() -> HashMap<Priority, i64> {
    Priority::all()
        .into_iter()
        .map(|p| (p, p.default_target_minutes()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only() {
        let policy = SlaPolicy::from_rows(&[], &default_sla_targets());
        assert_eq!(policy.target_minutes(Priority::Low), 4320);
        assert_eq!(policy.target_minutes(Priority::Medium), 1440);
        assert_eq!(policy.target_minutes(Priority::High), 480);
        assert_eq!(policy.target_minutes(Priority::Urgent), 240);
        assert!(policy.uses_defaults());
    }

    #[test]
    fn test_rows_override_defaults() {
        let rows = vec![SlaConfigRow::new("urgent", 120), SlaConfigRow::new("HIGH", 360)];
        let policy = SlaPolicy::from_rows(&rows, &default_sla_targets());

        let urgent = policy.target(Priority::Urgent);
        assert_eq!(urgent.minutes, 120);
        assert_eq!(urgent.source, SlaTargetSource::Configured);
        assert_eq!(policy.target_minutes(Priority::High), 360);
        assert_eq!(policy.target(Priority::Low).source, SlaTargetSource::Default);
    }

    #[test]
    fn test_invalid_rows_are_skipped() {
        let rows = vec![
            SlaConfigRow::new("CRITICAL", 60),
            SlaConfigRow::new("LOW", 0),
            SlaConfigRow::new("MEDIUM", -5),
        ];
        let policy = SlaPolicy::from_rows(&rows, &default_sla_targets());

        assert_eq!(policy.rejected_rows(), 3);
        assert_eq!(policy.target_minutes(Priority::Low), 4320);
        assert_eq!(policy.target_minutes(Priority::Medium), 1440);
    }

    #[test]
    fn test_unmapped_priority_uses_medium() {
        let mut defaults = HashMap::new();
        defaults.insert(Priority::Medium, 1000);
        let policy = SlaPolicy::from_defaults(&defaults);

        assert_eq!(policy.target_minutes(Priority::Urgent), 1000);
        assert_eq!(policy.target(Priority::Urgent).source, SlaTargetSource::Default);
    }
}
