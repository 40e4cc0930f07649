//! Configuration for the batch scheduler

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the scheduler service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Upper bound on one job execution, in seconds
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,

    /// Daily rollup job
    #[serde(default)]
    pub daily_rollup: DailyRollupJobConfig,
}

/// Configuration for the daily rollup job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRollupJobConfig {
    /// Whether this job is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Six-field cron expression (seconds first), evaluated in UTC
    #[serde(default = "default_rollup_schedule")]
    pub schedule: String,

    /// Trailing days recomputed on each run, today included
    #[serde(default = "default_range_days")]
    pub range_days: u32,
}

impl SchedulerConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            job_timeout_secs: default_job_timeout_secs(),
            daily_rollup: DailyRollupJobConfig::default(),
        }
    }
}

impl Default for DailyRollupJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_rollup_schedule(),
            range_days: default_range_days(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_job_timeout_secs() -> u64 {
    300
}

fn default_rollup_schedule() -> String {
    // Daily at 01:15 UTC
    "0 15 1 * * *".to_string()
}

fn default_range_days() -> u32 {
    7
}

/// Builder for SchedulerConfig
pub struct SchedulerConfigBuilder {
    config: SchedulerConfig,
}

impl SchedulerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn job_timeout(mut self, timeout: Duration) -> Self {
        self.config.job_timeout_secs = timeout.as_secs();
        self
    }

    pub fn rollup_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.config.daily_rollup.schedule = schedule.into();
        self
    }

    pub fn rollup_range_days(mut self, days: u32) -> Self {
        self.config.daily_rollup.range_days = days;
        self
    }

    pub fn build(self) -> SchedulerConfig {
        self.config
    }
}

impl Default for SchedulerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
