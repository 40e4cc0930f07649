use crate::analytics::AnalyticsConfig;
use crate::error::AppError;
use crate::scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Analytics engine configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Rollup store configuration
    #[serde(default)]
    pub rollup: RollupConfig,

    /// Batch scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("TICKET_SLA_CONFIG")
            .unwrap_or_else(|_| "config/ticket-sla.toml".to_string());

        Self::load_from(&config_path)
    }

    /// Load configuration layering `path` over the embedded defaults
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(path).required(false))
            // Override with environment variables (prefix: TICKET_SLA_)
            .add_source(
                config::Environment::with_prefix("TICKET_SLA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Storage backend for daily rollup rows
    #[serde(default)]
    pub backend: RollupBackend,

    /// Path for the embedded sled database
    pub path: Option<PathBuf>,

    /// How far before the range start tickets are loaded, so tickets
    /// resolved inside the range but opened earlier are counted
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

/// Largest accepted `rollup.lookback_days`, about ten years
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

impl RollupConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(AppError::Configuration(format!(
                "rollup.lookback_days must be between 0 and {}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        Ok(())
    }

    /// Whether rows written through this backend outlive the process
    pub fn is_persistent(&self) -> bool {
        self.backend == RollupBackend::Sled
    }
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            backend: RollupBackend::default(),
            path: None,
            lookback_days: default_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RollupBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_lookback_days() -> i64 {
    90
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "ticket-sla-analytics".to_string()
}

fn default_true() -> bool {
    true
}
