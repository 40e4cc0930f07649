//! Error types for analytics operations

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Invalid date range
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// A fetch from the ticket store failed; no partial result is produced
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// Writing rollup rows failed
    #[error("Rollup write failed: {0}")]
    RollupWrite(String),

    /// Calculation error
    #[error("Calculation error: {0}")]
    CalculationError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<AppError> for AnalyticsError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Configuration(msg) => AnalyticsError::InvalidConfiguration(msg),
            other => AnalyticsError::UpstreamFetch(other.to_string()),
        }
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidDateRange(msg) => AppError::Validation(msg),
            AnalyticsError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            AnalyticsError::UpstreamFetch(msg) | AnalyticsError::RollupWrite(msg) => {
                AppError::Database(msg)
            }
            AnalyticsError::CalculationError(msg) => AppError::Internal(msg),
        }
    }
}
