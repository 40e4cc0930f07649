//! Ticket SLA & analytics aggregation engine
//!
//! Computes service-level metrics for support tickets from ticket rows and
//! their event log: acknowledgement and resolution latency net of waiting
//! time, SLA breaches, reopen and first-contact-resolution rates, daily
//! trends, backlog aging, engineer rankings and period-over-period
//! comparison. A batch path persists one metrics row per calendar day.

pub mod analytics;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scheduler;
pub mod state;

pub use analytics::{
    AnalyticsConfig, AnalyticsEngine, AnalyticsError, DashboardPayload, DashboardQuery,
    ReportWindow, ResolutionPolicy, RollupWriter,
};
pub use config::Config;
pub use error::{AppError, Result};
pub use state::{RollupStore, TicketFilter, TicketSource};
