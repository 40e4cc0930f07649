//! Job definitions and execution bookkeeping

use super::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a scheduled job
pub type JobId = Uuid;

/// Status of a scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job is scheduled and will run
    Scheduled,
    /// Job is currently running
    Running,
    /// Last run completed successfully
    Completed,
    /// Last run failed or timed out
    Failed,
}

/// Metadata about a scheduled job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    pub id: JobId,
    pub name: String,
    pub description: Option<String>,

    /// Cron expression
    pub schedule: String,

    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,

    pub run_count: u64,
    pub success_count: u64,
    pub failure_count: u64,

    /// Average execution duration in milliseconds
    pub avg_duration_ms: f64,

    /// Error message of the most recent failed run
    pub last_error: Option<String>,
}

impl JobMetadata {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            schedule: schedule.into(),
            status: JobStatus::Scheduled,
            created_at: now,
            updated_at: now,
            last_run: None,
            run_count: 0,
            success_count: 0,
            failure_count: 0,
            avg_duration_ms: 0.0,
            last_error: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn update_execution(&mut self, result: &SchedulerResult<()>, duration_ms: u64) {
        self.run_count += 1;
        match result {
            Ok(()) => {
                self.success_count += 1;
                self.status = JobStatus::Completed;
            }
            Err(e) => {
                self.failure_count += 1;
                self.status = JobStatus::Failed;
                self.last_error = Some(e.to_string());
            }
        }

        // Incremental mean
        self.avg_duration_ms = ((self.avg_duration_ms * (self.run_count - 1) as f64)
            + duration_ms as f64)
            / self.run_count as f64;

        self.last_run = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn success_rate(&self) -> f64 {
        if self.run_count == 0 {
            0.0
        } else {
            (self.success_count as f64 / self.run_count as f64) * 100.0
        }
    }
}

type JobFuture = Pin<Box<dyn Future<Output = SchedulerResult<()>> + Send>>;

/// A scheduled job: metadata plus the async body run on each tick
pub struct Job {
    metadata: Arc<tokio::sync::RwLock<JobMetadata>>,
    body: Arc<dyn Fn() -> JobFuture + Send + Sync>,
}

impl Job {
    pub fn new<F, Fut>(metadata: JobMetadata, body: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SchedulerResult<()>> + Send + 'static,
    {
        Self {
            metadata: Arc::new(tokio::sync::RwLock::new(metadata)),
            body: Arc::new(move || Box::pin(body())),
        }
    }

    pub async fn get_metadata(&self) -> JobMetadata {
        self.metadata.read().await.clone()
    }

    /// Run the body once, bounded by `timeout`, and record the outcome
    pub async fn execute(&self, timeout: Duration) -> SchedulerResult<()> {
        let start = std::time::Instant::now();

        {
            let mut metadata = self.metadata.write().await;
            metadata.status = JobStatus::Running;
            metadata.updated_at = Utc::now();
        }

        let result = match tokio::time::timeout(timeout, (self.body)()).await {
            Ok(result) => result,
            Err(_) => Err(SchedulerError::JobTimedOut(timeout.as_secs())),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        self.metadata
            .write()
            .await
            .update_execution(&result, duration_ms);

        result
    }
}
