//! Core scheduler service implementation

use super::{
    config::SchedulerConfig,
    error::{SchedulerError, SchedulerResult},
    jobs::{Job, JobId, JobMetadata, JobStatus},
    metrics::SCHEDULER_METRICS,
    tasks::daily_rollup_job,
};
use crate::analytics::RollupWriter;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_cron_scheduler::{JobScheduler, JobSchedulerError};
use tracing::{debug, error, info, warn};

/// Runs batch jobs on cron schedules
pub struct SchedulerService {
    config: SchedulerConfig,

    /// Underlying tokio-cron-scheduler instance
    scheduler: JobScheduler,

    /// Registered jobs
    jobs: Arc<DashMap<JobId, Arc<Job>>>,

    /// Cron scheduler handle for each registered job
    cron_ids: Arc<DashMap<JobId, uuid::Uuid>>,

    running: Arc<tokio::sync::RwLock<bool>>,
}

impl SchedulerService {
    /// Create a new scheduler service
    pub async fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        info!("Initializing scheduler service");

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;

        Ok(Self {
            config,
            scheduler,
            jobs: Arc::new(DashMap::new()),
            cron_ids: Arc::new(DashMap::new()),
            running: Arc::new(tokio::sync::RwLock::new(false)),
        })
    }

    /// Register the daily rollup job if it is enabled
    pub async fn register_daily_rollup(
        &self,
        writer: Arc<RollupWriter>,
    ) -> SchedulerResult<Option<JobId>> {
        let job_config = &self.config.daily_rollup;
        if !job_config.enabled {
            info!("Daily rollup job is disabled in configuration");
            return Ok(None);
        }
        if job_config.range_days == 0 {
            return Err(SchedulerError::ConfigurationError(
                "daily_rollup.range_days must be positive".to_string(),
            ));
        }

        let job_id = self.add_job(daily_rollup_job(writer, job_config)).await?;
        Ok(Some(job_id))
    }

    /// Start the scheduler
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in configuration");
            return Ok(());
        }

        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Scheduler is already running");
                return Ok(());
            }
            *running = true;
        }

        info!(jobs = self.jobs.len(), "Starting scheduler service");

        self.scheduler
            .start()
            .await
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;

        Ok(())
    }

    /// Stop the scheduler
    pub async fn shutdown(&mut self) -> SchedulerResult<()> {
        {
            let mut running = self.running.write().await;
            if !*running {
                warn!("Scheduler is not running");
                return Ok(());
            }
            *running = false;
        }

        info!("Shutting down scheduler service");

        self.scheduler
            .shutdown()
            .await
            .map_err(|e| SchedulerError::ShutdownFailed(e.to_string()))?;

        Ok(())
    }

    /// Add a job to the scheduler
    pub async fn add_job(&self, job: Job) -> SchedulerResult<JobId> {
        let metadata = job.get_metadata().await;
        let job_id = metadata.id;
        let job_name = metadata.name.clone();
        let schedule = metadata.schedule.clone();
        let timeout = self.config.job_timeout();

        info!(job_id = %job_id, job_name = %job_name, schedule = %schedule, "Adding job to scheduler");

        let job = Arc::new(job);
        let tick_job = job.clone();
        let cron_job = tokio_cron_scheduler::Job::new_async(schedule.as_str(), move |_uuid, _l| {
            let job = tick_job.clone();
            Box::pin(async move {
                let job_name = job.get_metadata().await.name;
                debug!(job_name = %job_name, "Executing scheduled job");

                SCHEDULER_METRICS.record_execution_start(&job_name);
                let start = std::time::Instant::now();
                let result = job.execute(timeout).await;
                let duration = start.elapsed();

                let outcome = match &result {
                    Ok(()) => "success",
                    Err(SchedulerError::JobTimedOut(_)) => "timeout",
                    Err(_) => "failed",
                };
                SCHEDULER_METRICS.record_execution_complete(
                    &job_name,
                    outcome,
                    duration.as_secs_f64(),
                );

                match result {
                    Ok(()) => info!(
                        job_name = %job_name,
                        duration_ms = duration.as_millis(),
                        "Job executed successfully"
                    ),
                    Err(e) => error!(
                        job_name = %job_name,
                        error = %e,
                        duration_ms = duration.as_millis(),
                        "Job execution failed"
                    ),
                }
            })
        })
        .map_err(|e: JobSchedulerError| SchedulerError::JobCreationFailed(e.to_string()))?;

        let cron_id = self
            .scheduler
            .add(cron_job)
            .await
            .map_err(|e| SchedulerError::JobCreationFailed(e.to_string()))?;

        self.jobs.insert(job_id, job);
        self.cron_ids.insert(job_id, cron_id);
        SCHEDULER_METRICS.update_job_count(self.jobs.len());

        Ok(job_id)
    }

    /// Remove a job from the scheduler
    pub async fn remove_job(&self, job_id: &JobId) -> SchedulerResult<()> {
        let (_, cron_id) = self
            .cron_ids
            .remove(job_id)
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;

        self.scheduler
            .remove(&cron_id)
            .await
            .map_err(|e| SchedulerError::InternalError(e.to_string()))?;

        self.jobs.remove(job_id);
        SCHEDULER_METRICS.update_job_count(self.jobs.len());

        info!(job_id = %job_id, "Removed job from scheduler");
        Ok(())
    }

    /// Run a registered job immediately, outside its schedule
    pub async fn run_now(&self, job_id: &JobId) -> SchedulerResult<()> {
        let job = self
            .jobs
            .get(job_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;

        job.execute(self.config.job_timeout()).await
    }

    /// Get job metadata
    pub async fn get_job_metadata(&self, job_id: &JobId) -> SchedulerResult<JobMetadata> {
        let job = self
            .jobs
            .get(job_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;

        Ok(job.get_metadata().await)
    }

    /// List all jobs
    pub async fn list_jobs(&self) -> Vec<JobMetadata> {
        let jobs: Vec<Arc<Job>> = self.jobs.iter().map(|entry| entry.value().clone()).collect();

        let mut metadata = Vec::with_capacity(jobs.len());
        for job in jobs {
            metadata.push(job.get_metadata().await);
        }
        metadata
    }

    /// Get scheduler statistics
    pub async fn get_stats(&self) -> SchedulerStats {
        let jobs = self.list_jobs().await;

        let total_executions: u64 = jobs.iter().map(|j| j.run_count).sum();
        let total_successes: u64 = jobs.iter().map(|j| j.success_count).sum();
        let total_failures: u64 = jobs.iter().map(|j| j.failure_count).sum();

        let success_rate = if total_executions > 0 {
            (total_successes as f64 / total_executions as f64) * 100.0
        } else {
            0.0
        };

        SchedulerStats {
            total_jobs: jobs.len(),
            running_jobs: jobs
                .iter()
                .filter(|j| j.status == JobStatus::Running)
                .count(),
            total_executions,
            total_successes,
            total_failures,
            success_rate,
        }
    }

    /// Check if scheduler is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

/// Statistics about the scheduler
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchedulerStats {
    pub total_jobs: usize,
    pub running_jobs: usize,
    pub total_executions: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub success_rate: f64,
}
