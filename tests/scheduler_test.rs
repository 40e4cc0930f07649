//! Tests for the batch scheduler

mod common;

use chrono::Utc;
use common::Fixture;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use ticket_sla_analytics::analytics::{AnalyticsConfig, RollupWriter};
use ticket_sla_analytics::models::Priority;
use ticket_sla_analytics::scheduler::{
    init_scheduler_metrics, Job, JobMetadata, JobStatus, SchedulerConfig, SchedulerConfigBuilder,
    SchedulerError, SchedulerService, DAILY_ROLLUP_JOB,
};
use ticket_sla_analytics::state::RollupStore;

#[tokio::test]
async fn test_scheduler_start_stop() {
    let mut scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .expect("Failed to create scheduler");

    scheduler.start().await.expect("Failed to start scheduler");
    assert!(scheduler.is_running().await);

    scheduler.shutdown().await.expect("Failed to stop scheduler");
    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn test_disabled_scheduler_does_not_start() {
    let config = SchedulerConfigBuilder::new().enabled(false).build();
    let mut scheduler = SchedulerService::new(config).await.unwrap();

    scheduler.start().await.unwrap();
    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn test_run_now_updates_metadata() {
    let scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .unwrap();

    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();
    let job = Job::new(JobMetadata::new("counting", "0 0 * * * *"), move || {
        let counter = counter_clone.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    let job_id = scheduler.add_job(job).await.unwrap();
    scheduler.run_now(&job_id).await.unwrap();
    scheduler.run_now(&job_id).await.unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 2);

    let metadata = scheduler.get_job_metadata(&job_id).await.unwrap();
    assert_eq!(metadata.run_count, 2);
    assert_eq!(metadata.status, JobStatus::Completed);

    let stats = scheduler.get_stats().await;
    assert_eq!(stats.total_jobs, 1);
    assert_eq!(stats.total_executions, 2);
    assert_eq!(stats.success_rate, 100.0);
}

#[tokio::test]
async fn test_job_timeout_is_recorded() {
    let config = SchedulerConfigBuilder::new()
        .job_timeout(Duration::from_secs(1))
        .build();
    let scheduler = SchedulerService::new(config).await.unwrap();

    let job = Job::new(JobMetadata::new("stuck", "0 0 * * * *"), || async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    });
    let job_id = scheduler.add_job(job).await.unwrap();

    let result = scheduler.run_now(&job_id).await;
    assert!(matches!(result, Err(SchedulerError::JobTimedOut(1))));

    let metadata = scheduler.get_job_metadata(&job_id).await.unwrap();
    assert_eq!(metadata.failure_count, 1);
    assert_eq!(metadata.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_remove_job() {
    let scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .unwrap();

    let job = Job::new(JobMetadata::new("temporary", "0 0 * * * *"), || async { Ok(()) });
    let job_id = scheduler.add_job(job).await.unwrap();
    assert_eq!(scheduler.list_jobs().await.len(), 1);

    scheduler.remove_job(&job_id).await.unwrap();
    assert!(scheduler.list_jobs().await.is_empty());

    let result = scheduler.get_job_metadata(&job_id).await;
    assert!(matches!(result, Err(SchedulerError::JobNotFound(_))));
}

#[tokio::test]
async fn test_daily_rollup_job_writes_rows() {
    init_scheduler_metrics().unwrap();

    let fixture = Fixture::new();
    fixture.open(Priority::High, Utc::now() - chrono::Duration::hours(1));

    let writer = Arc::new(RollupWriter::new(
        fixture.store.clone(),
        fixture.store.clone(),
        AnalyticsConfig::default(),
        30,
    ));

    let config = SchedulerConfigBuilder::new().rollup_range_days(3).build();
    let scheduler = SchedulerService::new(config).await.unwrap();
    let job_id = scheduler
        .register_daily_rollup(writer)
        .await
        .unwrap()
        .expect("daily rollup should be enabled by default");

    let metadata = scheduler.get_job_metadata(&job_id).await.unwrap();
    assert_eq!(metadata.name, DAILY_ROLLUP_JOB);
    assert_eq!(metadata.schedule, "0 15 1 * * *");

    scheduler.run_now(&job_id).await.unwrap();

    let today = Utc::now().date_naive();
    let rows = fixture
        .store
        .daily_range(today - chrono::Duration::days(2), today)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.iter().map(|row| row.opened).sum::<u64>(), 1);
}

#[tokio::test]
async fn test_disabled_daily_rollup_is_not_registered() {
    let fixture = Fixture::new();
    let writer = Arc::new(RollupWriter::new(
        fixture.store.clone(),
        fixture.store.clone(),
        AnalyticsConfig::default(),
        30,
    ));

    let mut config = SchedulerConfig::default();
    config.daily_rollup.enabled = false;
    let scheduler = SchedulerService::new(config).await.unwrap();

    assert!(scheduler.register_daily_rollup(writer).await.unwrap().is_none());
    assert!(scheduler.list_jobs().await.is_empty());
}
