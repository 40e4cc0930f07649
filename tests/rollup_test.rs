//! Rollup writer against the persistent sled store

mod common;

use chrono::Duration;
use common::{at, day, Fixture};
use std::sync::Arc;
use tempfile::TempDir;
use ticket_sla_analytics::analytics::{AnalyticsConfig, AnalyticsError, RollupWriter};
use ticket_sla_analytics::config::{RollupBackend, RollupConfig};
use ticket_sla_analytics::models::{Priority, SlaConfigRow};
use ticket_sla_analytics::state::{create_rollup_store, RollupStore, SledRollupStore};

fn seeded() -> Fixture {
    let fixture = Fixture::new();

    // Opened well before the range, resolved on June 4th
    fixture.resolved(
        Priority::Low,
        at(2024, 5, 20, 9, 0),
        Duration::hours(1),
        Duration::days(15),
    );
    // Opened and resolved on June 3rd
    fixture.resolved(
        Priority::High,
        at(2024, 6, 3, 9, 0),
        Duration::minutes(15),
        Duration::hours(2),
    );
    // Still open, past its URGENT target
    fixture.open(Priority::Urgent, at(2024, 6, 5, 9, 0));

    fixture
}

#[tokio::test]
async fn test_rollup_is_idempotent_on_sled() {
    let temp_dir = TempDir::new().unwrap();
    let fixture = seeded();
    let store = Arc::new(SledRollupStore::new(temp_dir.path()).unwrap());
    let writer = RollupWriter::new(
        fixture.store.clone(),
        store.clone(),
        AnalyticsConfig::default(),
        90,
    );
    let now = at(2024, 6, 8, 1, 15);

    let first = writer.run(day(2024, 6, 1), day(2024, 6, 7), now).await.unwrap();
    assert_eq!(first, 7);
    let rows_after_first = store.daily_range(day(2024, 6, 1), day(2024, 6, 7)).await.unwrap();

    let second = writer.run(day(2024, 6, 1), day(2024, 6, 7), now).await.unwrap();
    assert_eq!(second, 7);
    let rows_after_second = store.daily_range(day(2024, 6, 1), day(2024, 6, 7)).await.unwrap();

    assert_eq!(rows_after_first, rows_after_second);
    assert_eq!(store.len(), 7);
}

#[tokio::test]
async fn test_rollup_rows_carry_daily_metrics() {
    let temp_dir = TempDir::new().unwrap();
    let fixture = seeded();
    let store = Arc::new(SledRollupStore::new(temp_dir.path()).unwrap());
    let writer = RollupWriter::new(
        fixture.store.clone(),
        store.clone(),
        AnalyticsConfig::default(),
        90,
    );

    writer
        .run(day(2024, 6, 1), day(2024, 6, 7), at(2024, 6, 8, 1, 15))
        .await
        .unwrap();
    let rows = store.daily_range(day(2024, 6, 1), day(2024, 6, 7)).await.unwrap();

    let days: Vec<_> = rows.iter().map(|row| row.day).collect();
    assert_eq!(days.first(), Some(&day(2024, 6, 1)));
    assert_eq!(days.last(), Some(&day(2024, 6, 7)));

    let june_3 = &rows[2];
    assert_eq!(june_3.opened, 1);
    assert_eq!(june_3.resolved, 1);
    assert_eq!(june_3.mtta_minutes, 15);
    assert_eq!(june_3.mttr_minutes, 120);

    // Resolution day bucket picks up the ticket from the lookback
    let june_4 = &rows[3];
    assert_eq!(june_4.opened, 0);
    assert_eq!(june_4.resolved, 1);
    assert_eq!(june_4.mttr_minutes, 15 * 24 * 60);

    let june_5 = &rows[4];
    assert_eq!(june_5.opened, 1);
    assert_eq!(june_5.sla_breached, 1);

    assert_eq!(rows[6].opened, 0);
    assert_eq!(rows[6].mtta_minutes, 0);
}

#[tokio::test]
async fn test_rollup_rows_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let fixture = seeded();

    {
        let store = Arc::new(SledRollupStore::new(temp_dir.path()).unwrap());
        let writer = RollupWriter::new(
            fixture.store.clone(),
            store.clone(),
            AnalyticsConfig::default(),
            90,
        );
        writer
            .run(day(2024, 6, 3), day(2024, 6, 3), at(2024, 6, 4, 0, 0))
            .await
            .unwrap();
        store.flush().await.unwrap();
    }

    let reopened = SledRollupStore::new(temp_dir.path()).unwrap();
    let rows = reopened
        .daily_range(day(2024, 6, 3), day(2024, 6, 3))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].opened, 1);
}

#[tokio::test]
async fn test_configured_sla_rows_drive_breaches() {
    let fixture = seeded();
    // HIGH ticket resolved in 2h now breaches a 60 minute target
    fixture
        .store
        .set_sla_config(vec![SlaConfigRow::new("HIGH", 60)]);

    let rollup_store = create_rollup_store(&RollupConfig {
        backend: RollupBackend::Memory,
        path: None,
        lookback_days: 90,
    })
    .unwrap();
    let writer = RollupWriter::new(
        fixture.store.clone(),
        rollup_store.clone(),
        AnalyticsConfig::default(),
        90,
    );

    writer
        .run(day(2024, 6, 3), day(2024, 6, 3), at(2024, 6, 8, 0, 0))
        .await
        .unwrap();
    let rows = rollup_store
        .daily_range(day(2024, 6, 3), day(2024, 6, 3))
        .await
        .unwrap();
    assert_eq!(rows[0].sla_breached, 1);
}

#[tokio::test]
async fn test_inverted_rollup_range_is_rejected() {
    let fixture = seeded();
    let writer = RollupWriter::new(
        fixture.store.clone(),
        fixture.store.clone(),
        AnalyticsConfig::default(),
        90,
    );

    let result = writer
        .run(day(2024, 6, 7), day(2024, 6, 1), at(2024, 6, 8, 0, 0))
        .await;
    assert!(matches!(result, Err(AnalyticsError::InvalidDateRange(_))));
}
