use crate::error::{AppError, Result};
use crate::models::{day_key, TicketMetricsDaily};
use crate::state::RollupStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent rollup store using Sled embedded database
#[derive(Clone)]
pub struct SledRollupStore {
    db: Arc<Db>,
    daily_tree: sled::Tree,
}

impl SledRollupStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref).map_err(|e| {
            AppError::Database(format!("Failed to open Sled database: {}", e))
        })?;

        let daily_tree = db.open_tree("ticket_metrics_daily").map_err(|e| {
            AppError::Database(format!("Failed to open rollup tree: {}", e))
        })?;

        tracing::info!("Initialized Sled rollup store at {:?}", path_ref);

        Ok(Self {
            db: Arc::new(db),
            daily_tree,
        })
    }

    fn serialize_row(row: &TicketMetricsDaily) -> Result<Vec<u8>> {
        bincode::serialize(row).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize rollup row: {}", e))
        })
    }

    fn deserialize_row(bytes: &[u8]) -> Result<TicketMetricsDaily> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize rollup row: {}", e))
        })
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Database(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }

    /// Number of stored day rows
    pub fn len(&self) -> usize {
        self.daily_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily_tree.is_empty()
    }
}

#[async_trait]
impl RollupStore for SledRollupStore {
    async fn upsert_daily(&self, rows: &[TicketMetricsDaily]) -> Result<usize> {
        let mut batch = sled::Batch::default();
        for row in rows {
            batch.insert(row.key().as_bytes(), Self::serialize_row(row)?);
        }

        self.daily_tree.apply_batch(batch).map_err(|e| {
            AppError::Database(format!("Failed to write rollup rows: {}", e))
        })?;

        // Flush to ensure durability
        self.daily_tree.flush_async().await.map_err(|e| {
            AppError::Database(format!("Failed to flush rollup tree: {}", e))
        })?;

        tracing::debug!(rows = rows.len(), "Rollup rows upserted to Sled");
        Ok(rows.len())
    }

    async fn daily_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TicketMetricsDaily>> {
        if start > end {
            return Ok(Vec::new());
        }

        let start_key = day_key(start);
        let end_key = day_key(end);

        let mut rows = Vec::new();
        for entry in self
            .daily_tree
            .range(start_key.as_bytes()..=end_key.as_bytes())
        {
            let (_, value) = entry.map_err(|e| {
                AppError::Database(format!("Failed to scan rollup rows: {}", e))
            })?;
            rows.push(Self::deserialize_row(&value)?);
        }

        Ok(rows)
    }
}
