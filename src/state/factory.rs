use crate::config::{RollupBackend, RollupConfig};
use crate::error::{AppError, Result};
use crate::state::{InMemoryStore, RollupStore, SledRollupStore};
use std::sync::Arc;

/// Create a rollup store based on configuration
pub fn create_rollup_store(config: &RollupConfig) -> Result<Arc<dyn RollupStore>> {
    config.validate()?;

    match config.backend {
        RollupBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration(
                    "Sled rollup backend requires 'path' configuration".to_string(),
                )
            })?;

            tracing::info!(path = ?path, "Initializing Sled rollup backend");

            let store = SledRollupStore::new(path)?;
            Ok(Arc::new(store))
        }

        RollupBackend::Memory => {
            tracing::info!("Initializing in-memory rollup backend");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Create an in-memory store (for testing and dataset mode)
pub fn create_in_memory_store() -> Arc<InMemoryStore> {
    tracing::info!("Initializing in-memory storage backend");
    Arc::new(InMemoryStore::new())
}
