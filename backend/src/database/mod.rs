//! Module for storage backend setup.
//!
//! This module is responsible for opening the storage backend selected in
//! the configuration and handing the rest of the application a single
//! `Arc<dyn Storage>`.

use std::sync::Arc;

use reparo_adapters::{JsonFileStore, SqliteStore, Storage, StoreResult};

use crate::config::StorageBackend;

pub async fn connect(backend: &StorageBackend) -> StoreResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match backend {
        StorageBackend::File { dir } => Arc::new(JsonFileStore::open(dir).await?),
        StorageBackend::Sqlite { url } => Arc::new(SqliteStore::connect(url).await?),
    };
    storage.health_check().await?;
    tracing::info!(backend = storage.backend_name(), "Storage ready");
    Ok(storage)
}
