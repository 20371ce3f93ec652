use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::app::config::Config;
use crate::models::payment::{Payment, Processor, Summary};

pub mod memory;
#[cfg(feature = "storage-postgres")]
pub mod postgres;
#[cfg(feature = "storage-rocksdb")]
pub mod rocks;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error(transparent)]
    Rocks(#[from] rocksdb::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("missing column family {0}")]
    MissingColumnFamily(&'static str),
    #[cfg(feature = "storage-postgres")]
    #[error(transparent)]
    Postgres(#[from] sqlx::Error),
}

/// Persistence capability the dispatch core depends on. The core never
/// assumes a particular backend or transaction model; it only needs
/// concurrent `record` calls to not lose updates.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn record(&self, payment: Payment) -> Result<(), StoreError>;

    /// Aggregates confirmed payments for one processor over the inclusive
    /// window `[from, to]` on `requested_at`.
    async fn summarize(
        &self,
        processor: Processor,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Summary, StoreError>;

    async fn purge_all(&self) -> Result<(), StoreError>;
}

/// Opens the backend named by `STORAGE`. Asking for a backend that was not
/// compiled in is a startup error, not a silent fallback.
pub async fn from_env(config: &Config) -> anyhow::Result<Arc<dyn PaymentStore>> {
    match config.storage.as_str() {
        "memory" => Ok(Arc::new(memory::MemoryStore::new())),
        #[cfg(feature = "storage-rocksdb")]
        "rocksdb" => Ok(Arc::new(rocks::RocksStore::open(&config.rocksdb_path)?)),
        #[cfg(feature = "storage-postgres")]
        "postgres" => Ok(Arc::new(
            postgres::PostgresStore::connect(&config.database_url).await?,
        )),
        other => anyhow::bail!("unsupported storage backend {other:?}"),
    }
}
