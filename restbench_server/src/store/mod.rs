//! Record store for request logs
//!
//! `Store` is the single handle the service holds. It is opened once at
//! startup, shared by every request, and closed on shutdown.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::config::{Config, DatabaseConfig};
use restbench_common::{LogEntry, LogEntryPatch, NewLogEntry};

/// Storage failures (connectivity, constraint violations, bad rows)
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),
}

/// Backing store for request logs
#[derive(Debug, Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    /// Open the store described by the configuration
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        match &config.database {
            DatabaseConfig::Memory => Ok(Store::Memory(MemoryStore::new())),
            DatabaseConfig::Postgres(options) => {
                let store = PgStore::connect(options.clone(), config.max_connections).await?;
                Ok(Store::Postgres(store))
            }
        }
    }

    /// Bring the schema in line with the entity definition
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        match self {
            Store::Postgres(store) => store.ensure_schema().await,
            Store::Memory(_) => Ok(()),
        }
    }

    /// Persist a new entry, assigning its id and creation time
    pub async fn insert(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError> {
        match self {
            Store::Postgres(store) => store.insert(entry).await,
            Store::Memory(store) => Ok(store.insert(entry).await),
        }
    }

    /// Find an entry by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<LogEntry>, StoreError> {
        match self {
            Store::Postgres(store) => store.find_by_id(id).await,
            Store::Memory(store) => Ok(store.find_by_id(id).await),
        }
    }

    /// Newest-first slice of entries plus the total entry count
    pub async fn find_page(&self, offset: u64, limit: u64) -> Result<(Vec<LogEntry>, u64), StoreError> {
        match self {
            Store::Postgres(store) => store.find_page(offset, limit).await,
            Store::Memory(store) => Ok(store.find_page(offset, limit).await),
        }
    }

    /// Overwrite the supplied fields of an entry
    pub async fn update(&self, id: i64, patch: &LogEntryPatch) -> Result<Option<LogEntry>, StoreError> {
        match self {
            Store::Postgres(store) => store.update(id, patch).await,
            Store::Memory(store) => Ok(store.update(id, patch).await),
        }
    }

    /// Remove an entry. Returns false if it did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        match self {
            Store::Postgres(store) => store.delete(id).await,
            Store::Memory(store) => Ok(store.delete(id).await),
        }
    }

    /// Check the store is reachable
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Store::Postgres(store) => store.ping().await,
            Store::Memory(_) => Ok(()),
        }
    }

    /// Release connections
    pub async fn close(&self) {
        if let Store::Postgres(store) = self {
            store.close().await;
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Memory(_) => "memory",
        }
    }
}
