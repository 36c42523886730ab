//! Store Module
//!
//! Persistence for cache records: the `RecordStore` backend interface, its
//! in-memory and SQLite implementations, and the `PersistenceGateway` the
//! cache service talks to.

mod gateway;
mod memory;
mod record;
mod sqlite;

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;

// Re-export public types
pub use gateway::PersistenceGateway;
pub use memory::MemoryStore;
pub use record::{CacheRecord, NewRecord};
pub use sqlite::{validate_collection_name, SqliteStore};

// == Public Constants ==
/// Page size used by paged queries when none is requested
pub const DEFAULT_PAGE_SIZE: usize = 100;

// == Record Store ==
/// Backend interface for a document store holding cache records.
///
/// Implementations must enforce key uniqueness and make `upsert` atomic.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Inserts the record, or replaces the value of the record with the same key.
    async fn upsert(&self, draft: NewRecord) -> anyhow::Result<CacheRecord>;

    async fn find(&self, key: &str) -> anyhow::Result<Option<CacheRecord>>;

    /// All records in the store's natural order.
    async fn scan_all(&self) -> anyhow::Result<Vec<CacheRecord>>;

    /// Records sorted by key descending, skipping `offset`, at most `limit`.
    async fn scan_page(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<CacheRecord>>;

    /// Returns the number of records deleted.
    async fn delete(&self, key: &str) -> anyhow::Result<u64>;

    async fn count(&self) -> anyhow::Result<u64>;

    /// Returns the number of records deleted.
    async fn delete_all(&self) -> anyhow::Result<u64>;

    /// Releases the underlying connection.
    async fn close(&self) -> anyhow::Result<()>;
}

/// Opens the backend named by a connection string.
///
/// Supported forms: `memory://`, `sqlite::memory:`, `sqlite://<path>`.
pub async fn open_store(url: &str, collection: &str) -> anyhow::Result<Arc<dyn RecordStore>> {
    validate_collection_name(collection)?;

    if url == "memory://" {
        return Ok(Arc::new(MemoryStore::new()));
    }
    if url == "sqlite::memory:" {
        return Ok(Arc::new(SqliteStore::open_in_memory(collection).await?));
    }
    if let Some(path) = url.strip_prefix("sqlite://") {
        if path.is_empty() {
            bail!("sqlite connection string is missing a database path");
        }
        return Ok(Arc::new(SqliteStore::open(path, collection).await?));
    }

    let scheme = url.split_once(':').map_or(url, |(scheme, _)| scheme);
    bail!("unsupported store scheme '{}'", scheme)
}
