//! Persistence Gateway
//!
//! CRUD façade over a `RecordStore`. Applies the store deadline to every call
//! and turns backend failures into `CacheError`s that name the operation and
//! key. Absence is returned as `None`/`false`, never as an error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::{CacheRecord, NewRecord, RecordStore, DEFAULT_PAGE_SIZE};
use crate::error::{CacheError, Result};

// == Persistence Gateway ==
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl PersistenceGateway {
    /// Creates a gateway over a shared store handle.
    ///
    /// # Arguments
    /// * `store` - Process-wide store handle
    /// * `timeout` - Deadline applied to each store operation
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    // == Save ==
    /// Upserts by key and returns the stored record.
    pub async fn save(&self, draft: NewRecord) -> Result<CacheRecord> {
        let context = format!("save(key={})", draft.key);
        self.guarded(context, self.store.upsert(draft)).await
    }

    // == Read ==
    /// Point lookup. `Ok(None)` means the key is absent.
    pub async fn read(&self, key: &str) -> Result<Option<CacheRecord>> {
        self.guarded(format!("read(key={key})"), self.store.find(key)).await
    }

    // == Query ==
    /// Lists records.
    ///
    /// Without an offset, or with an offset of 0, every record is returned in
    /// store order. With a positive offset, records are sorted by key
    /// descending, `offset` are skipped and at most `page_size` (default 100)
    /// are returned.
    pub async fn query(
        &self,
        offset: Option<usize>,
        page_size: Option<usize>,
    ) -> Result<Vec<CacheRecord>> {
        match offset.filter(|o| *o > 0) {
            None => self.guarded("query".to_string(), self.store.scan_all()).await,
            Some(offset) => {
                let limit = page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE);
                self.guarded(
                    format!("query(offset={offset}, page_size={limit})"),
                    self.store.scan_page(offset, limit),
                )
                .await
            }
        }
    }

    // == Remove ==
    /// Deletes one record; returns whether it existed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let deleted = self
            .guarded(format!("remove(key={key})"), self.store.delete(key))
            .await?;
        Ok(deleted > 0)
    }

    // == Remove All ==
    /// Deletes every record.
    ///
    /// Returns true when the store was already empty. Otherwise returns true
    /// iff something was deleted; `false` indicates an inconsistent store.
    pub async fn remove_all(&self) -> Result<bool> {
        let existing = self
            .guarded("remove_all(count)".to_string(), self.store.count())
            .await?;
        if existing == 0 {
            return Ok(true);
        }

        let deleted = self
            .guarded("remove_all".to_string(), self.store.delete_all())
            .await?;
        if deleted == 0 {
            warn!(
                "Store reported {} records but deleted none ({} backend)",
                existing,
                self.store.backend()
            );
        }
        Ok(deleted > 0)
    }

    /// Releases the store connection. Called once at process shutdown.
    pub async fn close(&self) -> Result<()> {
        self.guarded("close".to_string(), self.store.close()).await
    }

    /// Name of the backing store, for logs.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    async fn guarded<T, F>(&self, context: String, op: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::StoreUnavailable {
                context,
                message: format!("{e:#}"),
            }),
            Err(_) => Err(CacheError::Timeout {
                context,
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
