//! In-Memory Store
//!
//! A `RecordStore` kept in process memory. Records are ordered by key, which
//! gives a deterministic natural scan order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheRecord, NewRecord, RecordStore};

// == Memory Store ==
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, CacheRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, draft: NewRecord) -> anyhow::Result<CacheRecord> {
        // Single write-lock section: this is the serialization point per key
        let mut records = self.records.write().await;
        let stored = match records.get_mut(&draft.key) {
            Some(existing) => {
                existing.replace(draft.value);
                existing.clone()
            }
            None => {
                let record = CacheRecord::create(draft);
                records.insert(record.key.clone(), record.clone());
                record
            }
        };
        Ok(stored)
    }

    async fn find(&self, key: &str) -> anyhow::Result<Option<CacheRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn scan_all(&self) -> anyhow::Result<Vec<CacheRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn scan_page(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<CacheRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<u64> {
        Ok(self.records.write().await.remove(key).map_or(0, |_| 1))
    }

    async fn count(&self) -> anyhow::Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let mut records = self.records.write().await;
        let removed = records.len() as u64;
        records.clear();
        Ok(removed)
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
