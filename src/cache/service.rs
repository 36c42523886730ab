//! Cache Service Module
//!
//! Read-through / write-through policy over the `PersistenceGateway`.
//!
//! The service holds no mutable state of its own. Two concurrent misses for
//! the same key may each synthesize a value; the store keeps whichever
//! upsert commits last and each caller receives the value it synthesized.

use rand::{distributions::Alphanumeric, Rng};
use tracing::{debug, info};

use crate::cache::{GENERATED_VALUE_LENGTH, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};
use crate::store::{CacheRecord, NewRecord, PersistenceGateway};

// == Lookup ==
/// Outcome of a read-through lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub value: String,
    /// True when the value was already stored
    pub hit: bool,
}

// == Upserted ==
/// Outcome of an explicit write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub record: CacheRecord,
    /// True when no record existed for the key before the write
    pub created: bool,
}

// == Cache Service ==
#[derive(Clone)]
pub struct CacheService {
    gateway: PersistenceGateway,
}

impl CacheService {
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Underlying gateway, shared with the rest of the process.
    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    // == Get Or Create ==
    /// Returns the stored value for `key`, or synthesizes, stores and returns
    /// a random one when the key is absent.
    pub async fn get_or_create(&self, key: &str) -> Result<Lookup> {
        validate_key(key)?;

        if let Some(record) = self.gateway.read(key).await? {
            info!(key, "Cache hit");
            return Ok(Lookup {
                value: record.value,
                hit: true,
            });
        }

        info!(key, "Cache miss");
        let value = generate_value(GENERATED_VALUE_LENGTH);
        let stored = self.gateway.save(NewRecord::new(key, value)).await?;

        Ok(Lookup {
            value: stored.value,
            hit: false,
        })
    }

    // == Upsert ==
    /// Writes `value` under `key`, reporting whether the key was new.
    pub async fn upsert(&self, key: &str, value: String) -> Result<Upserted> {
        validate_key(key)?;
        validate_value(&value)?;

        let created = self.gateway.read(key).await?.is_none();
        let record = self.gateway.save(NewRecord::new(key, value)).await?;
        debug!(key, created, "Cache record written");

        Ok(Upserted { record, created })
    }

    // == Delete One ==
    /// Returns whether a record existed and was deleted.
    pub async fn delete_one(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.gateway.remove(key).await
    }

    // == Delete All ==
    pub async fn delete_all(&self) -> Result<bool> {
        self.gateway.remove_all().await
    }

    // == List Keys ==
    /// All stored keys in store order.
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let records = self.gateway.query(None, None).await?;
        Ok(records.into_iter().map(|r| r.key).collect())
    }

    /// A page of keys sorted descending. An offset of 0 lists every key in
    /// store order.
    pub async fn list_keys_page(
        &self,
        offset: usize,
        page_size: Option<usize>,
    ) -> Result<Vec<String>> {
        let records = self.gateway.query(Some(offset), page_size).await?;
        Ok(records.into_iter().map(|r| r.key).collect())
    }
}

/// Random alphanumeric string of `len` characters.
pub fn generate_value(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<()> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(CacheError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SqliteStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn service() -> CacheService {
        let gateway = PersistenceGateway::new(Arc::new(MemoryStore::new()), Duration::from_secs(5));
        CacheService::new(gateway)
    }

    #[test]
    fn test_generate_value_shape() {
        let value = generate_value(GENERATED_VALUE_LENGTH);
        assert_eq!(value.len(), GENERATED_VALUE_LENGTH);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(value, generate_value(GENERATED_VALUE_LENGTH));
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let service = service();

        let first = service.get_or_create("abcd").await.unwrap();
        assert!(!first.hit);
        assert_eq!(first.value.len(), GENERATED_VALUE_LENGTH);

        let second = service.get_or_create("abcd").await.unwrap();
        assert!(second.hit);
        assert_eq!(second.value, first.value);
    }

    #[tokio::test]
    async fn test_upsert_created_then_updated() {
        let service = service();

        let first = service.upsert("key1", "v1".to_string()).await.unwrap();
        assert!(first.created);
        assert_eq!(first.record.value, "v1");

        let second = service.upsert("key1", "v2".to_string()).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.record.id, first.record.id);

        let read = service.get_or_create("key1").await.unwrap();
        assert_eq!(read, Lookup { value: "v2".to_string(), hit: true });
    }

    #[tokio::test]
    async fn test_delete_one_then_fresh_miss() {
        let service = service();
        service.upsert("key1", "original".to_string()).await.unwrap();

        assert!(service.delete_one("key1").await.unwrap());
        assert!(!service.delete_one("key1").await.unwrap());

        let lookup = service.get_or_create("key1").await.unwrap();
        assert!(!lookup.hit);
        assert_ne!(lookup.value, "original");
    }

    #[tokio::test]
    async fn test_delete_all_empties() {
        let service = service();
        for key in ["a", "b", "c"] {
            service.upsert(key, "v".to_string()).await.unwrap();
        }

        assert!(service.delete_all().await.unwrap());
        assert!(service.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_keys_and_pages() {
        let service = service();
        for key in ["b", "a", "c"] {
            service.upsert(key, "v".to_string()).await.unwrap();
        }

        assert_eq!(service.list_keys().await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(
            service.list_keys_page(1, Some(1)).await.unwrap(),
            vec!["b"]
        );
    }

    #[tokio::test]
    async fn test_invalid_keys_rejected() {
        let service = service();

        assert!(matches!(
            service.get_or_create("").await,
            Err(CacheError::InvalidRequest(_))
        ));
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
        assert!(matches!(
            service.upsert(&long_key, "v".to_string()).await,
            Err(CacheError::InvalidRequest(_))
        ));
        let large_value = "x".repeat(MAX_VALUE_SIZE + 1);
        assert!(matches!(
            service.upsert("key", large_value).await,
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_read_through_on_sqlite() {
        let store = SqliteStore::open_in_memory("caches").await.unwrap();
        let service =
            CacheService::new(PersistenceGateway::new(Arc::new(store), Duration::from_secs(5)));

        let miss = service.get_or_create("abcd").await.unwrap();
        let hit = service.get_or_create("abcd").await.unwrap();
        assert!(!miss.hit);
        assert!(hit.hit);
        assert_eq!(miss.value, hit.value);

        let written = service.upsert("abcd2", "test".to_string()).await.unwrap();
        assert!(written.created);
        assert_eq!(service.list_keys().await.unwrap(), vec!["abcd", "abcd2"]);
    }

    #[tokio::test]
    async fn test_concurrent_misses_converge_to_one_record() {
        let service = service();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.get_or_create("shared").await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(service.list_keys().await.unwrap(), vec!["shared"]);
        let settled = service.get_or_create("shared").await.unwrap();
        let again = service.get_or_create("shared").await.unwrap();
        assert!(settled.hit);
        assert_eq!(settled.value, again.value);
    }
}
