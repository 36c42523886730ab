//! Cache Record Module
//!
//! Defines the unit of storage persisted by every backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// == Cache Record ==
/// A stored key/value pair together with its store-assigned metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Store-assigned identifier, preserved across updates
    pub id: Uuid,
    /// Unique key
    pub key: String,
    /// Stored payload
    pub value: String,
    /// Time of the last write
    pub updated_at: DateTime<Utc>,
}

impl CacheRecord {
    /// Creates a record for a key that has never been stored.
    pub fn create(draft: NewRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: draft.key,
            value: draft.value,
            updated_at: Utc::now(),
        }
    }

    /// Replaces the payload in place, keeping the identifier.
    pub fn replace(&mut self, value: String) {
        self.value = value;
        self.updated_at = Utc::now();
    }
}

// == New Record ==
/// Caller-supplied fields for an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub key: String,
    pub value: String,
}

impl NewRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
