//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Request body for the write operation (POST /cache/:key)
///
/// Both fields are optional at the serde level so that a missing field is
/// reported as a validation error rather than a JSON rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertRequest {
    /// The cache key, must match the path key
    #[serde(default)]
    pub key: Option<String>,
    /// The value to store
    #[serde(default)]
    pub value: Option<String>,
}

impl UpsertRequest {
    /// Validates the body against the key taken from the path and returns
    /// the value to store.
    pub fn into_value(self, path_key: &str) -> Result<String> {
        let key = self
            .key
            .ok_or_else(|| CacheError::InvalidRequest("Missing field 'key'".to_string()))?;
        let value = self
            .value
            .ok_or_else(|| CacheError::InvalidRequest("Missing field 'value'".to_string()))?;

        if key != path_key {
            return Err(CacheError::InvalidRequest(format!(
                "Body key '{}' does not match path key '{}'",
                key, path_key
            )));
        }
        Ok(value)
    }
}

/// Query string for listing keys (GET /cache)
///
/// Paging only applies when `offset` is present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}
