//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::cache::CacheService;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, ListQuery, UpsertRequest};
use crate::store::{open_store, CacheRecord, PersistenceGateway, RecordStore};

/// Response header reporting whether a read was served from the store.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// Application state shared across all handlers.
///
/// Holds the cache service, which owns a clone of the process-wide store
/// handle.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheService,
}

impl AppState {
    /// Creates a new AppState with the given cache service.
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }

    /// Creates a new AppState over an already opened store.
    pub fn from_store(store: Arc<dyn RecordStore>, store_timeout: Duration) -> Self {
        Self::new(CacheService::new(PersistenceGateway::new(store, store_timeout)))
    }

    /// Opens the configured store and builds the state around it.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let store = open_store(&config.db_con_url, &config.db_name).await?;
        Ok(Self::from_store(store, config.store_timeout()))
    }
}

/// Handler for GET /cache
///
/// Lists stored keys. A positive `?offset=` pages the keys sorted descending;
/// an offset of 0 lists everything in store order.
pub async fn list_keys_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<String>>> {
    let keys = match query.offset {
        Some(offset) => state.cache.list_keys_page(offset, query.page_size).await?,
        None => state.cache.list_keys().await?,
    };
    Ok(Json(keys))
}

/// Handler for GET /cache/:key
///
/// Returns the stored value as plain text, synthesizing one on a miss.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let lookup = state.cache.get_or_create(&key).await?;
    let status = HeaderValue::from_static(if lookup.hit { "HIT" } else { "MISS" });

    Ok(([(CACHE_STATUS_HEADER, status)], lookup.value).into_response())
}

/// Handler for POST /cache/:key
///
/// Inserts or updates the value. Responds 201 for a new key, 200 otherwise.
/// Bodies that are not a JSON object of strings are rejected with 400.
pub async fn upsert_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: std::result::Result<Json<UpsertRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CacheRecord>)> {
    let Json(req) =
        payload.map_err(|rejection| CacheError::InvalidRequest(rejection.body_text()))?;
    let value = req.into_value(&key)?;
    let upserted = state.cache.upsert(&key, value).await?;

    let status = if upserted.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(upserted.record)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    if state.cache.delete_one(&key).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for DELETE /cache
pub async fn delete_all_handler(State(state): State<AppState>) -> Result<StatusCode> {
    if state.cache.delete_all().await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        warn!("Delete-all removed nothing from a non-empty store");
        Err(CacheError::Internal(
            "Store reported records but deleted none".to_string(),
        ))
    }
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.gateway().backend()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn test_state() -> AppState {
        AppState::from_store(Arc::new(MemoryStore::new()), Duration::from_secs(5))
    }

    fn upsert_request(key: &str, value: &str) -> UpsertRequest {
        UpsertRequest {
            key: Some(key.to_string()),
            value: Some(value.to_string()),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get_handler() {
        let state = test_state();

        let (status, record) = upsert_handler(
            State(state.clone()),
            Path("test_key".to_string()),
            Ok(Json(upsert_request("test_key", "test_value"))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record.value, "test_value");

        let (status, _) = upsert_handler(
            State(state.clone()),
            Path("test_key".to_string()),
            Ok(Json(upsert_request("test_key", "updated"))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_STATUS_HEADER], "HIT");
    }

    #[tokio::test]
    async fn test_get_missing_key_is_a_miss() {
        let state = test_state();

        let response = get_handler(State(state), Path("nonexistent".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_STATUS_HEADER], "MISS");
    }

    #[tokio::test]
    async fn test_upsert_key_mismatch() {
        let state = test_state();

        let result = upsert_handler(
            State(state),
            Path("abcd".to_string()),
            Ok(Json(upsert_request("other", "v"))),
        )
        .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        state.cache.upsert("to_delete", "value".to_string()).await.unwrap();

        let status = delete_handler(State(state.clone()), Path("to_delete".to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_and_delete_all_handlers() {
        let state = test_state();
        for key in ["a", "b", "c"] {
            state.cache.upsert(key, "v".to_string()).await.unwrap();
        }

        let keys = list_keys_handler(State(state.clone()), Query(ListQuery::default()))
            .await
            .unwrap();
        assert_eq!(keys.0, vec!["a", "b", "c"]);

        let paged = list_keys_handler(
            State(state.clone()),
            Query(ListQuery {
                offset: Some(1),
                page_size: Some(2),
            }),
        )
        .await
        .unwrap();
        assert_eq!(paged.0, vec!["b", "a"]);

        let unpaged = list_keys_handler(
            State(state.clone()),
            Query(ListQuery {
                offset: Some(0),
                page_size: Some(2),
            }),
        )
        .await
        .unwrap();
        assert_eq!(unpaged.0, vec!["a", "b", "c"]);

        let status = delete_all_handler(State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let keys = list_keys_handler(State(state), Query(ListQuery::default()))
            .await
            .unwrap();
        assert!(keys.0.is_empty());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(test_state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.store, "memory");
    }

    #[tokio::test]
    async fn test_connect_uses_configured_store() {
        let config = Config {
            db_con_url: "sqlite::memory:".to_string(),
            ..Config::default()
        };
        let state = AppState::connect(&config).await.unwrap();
        assert_eq!(state.cache.gateway().backend(), "sqlite");
    }
}
