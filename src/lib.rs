//! kvcache - A read-through key/value cache service
//!
//! Serves string values over HTTP from a persistent document store, creating
//! a random value the first time an unknown key is read.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;

pub use api::AppState;
pub use cache::CacheService;
pub use config::Config;
pub use store::{open_store, PersistenceGateway, RecordStore};
