//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `GET /cache` - List stored keys
//! - `DELETE /cache` - Delete every record
//! - `GET /cache/:key` - Read a value, synthesizing one on a miss
//! - `POST /cache/:key` - Insert or update a value
//! - `DELETE /cache/:key` - Delete a key
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
