//! Cache Module
//!
//! Read-through cache policy layered over the persistence gateway.

mod service;


// Re-export public types
pub use service::{generate_value, CacheService, Lookup, Upserted};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Length of values synthesized on a cache miss
pub const GENERATED_VALUE_LENGTH: usize = 24;
