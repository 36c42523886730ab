//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

/// Default store connection string (in-process store).
pub const DEFAULT_DB_CON_URL: &str = "memory://";

/// Default collection name for cache records.
pub const DEFAULT_DB_NAME: &str = "caches";

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Backing store connection string (`memory://`, `sqlite://<path>`, `sqlite::memory:`)
    pub db_con_url: String,
    /// Collection holding the cache records
    pub db_name: String,
    /// Deadline applied to every store operation, in milliseconds
    pub store_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// If `APP_ENV` is set, `env/<APP_ENV>.env` is loaded first, otherwise a
    /// `.env` in the working directory. Variables already present in the
    /// process environment are never overridden by the file.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DB_CON_URL` - Store connection string (default: `memory://`)
    /// - `DB_NAME` - Collection name (default: `caches`)
    /// - `STORE_TIMEOUT_MS` - Store deadline in milliseconds (default: 5000)
    pub fn from_env() -> Self {
        load_env_file();
        Self::from_process_env()
    }

    fn from_process_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            db_con_url: env::var("DB_CON_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DB_CON_URL.to_string()),
            db_name: env::var("DB_NAME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            store_timeout_ms: env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(5000),
        }
    }

    /// Store deadline as a Duration.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Scheme portion of the connection string, safe to log.
    pub fn store_scheme(&self) -> &str {
        self.db_con_url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .unwrap_or("unknown")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            db_con_url: DEFAULT_DB_CON_URL.to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            store_timeout_ms: 5000,
        }
    }
}

fn load_env_file() {
    let path = match env::var("APP_ENV") {
        Ok(app_env) if !app_env.is_empty() => PathBuf::from("env").join(format!("{app_env}.env")),
        _ => PathBuf::from(".env"),
    };

    match dotenvy::from_path(&path) {
        Ok(()) => debug!("Loaded environment file {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => debug!("Ignoring environment file {}: {}", path.display(), e),
    }
}
