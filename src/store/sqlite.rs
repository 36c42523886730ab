//! SQLite Document Store
//!
//! Persists cache records in a single SQLite table per collection. All access
//! goes through one `tokio_rusqlite` connection, so statements are serialized
//! on its background thread and each upsert is a single atomic statement.

use anyhow::bail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, OptionalExtension, Row};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::{CacheRecord, NewRecord, RecordStore};

const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;
"#;

const COLUMNS: &str = "id, cache_key, cache_value, updated_at";

// == SQLite Store ==
pub struct SqliteStore {
    conn: Connection,
    table: String,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path`.
    pub async fn open(path: &str, collection: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path).await?;
        Self::init(conn, collection).await
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory(collection: &str) -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn, collection).await
    }

    async fn init(conn: Connection, collection: &str) -> anyhow::Result<Self> {
        validate_collection_name(collection)?;
        let table = format!("\"{collection}\"");

        let schema = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT NOT NULL,
                cache_key TEXT NOT NULL UNIQUE,
                cache_value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );"
        );

        conn.call(move |conn| {
            conn.execute_batch(PRAGMAS)?;
            conn.execute_batch(&schema)?;
            Ok(())
        })
        .await?;

        tracing::info!("SQLite collection {} initialized", collection);
        Ok(Self { conn, table })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn upsert(&self, draft: NewRecord) -> anyhow::Result<CacheRecord> {
        let sql = format!(
            "INSERT INTO {} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(cache_key) DO UPDATE SET
                cache_value = excluded.cache_value,
                updated_at = excluded.updated_at
             RETURNING {COLUMNS}",
            self.table
        );
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let record = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                let record = stmt.query_row(
                    params![id, draft.key, draft.value, now],
                    row_to_record,
                )?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    async fn find(&self, key: &str) -> anyhow::Result<Option<CacheRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM {} WHERE cache_key = ?1", self.table);
        let key = key.to_string();

        let record = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                let record = stmt.query_row(params![key], row_to_record).optional()?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    async fn scan_all(&self) -> anyhow::Result<Vec<CacheRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM {} ORDER BY rowid", self.table);

        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                let records = stmt
                    .query_map([], row_to_record)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    async fn scan_page(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<CacheRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} ORDER BY cache_key DESC LIMIT ?1 OFFSET ?2",
            self.table
        );
        let limit = i64::try_from(limit)?;
        let offset = i64::try_from(offset)?;

        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                let records = stmt
                    .query_map(params![limit, offset], row_to_record)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    async fn delete(&self, key: &str) -> anyhow::Result<u64> {
        let sql = format!("DELETE FROM {} WHERE cache_key = ?1", self.table);
        let key = key.to_string();

        let changed = self
            .conn
            .call(move |conn| Ok(conn.execute(&sql, params![key])?))
            .await?;
        Ok(changed as u64)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);

        let count: i64 = self
            .conn
            .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
            .await?;
        Ok(count as u64)
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let sql = format!("DELETE FROM {}", self.table);

        let changed = self
            .conn
            .call(move |conn| Ok(conn.execute(&sql, [])?))
            .await?;
        Ok(changed as u64)
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.conn.clone().close().await?;
        tracing::info!("SQLite connection closed");
        Ok(())
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CacheRecord> {
    let id: String = row.get(0)?;
    let updated_at: String = row.get(3)?;

    Ok(CacheRecord {
        id: Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        key: row.get(1)?,
        value: row.get(2)?,
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?
            .with_timezone(&Utc),
    })
}

/// Collection names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_collection_name(name: &str) -> anyhow::Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || name.len() > 64 || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("invalid collection name '{}'", name);
    }
    if name.to_ascii_lowercase().starts_with("sqlite_") {
        bail!("collection name '{}' uses a reserved prefix", name);
    }
    Ok(())
}
