use crate::error::{ContribError, Result};
use crate::model::SCHEMA_VERSION;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// An entry is fresh while `now - written_at <= ttl`.
pub fn is_fresh(written_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    match (now - written_at).to_std() {
        Ok(age) => age <= ttl,
        // written in the future: clock skew, treat as fresh
        Err(_) => true,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub blob: String,
    pub written_at: DateTime<Utc>,
}

/// Persisted query results keyed by entity identity.
pub struct Cache {
    conn: Connection,
    ttl: Duration,
}

impl Cache {
    pub fn new<P: AsRef<Path>>(cache_dir: P, ttl: Duration) -> Result<Self> {
        std::fs::create_dir_all(cache_dir.as_ref())?;
        let db_path = cache_dir.as_ref().join("cache.db");
        let conn = Connection::open(&db_path)?;
        let mut cache = Self { conn, ttl };
        cache.initialize()?;
        Ok(cache)
    }

    pub fn in_memory(ttl: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut cache = Self { conn, ttl };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY,
                blob TEXT NOT NULL,
                written_at INTEGER NOT NULL
            );
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(ContribError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    pub fn entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = self
            .conn
            .query_row(
                "SELECT blob, written_at FROM entries WHERE key = ?",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((blob, millis)) = row else {
            return Ok(None);
        };
        let written_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| ContribError::InvalidDate(format!("Invalid cache timestamp: {millis}")))?;
        Ok(Some(CacheEntry { blob, written_at }))
    }

    /// Returns the stored value for `key` unless it is missing or stale at `now`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Result<Option<T>> {
        match self.entry(key)? {
            Some(entry) if is_fresh(entry.written_at, now, self.ttl) => {
                Ok(Some(serde_json::from_str(&entry.blob)?))
            }
            Some(entry) => {
                tracing::debug!(key, written_at = %entry.written_at, "cache entry is stale");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&mut self, key: &str, value: &T, now: DateTime<Utc>) -> Result<()> {
        let blob = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO entries (key, blob, written_at) VALUES (?, ?, ?)",
            params![key, blob, now.timestamp_millis()],
        )?;
        Ok(())
    }

    pub fn invalidate(&mut self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM entries WHERE key = ?", params![key])?;
        Ok(removed > 0)
    }
}
