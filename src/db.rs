use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::StoreError;

/// One cached scrape, keyed by canonical URL.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRecord {
    pub url: String,
    pub payload: serde_json::Value,
    pub scraped_at: DateTime<Utc>,
}

/// Keyed record storage the cache adapter reads and writes through.
pub trait RecordStore: Send + Sync {
    fn get(&self, url: &str) -> Result<Option<CachedRecord>, StoreError>;

    /// Insert or overwrite the record for `url`. `scraped_at` never moves backwards.
    fn upsert(
        &self,
        url: &str,
        payload: &serde_json::Value,
        scraped_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Flush anything buffered before the process exits.
    fn checkpoint(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS scraped_data_cache (
            id         INTEGER PRIMARY KEY,
            url        TEXT UNIQUE NOT NULL,
            payload    TEXT NOT NULL,
            scraped_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cache_scraped_at ON scraped_data_cache(scraped_at);
        ",
    )?;
    Ok(())
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = connect(path)?;
        init_schema(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for SqliteStore {
    fn get(&self, url: &str) -> Result<Option<CachedRecord>, StoreError> {
        let conn = self.lock()?;
        let row: Option<(String, String, i64)> = conn
            .query_row(
                "SELECT url, payload, scraped_at FROM scraped_data_cache WHERE url = ?1",
                [url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(url, payload, millis)| -> Result<CachedRecord, StoreError> {
            Ok(CachedRecord {
                url,
                payload: serde_json::from_str(&payload)?,
                scraped_at: from_millis(millis)?,
            })
        })
        .transpose()
    }

    fn upsert(
        &self,
        url: &str,
        payload: &serde_json::Value,
        scraped_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_string(payload)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scraped_data_cache (url, payload, scraped_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET
                 payload = excluded.payload,
                 scraped_at = MAX(scraped_data_cache.scraped_at, excluded.scraped_at)",
            rusqlite::params![url, body, scraped_at.timestamp_millis()],
        )?;
        Ok(())
    }

    fn checkpoint(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis).ok_or(StoreError::Timestamp(millis))
}

// ── Admin ──

pub struct RecordSummary {
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

pub struct Stats {
    pub total: usize,
    pub fresh: usize,
    pub stale: usize,
}

impl SqliteStore {
    /// Most recently scraped first.
    pub fn list(&self, limit: usize) -> Result<Vec<RecordSummary>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT url, scraped_at FROM scraped_data_cache ORDER BY scraped_at DESC, url LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(url, millis)| -> Result<RecordSummary, StoreError> {
                Ok(RecordSummary {
                    url,
                    scraped_at: from_millis(millis)?,
                })
            })
            .collect()
    }

    pub fn stats(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> Result<Stats, StoreError> {
        let cutoff = (now - ttl).timestamp_millis();
        let conn = self.lock()?;
        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM scraped_data_cache", [], |r| r.get(0))?;
        let fresh: i64 = conn.query_row(
            "SELECT COUNT(*) FROM scraped_data_cache WHERE scraped_at > ?1",
            [cutoff],
            |r| r.get(0),
        )?;
        Ok(Stats {
            total: total as usize,
            fresh: fresh as usize,
            stale: (total - fresh) as usize,
        })
    }

    /// Delete every cached record, forcing fresh scrapes. Returns the count removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM scraped_data_cache", [])?)
    }
}

// ── Tests ──
