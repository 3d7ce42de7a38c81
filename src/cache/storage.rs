//! SQLite-based response cache storage
//!
//! Entries record their creation time; the TTL is applied when reading, so an
//! entry older than the TTL reads as absent even before it is purged.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 2;

type Result<T> = std::result::Result<T, CacheError>;

/// SQLite-backed response cache
pub struct CacheStorage {
    conn: Connection,
    ttl: Duration,
}

impl CacheStorage {
    /// Open or create cache storage at the default XDG cache location
    pub fn open(ttl: Duration) -> Result<Self> {
        let cache_dir = Self::cache_dir()?;
        Self::open_at(&cache_dir, ttl)
    }

    /// Get the cache directory path (~/.cache/solvecam on Linux)
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("solvecam"))
    }

    /// Open cache storage at a specific directory
    pub fn open_at(cache_dir: &Path, ttl: Duration) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(&db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
            return Self::open_at(cache_dir, ttl);
        }

        Self::init(conn, ttl)
    }

    /// Open a private in-memory cache (nothing survives the process)
    pub fn open_in_memory(ttl: Duration) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, ttl)
    }

    fn init(conn: Connection, ttl: Duration) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key TEXT PRIMARY KEY NOT NULL,
                endpoint TEXT NOT NULL,
                data BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_created_at ON cache_entries(created_at);
            CREATE INDEX IF NOT EXISTS idx_endpoint ON cache_entries(endpoint);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self { conn, ttl })
    }

    /// TTL applied to every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get cached data if it is younger than the TTL
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get_at(key, Utc::now().timestamp_millis())
    }

    fn get_at(&self, key: &str, now_ms: i64) -> Result<Option<Vec<u8>>> {
        let oldest_valid = now_ms - self.ttl_millis();

        let data = self
            .conn
            .query_row(
                "SELECT data FROM cache_entries
                 WHERE cache_key = ?1 AND created_at > ?2",
                params![key, oldest_valid],
                |row| row.get(0),
            )
            .optional()?;

        Ok(data)
    }

    /// Store data, replacing any entry under the same key
    pub fn put(&self, key: &str, data: &[u8], endpoint: &str) -> Result<()> {
        self.put_at(key, data, endpoint, Utc::now().timestamp_millis())
    }

    fn put_at(&self, key: &str, data: &[u8], endpoint: &str, created_ms: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cache_entries
             (cache_key, endpoint, data, created_at, size_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![key, endpoint, data, created_ms, data.len() as i64],
        )?;
        Ok(())
    }

    /// Delete a specific cache entry by key
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM cache_entries WHERE cache_key = ?1", [key])?;
        Ok(deleted > 0)
    }

    /// Clear all cache entries
    pub fn clear(&self) -> Result<ClearStats> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        self.conn.execute("DELETE FROM cache_entries", [])?;

        Ok(ClearStats {
            entries_removed: count as usize,
        })
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let oldest_valid = Utc::now().timestamp_millis() - self.ttl_millis();

        let total_entries: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        let valid_entries: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE created_at > ?1",
            [oldest_valid],
            |r| r.get(0),
        )?;

        let total_size: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM cache_entries",
            [],
            |r| r.get(0),
        )?;

        let (oldest, newest): (Option<i64>, Option<i64>) = self.conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM cache_entries WHERE created_at > ?1",
            [oldest_valid],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        Ok(CacheStats {
            total_entries: total_entries as usize,
            valid_entries: valid_entries as usize,
            expired_entries: (total_entries - valid_entries) as usize,
            total_size_bytes: total_size as usize,
            oldest_entry: oldest,
            newest_entry: newest,
        })
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about cache state (timestamps in Unix milliseconds)
#[derive(Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_entry: Option<i64>,
    pub newest_entry: Option<i64>,
}
