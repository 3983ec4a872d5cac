//! SQLite-backed cache that survives process restarts.
//!
//! # Invariants
//! - Expects a connection opened through `db::open_db*` (migrated schema).
//! - `put` replaces an existing payload for the same key.

use crate::cache::{CacheKey, CacheResult, CatalogCache};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqliteCatalogCache<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogCache<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Drops cached entries of one function, e.g. after a model publish.
    pub fn invalidate_function(&self, function: &str) -> CacheResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM catalog_cache WHERE function = ?1;", [function])?;
        Ok(removed)
    }
}

impl CatalogCache for SqliteCatalogCache<'_> {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM catalog_cache WHERE function = ?1 AND args = ?2;",
                params![key.function, key.args],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn put(&self, key: &CacheKey, payload: &str) -> CacheResult<()> {
        self.conn.execute(
            "INSERT INTO catalog_cache (function, args, payload) VALUES (?1, ?2, ?3)
             ON CONFLICT(function, args) DO UPDATE SET
                payload = excluded.payload,
                created_at = (strftime('%s', 'now') * 1000);",
            params![key.function, key.args, payload],
        )?;
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        self.conn.execute("DELETE FROM catalog_cache;", [])?;
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM catalog_cache;", [], |row| {
                row.get::<_, i64>(0)
            })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
