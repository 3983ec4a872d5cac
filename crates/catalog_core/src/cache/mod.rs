//! Memoization of remote catalog calls.
//!
//! # Responsibility
//! - Define the cache contract keyed by function name and call arguments.
//! - Provide in-memory and SQLite-backed cache implementations.
//! - Wrap any `CatalogSource` with transparent memoization.
//!
//! # Invariants
//! - Keys are the function name plus the canonical JSON of its arguments.
//! - Only successful call results are stored.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod cached_source;
pub mod memory;
pub mod sqlite;

pub use cached_source::CachedCatalogSource;
pub use memory::MemoryCatalogCache;
pub use sqlite::SqliteCatalogCache;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    Serialization(serde_json::Error),
    /// A previous holder of the cache lock panicked.
    Poisoned,
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "catalog cache storage failed: {err}"),
            Self::Serialization(err) => write!(f, "catalog cache payload is invalid: {err}"),
            Self::Poisoned => write!(f, "catalog cache lock is poisoned"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Identity of one memoized call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub function: String,
    /// Canonical JSON of the call arguments.
    pub args: String,
}

impl CacheKey {
    pub fn new(function: impl Into<String>, args: &impl serde::Serialize) -> CacheResult<Self> {
        Ok(Self {
            function: function.into(),
            args: serde_json::to_string(args)?,
        })
    }
}

/// Storage for memoized call results (JSON payloads).
pub trait CatalogCache {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<String>>;
    fn put(&self, key: &CacheKey, payload: &str) -> CacheResult<()>;
    fn clear(&self) -> CacheResult<()>;
    fn len(&self) -> CacheResult<usize>;

    fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}
