//! Process-local cache.

use crate::cache::{CacheError, CacheKey, CacheResult, CatalogCache};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryCatalogCache {
    entries: Mutex<HashMap<CacheKey, String>>,
}

impl MemoryCatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> CacheResult<std::sync::MutexGuard<'_, HashMap<CacheKey, String>>> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl CatalogCache for MemoryCatalogCache {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn put(&self, key: &CacheKey, payload: &str) -> CacheResult<()> {
        self.entries()?.insert(key.clone(), payload.to_string());
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        self.entries()?.clear();
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        Ok(self.entries()?.len())
    }
}
