//! `CatalogSource` decorator memoizing every call through a `CatalogCache`.

use crate::cache::{CacheKey, CatalogCache};
use crate::logging::log_duration;
use crate::model::catalog::{CatalogObject, Insight, LdmDataset, Workspace};
use crate::model::execution::{ExecutionRequest, ValidObjects};
use crate::source::{CatalogSource, SourceResult};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;

pub struct CachedCatalogSource<S, C> {
    inner: S,
    cache: C,
}

impl<S: CatalogSource, C: CatalogCache> CachedCatalogSource<S, C> {
    pub fn new(inner: S, cache: C) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn memoize<T, A>(
        &self,
        function: &'static str,
        args: &A,
        call: impl FnOnce(&S) -> SourceResult<T>,
    ) -> SourceResult<T>
    where
        T: Serialize + DeserializeOwned,
        A: Serialize + ?Sized,
    {
        let key = CacheKey::new(function, &args)?;
        if let Some(payload) = self.cache.get(&key)? {
            match serde_json::from_str(&payload) {
                Ok(value) => {
                    debug!("event=cache_hit module=cache op={function}");
                    return Ok(value);
                }
                Err(err) => warn!(
                    "event=cache_corrupt module=cache op={} status=refetch error={}",
                    function, err
                ),
            }
        }

        let started_at = Instant::now();
        let value = call(&self.inner)?;
        log_duration(function, started_at);

        let payload = serde_json::to_string(&value).map_err(crate::cache::CacheError::from)?;
        self.cache.put(&key, &payload)?;
        Ok(value)
    }
}

impl<S: CatalogSource, C: CatalogCache> CatalogSource for CachedCatalogSource<S, C> {
    fn workspaces(&self) -> SourceResult<Vec<Workspace>> {
        self.memoize("workspaces", &(), |inner| inner.workspaces())
    }

    fn facts(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        self.memoize("facts", &(workspace_id,), |inner| inner.facts(workspace_id))
    }

    fn metrics(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        self.memoize("metrics", &(workspace_id,), |inner| {
            inner.metrics(workspace_id)
        })
    }

    fn attributes(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        self.memoize("attributes", &(workspace_id,), |inner| {
            inner.attributes(workspace_id)
        })
    }

    fn insights(&self, workspace_id: &str) -> SourceResult<Vec<Insight>> {
        self.memoize("insights", &(workspace_id,), |inner| {
            inner.insights(workspace_id)
        })
    }

    fn datasets(&self, workspace_id: &str) -> SourceResult<Vec<LdmDataset>> {
        self.memoize("datasets", &(workspace_id,), |inner| {
            inner.datasets(workspace_id)
        })
    }

    fn compute_valid_objects(
        &self,
        workspace_id: &str,
        request: &ExecutionRequest,
    ) -> SourceResult<ValidObjects> {
        self.memoize("compute_valid_objects", &(workspace_id, request), |inner| {
            inner.compute_valid_objects(workspace_id, request)
        })
    }
}
