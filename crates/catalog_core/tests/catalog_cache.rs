use catalog_core::db::{open_db, open_db_in_memory};
use catalog_core::{
    CacheKey, CachedCatalogSource, Catalog, CatalogCache, CatalogObject, CatalogSettings,
    CatalogSource, ExecutionRequest, FixtureCatalogSource, FixtureWorkspace, LdmDataset,
    MemoryCatalogCache, ObjectKind, Selection, SourceError, SourceResult, SqliteCatalogCache,
    ValidObjects, Workspace,
};
use catalog_core::{resolve_data_source_id, Insight};
use std::cell::Cell;

fn fixture() -> FixtureCatalogSource {
    FixtureCatalogSource::new().with_workspace(
        Workspace {
            id: "sales".to_string(),
            name: "Sales".to_string(),
        },
        FixtureWorkspace {
            metrics: vec![CatalogObject::metric("m1", "Revenue")],
            attributes: vec![CatalogObject::attribute("region", "Region")],
            insights: vec![Insight {
                id: "i1".to_string(),
                title: "Revenue by region".to_string(),
            }],
            datasets: vec![LdmDataset {
                id: "orders".to_string(),
                data_source_id: Some("warehouse".to_string()),
            }],
            valid_objects: Some(ValidObjects::new().with_ids(ObjectKind::Metric, ["m1"])),
            ..FixtureWorkspace::default()
        },
    )
}

#[test]
fn repeated_calls_hit_memory_cache() {
    let source = CachedCatalogSource::new(fixture(), MemoryCatalogCache::new());

    for _ in 0..3 {
        assert_eq!(source.metrics("sales").unwrap().len(), 1);
    }
    assert_eq!(source.inner().call_count("metrics"), 1);
    assert_eq!(source.insights("sales").unwrap()[0].title, "Revenue by region");
    assert_eq!(
        resolve_data_source_id(&source.datasets("sales").unwrap()).unwrap(),
        "warehouse"
    );
    assert_eq!(source.workspaces().unwrap()[0].name, "Sales");
    assert_eq!(source.cache().len().unwrap(), 4);
}

#[test]
fn validity_results_are_keyed_by_request() {
    let source = CachedCatalogSource::new(fixture(), MemoryCatalogCache::new());
    let first = ExecutionRequest::from_selection(&Selection::new().with_metric("metric/m1", None));
    let second =
        ExecutionRequest::from_selection(&Selection::new().with_view_by("label/region"));

    source.compute_valid_objects("sales", &first).unwrap();
    source.compute_valid_objects("sales", &first).unwrap();
    source.compute_valid_objects("sales", &second).unwrap();

    assert_eq!(source.inner().call_count("compute_valid_objects"), 2);
}

#[test]
fn catalog_loads_through_cache_once_per_selection() {
    let source = CachedCatalogSource::new(fixture(), MemoryCatalogCache::new());
    let selection = Selection::new().with_metric("metric/m1", None);

    let first =
        Catalog::load(&source, "sales", selection.clone(), CatalogSettings::default()).unwrap();
    let second = Catalog::load(&source, "sales", selection, CatalogSettings::default()).unwrap();

    assert_eq!(first.filtered_objects(), second.filtered_objects());
    assert_eq!(source.inner().call_count("compute_valid_objects"), 1);
    assert_eq!(source.inner().call_count("attributes"), 1);
}

struct FlakySource {
    failures_left: Cell<u32>,
}

impl CatalogSource for FlakySource {
    fn workspaces(&self) -> SourceResult<Vec<Workspace>> {
        Ok(Vec::new())
    }

    fn facts(&self, _workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(SourceError::Transport("timeout".to_string()));
        }
        Ok(vec![CatalogObject::fact("amount", "Amount")])
    }

    fn metrics(&self, _workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        Ok(Vec::new())
    }

    fn attributes(&self, _workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        Ok(Vec::new())
    }

    fn insights(&self, _workspace_id: &str) -> SourceResult<Vec<Insight>> {
        Ok(Vec::new())
    }

    fn datasets(&self, _workspace_id: &str) -> SourceResult<Vec<LdmDataset>> {
        Ok(Vec::new())
    }

    fn compute_valid_objects(
        &self,
        _workspace_id: &str,
        _request: &ExecutionRequest,
    ) -> SourceResult<ValidObjects> {
        Ok(ValidObjects::new())
    }
}

#[test]
fn failed_calls_are_not_cached() {
    let source = CachedCatalogSource::new(
        FlakySource {
            failures_left: Cell::new(1),
        },
        MemoryCatalogCache::new(),
    );

    let err = source.facts("sales").unwrap_err();
    assert!(matches!(err, SourceError::Transport(_)));
    assert!(source.cache().is_empty().unwrap());

    assert_eq!(source.facts("sales").unwrap().len(), 1);
    assert_eq!(source.cache().len().unwrap(), 1);
}

#[test]
fn corrupt_payload_is_refetched() {
    let cache = MemoryCatalogCache::new();
    let key = CacheKey::new("metrics", &("sales",)).unwrap();
    cache.put(&key, "not json").unwrap();

    let source = CachedCatalogSource::new(fixture(), cache);
    assert_eq!(source.metrics("sales").unwrap()[0].id, "m1");
    assert_eq!(source.inner().call_count("metrics"), 1);
    assert!(source.cache().get(&key).unwrap().unwrap().starts_with('['));
}

#[test]
fn sqlite_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog_cache.db");

    {
        let conn = open_db(&path).unwrap();
        let source = CachedCatalogSource::new(fixture(), SqliteCatalogCache::new(&conn));
        source.attributes("sales").unwrap();
        assert_eq!(source.inner().call_count("attributes"), 1);
    }

    let conn = open_db(&path).unwrap();
    let source = CachedCatalogSource::new(fixture(), SqliteCatalogCache::new(&conn));
    let attributes = source.attributes("sales").unwrap();
    assert_eq!(attributes[0].obj_id_key(), "label/region");
    assert_eq!(source.inner().call_count("attributes"), 0);
}

#[test]
fn sqlite_cache_upserts_and_invalidates() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqliteCatalogCache::new(&conn);
    let facts = CacheKey::new("facts", &("sales",)).unwrap();
    let metrics = CacheKey::new("metrics", &("sales",)).unwrap();

    cache.put(&facts, "[]").unwrap();
    cache.put(&facts, "[1]").unwrap();
    cache.put(&metrics, "[]").unwrap();
    assert_eq!(cache.get(&facts).unwrap().as_deref(), Some("[1]"));
    assert_eq!(cache.len().unwrap(), 2);

    assert_eq!(cache.invalidate_function("facts").unwrap(), 1);
    assert_eq!(cache.get(&facts).unwrap(), None);

    cache.clear().unwrap();
    assert!(cache.is_empty().unwrap());
}
