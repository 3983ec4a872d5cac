//! Catalog filtering core.
//!
//! Given a user's selected metrics, attributes and filters, decides which
//! catalog objects of an analytics workspace can still be combined with them,
//! and serves ordered selection views for execution and rendering.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod service;
pub mod source;

pub use cache::{
    CacheError, CacheKey, CacheResult, CachedCatalogSource, CatalogCache, MemoryCatalogCache,
    SqliteCatalogCache,
};
pub use config::{CatalogSettings, SettingsError};
pub use logging::{default_log_level, init_logging, init_stderr_logging, log_duration};
pub use lookup::SelectOption;
pub use model::catalog::{CatalogObject, Insight, LdmDataset, ObjId, ObjectKind, Workspace};
pub use model::execution::{build_execution_request, ExecutionRequest, ValidObjects};
pub use model::selection::{AggregationFunction, SelectedMetric, Selection};
pub use service::catalog_service::{Catalog, CatalogError, CatalogResult};
pub use service::projector::{ProjectionError, SelectionProjector, SortColumns, StaleSortPolicy};
pub use service::reconciler::{
    reconcile, reconcile_selection, FilteredObjects, RemovalReportMode,
    INTERNAL_TIMESTAMP_SUFFIX,
};
pub use source::fixture::{FixtureCatalogSource, FixtureWorkspace};
pub use source::{resolve_data_source_id, CatalogSource, SourceError, SourceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
