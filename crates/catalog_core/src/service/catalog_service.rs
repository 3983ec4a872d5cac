//! Catalog snapshot for one workspace and one selection.
//!
//! # Responsibility
//! - Fetch the full catalog, reconcile it once, and serve selection views.
//!
//! # Invariants
//! - The snapshot never changes after `Catalog::load`; a new selection needs a
//!   new `Catalog`.
//! - Backend failures abort loading; nothing partial is returned.

use crate::config::CatalogSettings;
use crate::lookup::local_id;
use crate::model::catalog::{is_valid_workspace_id, CatalogObject};
use crate::model::selection::Selection;
use crate::service::projector::{LocalIdFn, ProjectionError, SelectionProjector, SortColumns};
use crate::service::reconciler::{reconcile_selection, FilteredObjects};
use crate::source::{CatalogSource, SourceError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

#[derive(Debug)]
pub enum CatalogError {
    InvalidWorkspaceId(String),
    Source(SourceError),
    Projection(ProjectionError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWorkspaceId(id) => write!(f, "invalid workspace id: `{id}`"),
            Self::Source(err) => write!(f, "{err}"),
            Self::Projection(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidWorkspaceId(_) => None,
            Self::Source(err) => Some(err),
            Self::Projection(err) => Some(err),
        }
    }
}

impl From<SourceError> for CatalogError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<ProjectionError> for CatalogError {
    fn from(value: ProjectionError) -> Self {
        Self::Projection(value)
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Raw catalog lists plus their reconciliation, before a snapshot is built.
struct Loaded {
    facts: Vec<CatalogObject>,
    metrics: Vec<CatalogObject>,
    attributes: Vec<CatalogObject>,
    filtered: FilteredObjects,
}

/// Reconciled catalog of one workspace.
#[derive(Debug, Clone)]
pub struct Catalog {
    workspace_id: String,
    selection: Selection,
    settings: CatalogSettings,
    all_facts: Vec<CatalogObject>,
    all_metrics: Vec<CatalogObject>,
    all_attributes: Vec<CatalogObject>,
    filtered: FilteredObjects,
    local_id: LocalIdFn,
}

impl Catalog {
    /// Loads the workspace catalog and reconciles it against `selection`.
    pub fn load<S: CatalogSource>(
        source: &S,
        workspace_id: &str,
        selection: Selection,
        settings: CatalogSettings,
    ) -> CatalogResult<Self> {
        if !is_valid_workspace_id(workspace_id) {
            return Err(CatalogError::InvalidWorkspaceId(workspace_id.to_string()));
        }

        let started_at = Instant::now();
        let result = Self::fetch_and_reconcile(source, workspace_id, &selection);
        let loaded = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                error!(
                    "event=catalog_load module=service status=error workspace={} duration_ms={} error={}",
                    workspace_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        info!(
            "event=catalog_load module=service status=ok workspace={} filtered={} total={} duration_ms={}",
            workspace_id,
            loaded.filtered.count_filtered(),
            loaded.filtered.count_all(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            workspace_id: workspace_id.to_string(),
            selection,
            settings,
            all_facts: loaded.facts,
            all_metrics: loaded.metrics,
            all_attributes: loaded.attributes,
            filtered: loaded.filtered,
            local_id,
        })
    }

    fn fetch_and_reconcile<S: CatalogSource>(
        source: &S,
        workspace_id: &str,
        selection: &Selection,
    ) -> Result<Loaded, SourceError> {
        let facts = source.facts(workspace_id)?;
        let metrics = source.metrics(workspace_id)?;
        let attributes = source.attributes(workspace_id)?;
        let filtered = reconcile_selection(&facts, &metrics, &attributes, selection, |request| {
            source.compute_valid_objects(workspace_id, request)
        })?;
        Ok(Loaded {
            facts,
            metrics,
            attributes,
            filtered,
        })
    }

    /// Replaces the column-name encoder used for sort columns.
    pub fn with_local_id(mut self, local_id: LocalIdFn) -> Self {
        self.local_id = local_id;
        self
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    pub fn all_facts(&self) -> &[CatalogObject] {
        &self.all_facts
    }

    pub fn all_metrics(&self) -> &[CatalogObject] {
        &self.all_metrics
    }

    pub fn all_attributes(&self) -> &[CatalogObject] {
        &self.all_attributes
    }

    pub fn filtered_objects(&self) -> &FilteredObjects {
        &self.filtered
    }

    pub fn filtered_facts(&self) -> &[CatalogObject] {
        &self.filtered.filtered_facts
    }

    pub fn filtered_metrics(&self) -> &[CatalogObject] {
        &self.filtered.filtered_metrics
    }

    pub fn filtered_attributes(&self) -> &[CatalogObject] {
        &self.filtered.filtered_attributes
    }

    pub fn filtered_all(&self) -> Vec<&CatalogObject> {
        self.filtered.filtered_all().collect()
    }

    /// Removal report in the configured format.
    pub fn report_removed(&self) -> Option<String> {
        self.filtered.report_removed(self.settings.report_mode)
    }

    pub fn projector(&self) -> SelectionProjector<'_> {
        SelectionProjector::new(&self.filtered, &self.selection)
            .with_local_id(self.local_id)
            .with_stale_sort_policy(self.settings.stale_sort_policy)
    }

    pub fn selected_metrics(&self) -> Vec<&CatalogObject> {
        self.projector().selected_metrics()
    }

    pub fn selected_view_by(&self) -> Vec<&CatalogObject> {
        self.projector().selected_view_by()
    }

    pub fn selected_segmented_by(&self) -> Option<&CatalogObject> {
        self.projector().selected_segmented_by()
    }

    pub fn selected_filter_attributes(&self) -> Vec<&CatalogObject> {
        self.projector().selected_filter_attributes()
    }

    pub fn selected_sort_by(&self) -> CatalogResult<Vec<&CatalogObject>> {
        Ok(self.projector().selected_sort_by()?)
    }

    pub fn selected_sort_columns(&self) -> CatalogResult<SortColumns> {
        Ok(self.projector().selected_sort_columns()?)
    }

    pub fn selected_all(&self) -> Vec<&CatalogObject> {
        self.projector().selected_all()
    }
}
