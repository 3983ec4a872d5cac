//! Remote catalog access contracts.
//!
//! # Responsibility
//! - Define the boundary to the analytics backend (catalog listing and the
//!   valid-objects computation).
//! - Keep transport details out of reconciliation and projection code.
//!
//! # Invariants
//! - Calls are idempotent for identical arguments and may be memoized.
//! - Errors propagate to callers unchanged; there is no retry policy.

use crate::cache::CacheError;
use crate::model::catalog::{CatalogObject, Insight, LdmDataset, Workspace};
use crate::model::execution::{ExecutionRequest, ValidObjects};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod fixture;

pub type SourceResult<T> = Result<T, SourceError>;

/// Failure of a remote catalog call.
#[derive(Debug)]
pub enum SourceError {
    /// Network or backend service failure.
    Transport(String),
    WorkspaceNotFound(String),
    /// Backend answered with data the core cannot use.
    InvalidResponse(String),
    Cache(CacheError),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "catalog backend call failed: {message}"),
            Self::WorkspaceNotFound(id) => write!(f, "workspace not found: {id}"),
            Self::InvalidResponse(message) => write!(f, "invalid catalog response: {message}"),
            Self::Cache(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CacheError> for SourceError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

/// Backend interface for one analytics organization.
pub trait CatalogSource {
    fn workspaces(&self) -> SourceResult<Vec<Workspace>>;
    fn facts(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>>;
    fn metrics(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>>;
    fn attributes(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>>;
    fn insights(&self, workspace_id: &str) -> SourceResult<Vec<Insight>>;
    fn datasets(&self, workspace_id: &str) -> SourceResult<Vec<LdmDataset>>;
    /// Computes which catalog ids stay valid when combined with `request`.
    fn compute_valid_objects(
        &self,
        workspace_id: &str,
        request: &ExecutionRequest,
    ) -> SourceResult<ValidObjects>;
}

impl<T: CatalogSource + ?Sized> CatalogSource for &T {
    fn workspaces(&self) -> SourceResult<Vec<Workspace>> {
        (**self).workspaces()
    }

    fn facts(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        (**self).facts(workspace_id)
    }

    fn metrics(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        (**self).metrics(workspace_id)
    }

    fn attributes(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        (**self).attributes(workspace_id)
    }

    fn insights(&self, workspace_id: &str) -> SourceResult<Vec<Insight>> {
        (**self).insights(workspace_id)
    }

    fn datasets(&self, workspace_id: &str) -> SourceResult<Vec<LdmDataset>> {
        (**self).datasets(workspace_id)
    }

    fn compute_valid_objects(
        &self,
        workspace_id: &str,
        request: &ExecutionRequest,
    ) -> SourceResult<ValidObjects> {
        (**self).compute_valid_objects(workspace_id, request)
    }
}

/// Returns the data source backing the workspace model.
///
/// A workspace is bound to a single data source, so the first dataset that
/// declares one wins.
pub fn resolve_data_source_id(datasets: &[LdmDataset]) -> SourceResult<String> {
    datasets
        .iter()
        .filter_map(|dataset| dataset.data_source_id.as_deref())
        .find(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            SourceError::InvalidResponse("no dataset declares a data source".to_string())
        })
}
