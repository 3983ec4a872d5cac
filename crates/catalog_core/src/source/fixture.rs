//! In-memory catalog source backed by a JSON document.
//!
//! Used by the CLI for offline runs and by tests as a substitute backend.
//! The validity computation returns a fixed per-workspace answer; when a
//! workspace does not declare one, every catalog object is reported valid.

use crate::model::catalog::{CatalogObject, Insight, LdmDataset, ObjectKind, Workspace};
use crate::model::execution::{ExecutionRequest, ValidObjects};
use crate::source::{CatalogSource, SourceError, SourceResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureWorkspace {
    pub facts: Vec<CatalogObject>,
    pub metrics: Vec<CatalogObject>,
    pub attributes: Vec<CatalogObject>,
    pub insights: Vec<Insight>,
    pub datasets: Vec<LdmDataset>,
    pub valid_objects: Option<ValidObjects>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FixtureDocument {
    workspaces: Vec<Workspace>,
    catalogs: BTreeMap<String, FixtureWorkspace>,
}

#[derive(Debug, Default)]
pub struct FixtureCatalogSource {
    document: FixtureDocument,
    calls: Mutex<BTreeMap<&'static str, usize>>,
}

impl FixtureCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> SourceResult<Self> {
        let document = serde_json::from_str(json).map_err(|err| {
            SourceError::InvalidResponse(format!("fixture is not valid catalog JSON: {err}"))
        })?;
        Ok(Self {
            document,
            calls: Mutex::default(),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            SourceError::Transport(format!("cannot read fixture `{}`: {err}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Adds (or replaces) a workspace and its catalog.
    pub fn with_workspace(
        mut self,
        workspace: Workspace,
        catalog: FixtureWorkspace,
    ) -> Self {
        self.document.workspaces.retain(|w| w.id != workspace.id);
        self.document.catalogs.insert(workspace.id.clone(), catalog);
        self.document.workspaces.push(workspace);
        self
    }

    /// Number of calls made to `function` (e.g. `"compute_valid_objects"`).
    pub fn call_count(&self, function: &str) -> usize {
        let calls = self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        calls.get(function).copied().unwrap_or(0)
    }

    fn record(&self, function: &'static str) {
        let mut calls = self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *calls.entry(function).or_insert(0) += 1;
    }

    fn workspace(&self, workspace_id: &str) -> SourceResult<&FixtureWorkspace> {
        self.document
            .catalogs
            .get(workspace_id)
            .ok_or_else(|| SourceError::WorkspaceNotFound(workspace_id.to_string()))
    }
}

impl CatalogSource for FixtureCatalogSource {
    fn workspaces(&self) -> SourceResult<Vec<Workspace>> {
        self.record("workspaces");
        Ok(self.document.workspaces.clone())
    }

    fn facts(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        self.record("facts");
        Ok(self.workspace(workspace_id)?.facts.clone())
    }

    fn metrics(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        self.record("metrics");
        Ok(self.workspace(workspace_id)?.metrics.clone())
    }

    fn attributes(&self, workspace_id: &str) -> SourceResult<Vec<CatalogObject>> {
        self.record("attributes");
        Ok(self.workspace(workspace_id)?.attributes.clone())
    }

    fn insights(&self, workspace_id: &str) -> SourceResult<Vec<Insight>> {
        self.record("insights");
        Ok(self.workspace(workspace_id)?.insights.clone())
    }

    fn datasets(&self, workspace_id: &str) -> SourceResult<Vec<LdmDataset>> {
        self.record("datasets");
        Ok(self.workspace(workspace_id)?.datasets.clone())
    }

    fn compute_valid_objects(
        &self,
        workspace_id: &str,
        _request: &ExecutionRequest,
    ) -> SourceResult<ValidObjects> {
        self.record("compute_valid_objects");
        let catalog = self.workspace(workspace_id)?;
        if let Some(valid) = &catalog.valid_objects {
            return Ok(valid.clone());
        }
        Ok(ValidObjects::new()
            .with_ids(ObjectKind::Fact, catalog.facts.iter().map(|o| o.id.clone()))
            .with_ids(ObjectKind::Metric, catalog.metrics.iter().map(|o| o.id.clone()))
            .with_ids(
                ObjectKind::Attribute,
                catalog.attributes.iter().map(|o| o.id.clone()),
            ))
    }
}
