//! Selection views over a reconciled catalog.
//!
//! # Responsibility
//! - Resolve selected object ids to kept catalog objects for execution and
//!   rendering.
//!
//! # Invariants
//! - All views follow catalog order (facts, metrics, attributes) except the
//!   sort views, which follow the user's sort order.
//! - Removed objects never appear in any view.

use crate::lookup::local_id;
use crate::model::catalog::CatalogObject;
use crate::model::selection::Selection;
use crate::service::reconciler::FilteredObjects;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Formats a column name from an object id string.
pub type LocalIdFn = fn(&str) -> String;

/// Handling of sort ids that no longer resolve to a kept object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleSortPolicy {
    #[default]
    Fail,
    /// Drop the id and log a warning.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// Sort id refers to an object that was removed or never existed.
    SortObjectNotFound(String),
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SortObjectNotFound(obj_id) => {
                write!(f, "sort object is not available in the filtered catalog: {obj_id}")
            }
        }
    }
}

impl Error for ProjectionError {}

/// Column names and ascending flags, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortColumns {
    pub columns: Vec<String>,
    pub ascending: Vec<bool>,
}

pub struct SelectionProjector<'a> {
    filtered: &'a FilteredObjects,
    selection: &'a Selection,
    local_id: LocalIdFn,
    stale_sort_policy: StaleSortPolicy,
}

impl<'a> SelectionProjector<'a> {
    pub fn new(filtered: &'a FilteredObjects, selection: &'a Selection) -> Self {
        Self {
            filtered,
            selection,
            local_id,
            stale_sort_policy: StaleSortPolicy::default(),
        }
    }

    pub fn with_local_id(mut self, local_id: LocalIdFn) -> Self {
        self.local_id = local_id;
        self
    }

    pub fn with_stale_sort_policy(mut self, policy: StaleSortPolicy) -> Self {
        self.stale_sort_policy = policy;
        self
    }

    /// Kept objects of any kind selected as metrics.
    ///
    /// Facts and attributes qualify too, since they become metrics through an
    /// aggregation function.
    pub fn selected_metrics(&self) -> Vec<&'a CatalogObject> {
        self.filtered
            .filtered_all()
            .filter(|object| self.selection.has_metric(&object.obj_id_key()))
            .collect()
    }

    pub fn selected_view_by(&self) -> Vec<&'a CatalogObject> {
        self.attributes_in(&self.selection.view_by)
    }

    /// First kept attribute matching the segment-by selection.
    pub fn selected_segmented_by(&self) -> Option<&'a CatalogObject> {
        let wanted = self.selection.segmented_by.as_deref()?;
        self.filtered
            .filtered_attributes
            .iter()
            .find(|object| object.obj_id_key() == wanted)
    }

    pub fn selected_filter_attributes(&self) -> Vec<&'a CatalogObject> {
        self.attributes_in(&self.selection.filter_attributes)
    }

    /// Sort objects in the user's sort order.
    ///
    /// # Errors
    /// - `ProjectionError::SortObjectNotFound` for a stale id under
    ///   `StaleSortPolicy::Fail`.
    pub fn selected_sort_by(&self) -> Result<Vec<&'a CatalogObject>, ProjectionError> {
        let mut result = Vec::with_capacity(self.selection.sort_by.len());
        for obj_id in &self.selection.sort_by {
            let found = self
                .filtered
                .filtered_all()
                .find(|object| object.obj_id_key() == *obj_id);
            match (found, self.stale_sort_policy) {
                (Some(object), _) => result.push(object),
                (None, StaleSortPolicy::Skip) => warn!(
                    "event=sort_object_missing module=service status=skipped obj_id={}",
                    obj_id
                ),
                (None, StaleSortPolicy::Fail) => {
                    return Err(ProjectionError::SortObjectNotFound(obj_id.clone()));
                }
            }
        }
        Ok(result)
    }

    /// Column name and ascending flag per sort object.
    ///
    /// Objects also selected as metrics are addressed by their local id,
    /// others by their title.
    pub fn selected_sort_columns(&self) -> Result<SortColumns, ProjectionError> {
        let metric_keys: Vec<String> = self
            .selected_metrics()
            .into_iter()
            .map(CatalogObject::obj_id_key)
            .collect();

        let mut sort_columns = SortColumns::default();
        for object in self.selected_sort_by()? {
            let key = object.obj_id_key();
            let column = if metric_keys.contains(&key) {
                (self.local_id)(&key)
            } else {
                object.title.clone()
            };
            sort_columns.columns.push(column);
            sort_columns
                .ascending
                .push(!self.selection.sort_desc_for(&key));
        }
        Ok(sort_columns)
    }

    /// Metrics, then view-by attributes, then the segment-by attribute.
    pub fn selected_all(&self) -> Vec<&'a CatalogObject> {
        let mut result = self.selected_metrics();
        result.extend(self.selected_view_by());
        result.extend(self.selected_segmented_by());
        result
    }

    fn attributes_in(&self, obj_ids: &[String]) -> Vec<&'a CatalogObject> {
        self.filtered
            .filtered_attributes
            .iter()
            .filter(|object| obj_ids.contains(&object.obj_id_key()))
            .collect()
    }
}
