//! User selection snapshot.
//!
//! # Responsibility
//! - Hold the user's current picks (metrics, view-by, segment-by, filters,
//!   sort order) as one explicit value passed into reconciliation.
//!
//! # Invariants
//! - Every list keeps insertion order and holds each object id at most once.
//! - A metric appears once; re-selecting it replaces its aggregation function
//!   in place.
//! - Missing fields deserialize to "nothing selected".

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Aggregation applied when a fact or attribute is used as a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationFunction {
    Sum,
    Count,
    Avg,
    Min,
    Max,
    Median,
}

impl AggregationFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Count => "count",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
        }
    }
}

impl Display for AggregationFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selected metric; `function` is `None` for real metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedMetric {
    pub obj_id: String,
    #[serde(default)]
    pub function: Option<AggregationFunction>,
}

/// Immutable snapshot of the user's selections.
///
/// Deserialized input goes through the same rules as the builders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSelection")]
pub struct Selection {
    pub metrics: Vec<SelectedMetric>,
    pub view_by: Vec<String>,
    pub segmented_by: Option<String>,
    pub filter_attributes: Vec<String>,
    pub filter_values: BTreeMap<String, BTreeSet<String>>,
    pub sort_by: Vec<String>,
    pub sort_desc: BTreeMap<String, bool>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds a metric, or replaces the function of an already selected one.
    pub fn with_metric(
        mut self,
        obj_id: impl Into<String>,
        function: Option<AggregationFunction>,
    ) -> Self {
        let obj_id = obj_id.into();
        match self.metrics.iter_mut().find(|m| m.obj_id == obj_id) {
            Some(existing) => existing.function = function,
            None => self.metrics.push(SelectedMetric { obj_id, function }),
        }
        self
    }

    pub fn with_view_by(mut self, obj_id: impl Into<String>) -> Self {
        push_unique(&mut self.view_by, obj_id.into());
        self
    }

    pub fn with_segmented_by(mut self, obj_id: impl Into<String>) -> Self {
        self.segmented_by = Some(obj_id.into());
        self
    }

    /// Selects a filter attribute together with its literal values.
    pub fn with_filter<I, V>(mut self, obj_id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let obj_id = obj_id.into();
        push_unique(&mut self.filter_attributes, obj_id.clone());
        self.filter_values
            .entry(obj_id)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_sort(mut self, obj_id: impl Into<String>, descending: bool) -> Self {
        let obj_id = obj_id.into();
        push_unique(&mut self.sort_by, obj_id.clone());
        self.sort_desc.insert(obj_id, descending);
        self
    }

    /// Metric obj id -> aggregation function, in selection order.
    pub fn metric_ids_with_functions(&self) -> Vec<(&str, Option<AggregationFunction>)> {
        self.metrics
            .iter()
            .map(|m| (m.obj_id.as_str(), m.function))
            .collect()
    }

    pub fn has_metric(&self, obj_id: &str) -> bool {
        self.metrics.iter().any(|m| m.obj_id == obj_id)
    }

    /// View-by attributes followed by the segment-by attribute.
    pub fn attribute_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::with_capacity(self.view_by.len() + 1);
        for id in self.view_by.iter().chain(self.segmented_by.iter()) {
            if !ids.contains(&id.as_str()) {
                ids.push(id.as_str());
            }
        }
        ids
    }

    /// Values of selected filter attributes; attributes without values are
    /// left out because they do not constrain anything.
    pub fn filter_attribute_values(&self) -> BTreeMap<&str, &BTreeSet<String>> {
        self.filter_attributes
            .iter()
            .filter_map(|id| {
                self.filter_values
                    .get(id)
                    .filter(|values| !values.is_empty())
                    .map(|values| (id.as_str(), values))
            })
            .collect()
    }

    pub fn sort_desc_for(&self, obj_id: &str) -> bool {
        self.sort_desc.get(obj_id).copied().unwrap_or(false)
    }

    /// True when nothing constrains the catalog yet.
    pub fn is_unconstrained(&self) -> bool {
        self.metrics.is_empty() && self.view_by.is_empty() && self.segmented_by.is_none()
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawSelection {
    metrics: Vec<SelectedMetric>,
    view_by: Vec<String>,
    segmented_by: Option<String>,
    filter_attributes: Vec<String>,
    filter_values: BTreeMap<String, BTreeSet<String>>,
    sort_by: Vec<String>,
    sort_desc: BTreeMap<String, bool>,
}

impl From<RawSelection> for Selection {
    fn from(raw: RawSelection) -> Self {
        let mut selection = Selection {
            segmented_by: raw.segmented_by,
            filter_values: raw.filter_values,
            sort_desc: raw.sort_desc,
            ..Selection::default()
        };
        for metric in raw.metrics {
            selection = selection.with_metric(metric.obj_id, metric.function);
        }
        for (target, ids) in [
            (&mut selection.view_by, raw.view_by),
            (&mut selection.filter_attributes, raw.filter_attributes),
            (&mut selection.sort_by, raw.sort_by),
        ] {
            for id in ids {
                push_unique(target, id);
            }
        }
        selection
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}
