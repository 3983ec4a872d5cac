//! Execution request sent to the validity service, and its response.
//!
//! # Invariants
//! - Request field order is deterministic for identical selections, so the
//!   serialized form can be used as a cache key.

use crate::model::catalog::ObjectKind;
use crate::model::selection::{AggregationFunction, Selection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRequest {
    pub obj_id: String,
    #[serde(default)]
    pub function: Option<AggregationFunction>,
}

/// Positive attribute filter: keep rows whose attribute value is listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub attribute: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub metrics: Vec<MetricRequest>,
    pub attributes: Vec<String>,
    pub filters: Vec<AttributeFilter>,
}

impl ExecutionRequest {
    pub fn from_selection(selection: &Selection) -> Self {
        build_execution_request(
            &selection.metric_ids_with_functions(),
            &selection.attribute_ids(),
            &selection.filter_attribute_values(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.attributes.is_empty()
    }
}

/// Combines metrics, attributes and filter values into one request.
pub fn build_execution_request(
    metrics_with_functions: &[(&str, Option<AggregationFunction>)],
    attribute_ids: &[&str],
    filter_values: &BTreeMap<&str, &BTreeSet<String>>,
) -> ExecutionRequest {
    ExecutionRequest {
        metrics: metrics_with_functions
            .iter()
            .map(|(obj_id, function)| MetricRequest {
                obj_id: (*obj_id).to_string(),
                function: *function,
            })
            .collect(),
        attributes: attribute_ids.iter().map(|id| (*id).to_string()).collect(),
        filters: filter_values
            .iter()
            .map(|(attribute, values)| AttributeFilter {
                attribute: (*attribute).to_string(),
                values: values.iter().cloned().collect(),
            })
            .collect(),
    }
}

/// Ids still valid per kind, as returned by the validity service.
///
/// Kind keys other than fact, metric and attribute are ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, BTreeSet<String>>")]
pub struct ValidObjects(BTreeMap<ObjectKind, BTreeSet<String>>);

impl From<BTreeMap<String, BTreeSet<String>>> for ValidObjects {
    fn from(raw: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self(
            raw.into_iter()
                .filter_map(|(key, ids)| ObjectKind::from_key(&key).map(|kind| (kind, ids)))
                .collect(),
        )
    }
}

impl ValidObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids<I, V>(mut self, kind: ObjectKind, ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.0
            .entry(kind)
            .or_default()
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Valid ids of `kind`; absent kinds are empty.
    pub fn ids(&self, kind: ObjectKind) -> BTreeSet<&str> {
        self.0
            .get(&kind)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutionRequest, ValidObjects};
    use crate::model::catalog::ObjectKind;
    use crate::model::selection::{AggregationFunction, Selection};

    #[test]
    fn request_combines_all_selection_parts() {
        let selection = Selection::new()
            .with_metric("fact/amount", Some(AggregationFunction::Sum))
            .with_view_by("label/region")
            .with_segmented_by("label/product")
            .with_filter("label/region", ["West"])
            .with_filter("label/city", Vec::<String>::new());

        let request = ExecutionRequest::from_selection(&selection);
        assert_eq!(request.metrics.len(), 1);
        assert_eq!(request.metrics[0].obj_id, "fact/amount");
        assert_eq!(request.metrics[0].function, Some(AggregationFunction::Sum));
        assert_eq!(request.attributes, vec!["label/region", "label/product"]);
        assert_eq!(request.filters.len(), 1);
        assert_eq!(request.filters[0].attribute, "label/region");
        assert_eq!(request.filters[0].values, vec!["West"]);
        assert!(!request.is_empty());
    }

    #[test]
    fn valid_objects_reads_wire_form() {
        let valid: ValidObjects = serde_json::from_str(
            r#"{"attribute": ["a1", "a2.timestamp"], "metric": ["m1"]}"#,
        )
        .unwrap();
        assert_eq!(valid.ids(ObjectKind::Metric).into_iter().collect::<Vec<_>>(), vec!["m1"]);
        assert_eq!(valid.ids(ObjectKind::Attribute).len(), 2);
        assert!(valid.ids(ObjectKind::Fact).is_empty());
    }

    #[test]
    fn valid_objects_ignores_unknown_kinds() {
        let valid: ValidObjects =
            serde_json::from_str(r#"{"attribute": ["a"], "label": ["a"], "dataset": []}"#)
                .unwrap();
        assert_eq!(valid, ValidObjects::new().with_ids(ObjectKind::Attribute, ["a"]));

        let json = serde_json::to_string(&valid).unwrap();
        assert_eq!(json, r#"{"attribute":["a"]}"#);
        assert_eq!(serde_json::from_str::<ValidObjects>(&json).unwrap(), valid);
    }
}
