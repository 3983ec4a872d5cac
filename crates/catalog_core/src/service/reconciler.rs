//! Catalog reconciliation against the current selection.
//!
//! # Responsibility
//! - Ask the validity service which catalog objects remain compatible with
//!   the selected metrics, attributes and filter values.
//! - Partition every catalog object into kept ("filtered") and removed.
//!
//! # Invariants
//! - Per kind, filtered and removed are disjoint and together equal the full
//!   catalog of that kind, in catalog order.
//! - Attribute ids ending in `.timestamp` are never kept.
//! - Without selected metrics or attributes the validity service is not
//!   called and nothing is removed.

use crate::model::catalog::{CatalogObject, ObjectKind};
use crate::model::execution::{build_execution_request, ExecutionRequest, ValidObjects};
use crate::model::selection::{AggregationFunction, Selection};
use crate::source::SourceResult;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Suffix of internal dataset timestamp attributes leaked by the backend.
pub const INTERNAL_TIMESTAMP_SUFFIX: &str = ".timestamp";

/// How removed objects are summarized for the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReportMode {
    /// Every non-empty kind, in fact/metric/attribute order.
    #[default]
    AllKinds,
    /// Only the first non-empty kind (legacy report format).
    FirstKindOnly,
}

/// Result of one reconciliation pass; immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredObjects {
    pub filtered_facts: Vec<CatalogObject>,
    pub filtered_metrics: Vec<CatalogObject>,
    pub filtered_attributes: Vec<CatalogObject>,
    pub removed_facts: Vec<CatalogObject>,
    pub removed_metrics: Vec<CatalogObject>,
    pub removed_attributes: Vec<CatalogObject>,
}

impl FilteredObjects {
    /// Keeps the whole catalog.
    pub fn unfiltered(
        facts: &[CatalogObject],
        metrics: &[CatalogObject],
        attributes: &[CatalogObject],
    ) -> Self {
        Self {
            filtered_facts: facts.to_vec(),
            filtered_metrics: metrics.to_vec(),
            filtered_attributes: attributes.to_vec(),
            ..Self::default()
        }
    }

    pub fn count_filtered(&self) -> usize {
        self.filtered_facts.len() + self.filtered_metrics.len() + self.filtered_attributes.len()
    }

    pub fn count_removed(&self) -> usize {
        self.removed_facts.len() + self.removed_metrics.len() + self.removed_attributes.len()
    }

    pub fn count_all(&self) -> usize {
        self.count_filtered() + self.count_removed()
    }

    /// Kept objects: facts, then metrics, then attributes.
    pub fn filtered_all(&self) -> impl Iterator<Item = &CatalogObject> {
        self.filtered_facts
            .iter()
            .chain(&self.filtered_metrics)
            .chain(&self.filtered_attributes)
    }

    pub fn removed(&self, kind: ObjectKind) -> &[CatalogObject] {
        match kind {
            ObjectKind::Fact => &self.removed_facts,
            ObjectKind::Metric => &self.removed_metrics,
            ObjectKind::Attribute => &self.removed_attributes,
        }
    }

    /// Numbered list of removed objects, `None` when nothing was removed.
    pub fn report_removed(&self, mode: RemovalReportMode) -> Option<String> {
        if self.count_removed() == 0 {
            return None;
        }

        let mut sections = [ObjectKind::Fact, ObjectKind::Metric, ObjectKind::Attribute]
            .into_iter()
            .filter(|kind| !self.removed(*kind).is_empty())
            .map(|kind| {
                let mut section = format!("- Removed {}:\n", kind.plural());
                write_numbered(&mut section, self.removed(kind), "\t");
                section
            });

        match mode {
            RemovalReportMode::FirstKindOnly => sections.next(),
            RemovalReportMode::AllKinds => Some(sections.fold(
                "Removed objects:\n".to_string(),
                |mut report, section| {
                    report.push_str(&section);
                    report
                },
            )),
        }
    }

    /// Numbered list of removed attributes only.
    pub fn report_removed_attributes(&self) -> Option<String> {
        if self.removed_attributes.is_empty() {
            return None;
        }
        let mut report = "Removed attributes:\n".to_string();
        write_numbered(&mut report, &self.removed_attributes, "");
        Some(report)
    }
}

fn write_numbered(out: &mut String, objects: &[CatalogObject], indent: &str) {
    for (index, object) in objects.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{indent}{}. {}", index + 1, object.title);
    }
}

/// Reconciles the full catalog against the selection.
///
/// `compute_valid` is invoked at most once, and only when metrics or
/// attributes are selected. Its errors are returned unchanged.
pub fn reconcile<F>(
    facts: &[CatalogObject],
    metrics: &[CatalogObject],
    attributes: &[CatalogObject],
    metrics_with_functions: &[(&str, Option<AggregationFunction>)],
    attribute_ids: &[&str],
    filter_values: &BTreeMap<&str, &BTreeSet<String>>,
    compute_valid: F,
) -> SourceResult<FilteredObjects>
where
    F: FnOnce(&ExecutionRequest) -> SourceResult<ValidObjects>,
{
    if metrics_with_functions.is_empty() && attribute_ids.is_empty() {
        debug!("event=catalog_reconcile module=service status=skipped reason=empty_selection");
        return Ok(FilteredObjects::unfiltered(facts, metrics, attributes));
    }

    let request = build_execution_request(metrics_with_functions, attribute_ids, filter_values);
    let valid = compute_valid(&request)?;

    let valid_facts = valid.ids(ObjectKind::Fact);
    let valid_metrics = valid.ids(ObjectKind::Metric);
    let mut valid_attributes = valid.ids(ObjectKind::Attribute);
    valid_attributes.retain(|id| !id.ends_with(INTERNAL_TIMESTAMP_SUFFIX));

    let (filtered_facts, removed_facts) = partition(facts, &valid_facts);
    let (filtered_metrics, removed_metrics) = partition(metrics, &valid_metrics);
    let (filtered_attributes, removed_attributes) = partition(attributes, &valid_attributes);

    let result = FilteredObjects {
        filtered_facts,
        filtered_metrics,
        filtered_attributes,
        removed_facts,
        removed_metrics,
        removed_attributes,
    };
    debug!(
        "event=catalog_reconcile module=service status=ok filtered={} total={}",
        result.count_filtered(),
        result.count_all()
    );
    Ok(result)
}

/// Convenience wrapper taking the selection snapshot directly.
pub fn reconcile_selection<F>(
    facts: &[CatalogObject],
    metrics: &[CatalogObject],
    attributes: &[CatalogObject],
    selection: &Selection,
    compute_valid: F,
) -> SourceResult<FilteredObjects>
where
    F: FnOnce(&ExecutionRequest) -> SourceResult<ValidObjects>,
{
    reconcile(
        facts,
        metrics,
        attributes,
        &selection.metric_ids_with_functions(),
        &selection.attribute_ids(),
        &selection.filter_attribute_values(),
        compute_valid,
    )
}

fn partition(
    objects: &[CatalogObject],
    valid_ids: &BTreeSet<&str>,
) -> (Vec<CatalogObject>, Vec<CatalogObject>) {
    objects
        .iter()
        .cloned()
        .partition(|object| valid_ids.contains(object.id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::{FilteredObjects, RemovalReportMode};
    use crate::model::catalog::CatalogObject;

    fn with_removals() -> FilteredObjects {
        FilteredObjects {
            filtered_metrics: vec![CatalogObject::metric("m1", "Revenue")],
            removed_facts: vec![CatalogObject::fact("f1", "Amount")],
            removed_attributes: vec![
                CatalogObject::attribute("a1", "Region"),
                CatalogObject::attribute("a2", "City"),
            ],
            ..FilteredObjects::default()
        }
    }

    #[test]
    fn counts_cover_both_sides() {
        let objects = with_removals();
        assert_eq!(objects.count_filtered(), 1);
        assert_eq!(objects.count_removed(), 3);
        assert_eq!(objects.count_all(), 4);
    }

    #[test]
    fn report_lists_all_removed_kinds() {
        let report = with_removals()
            .report_removed(RemovalReportMode::AllKinds)
            .expect("report expected");
        assert_eq!(
            report,
            "Removed objects:\n- Removed facts:\n\t1. Amount\n- Removed attributes:\n\t1. Region\n\t2. City\n"
        );
    }

    #[test]
    fn legacy_report_stops_at_first_removed_kind() {
        let report = with_removals()
            .report_removed(RemovalReportMode::FirstKindOnly)
            .expect("report expected");
        assert_eq!(report, "- Removed facts:\n\t1. Amount\n");
    }

    #[test]
    fn attribute_report_is_unindented() {
        let report = with_removals()
            .report_removed_attributes()
            .expect("report expected");
        assert_eq!(report, "Removed attributes:\n1. Region\n2. City\n");
    }

    #[test]
    fn reports_are_absent_without_removals() {
        let objects = FilteredObjects::unfiltered(&[], &[CatalogObject::metric("m1", "M")], &[]);
        assert_eq!(objects.report_removed(RemovalReportMode::AllKinds), None);
        assert_eq!(objects.report_removed(RemovalReportMode::FirstKindOnly), None);
        assert_eq!(objects.report_removed_attributes(), None);
    }
}
