use catalog_core::lookup::local_id;
use catalog_core::{
    AggregationFunction, Catalog, CatalogError, CatalogObject, CatalogSettings, CatalogSource,
    FixtureCatalogSource, FixtureWorkspace, ObjectKind, ProjectionError, RemovalReportMode,
    Selection, StaleSortPolicy, ValidObjects, Workspace,
};

fn source(valid_objects: Option<ValidObjects>) -> FixtureCatalogSource {
    FixtureCatalogSource::new().with_workspace(
        Workspace {
            id: "sales".to_string(),
            name: "Sales".to_string(),
        },
        FixtureWorkspace {
            facts: vec![CatalogObject::fact("amount", "Amount")],
            metrics: vec![
                CatalogObject::metric("m1", "Revenue"),
                CatalogObject::metric("m2", "Orders"),
                CatalogObject::metric("m3", "Margin"),
            ],
            attributes: vec![
                CatalogObject::attribute("region", "Region"),
                CatalogObject::attribute("city", "City"),
                CatalogObject::attribute("product", "Product"),
            ],
            valid_objects,
            ..FixtureWorkspace::default()
        },
    )
}

fn titles(objects: &[&CatalogObject]) -> Vec<String> {
    objects.iter().map(|o| o.title.clone()).collect()
}

fn load(source: &FixtureCatalogSource, selection: Selection) -> Catalog {
    Catalog::load(source, "sales", selection, CatalogSettings::default()).unwrap()
}

#[test]
fn sort_by_preserves_user_order() {
    let source = source(None);
    let selection = Selection::new()
        .with_metric("metric/m1", None)
        .with_metric("metric/m2", None)
        .with_sort("metric/m2", false)
        .with_sort("metric/m1", false);

    let catalog = load(&source, selection);
    let sort_by = catalog.selected_sort_by().unwrap();
    assert_eq!(titles(&sort_by), vec!["Orders", "Revenue"]);
    assert_eq!(titles(&catalog.selected_metrics()), vec!["Revenue", "Orders"]);
}

#[test]
fn sort_columns_report_ascending_flags() {
    let source = source(None);
    let selection = Selection::new()
        .with_metric("metric/m1", None)
        .with_metric("metric/m2", None)
        .with_sort("metric/m1", true)
        .with_sort("metric/m2", false);

    let columns = load(&source, selection).selected_sort_columns().unwrap();
    assert_eq!(columns.ascending, vec![false, true]);
    assert_eq!(
        columns.columns,
        vec![local_id("metric/m1"), local_id("metric/m2")]
    );
}

#[test]
fn sort_columns_use_titles_for_non_metric_objects() {
    let source = source(None);
    let selection = Selection::new()
        .with_metric("fact/amount", Some(AggregationFunction::Sum))
        .with_view_by("label/region")
        .with_sort("label/region", false)
        .with_sort("fact/amount", true);

    let columns = load(&source, selection).selected_sort_columns().unwrap();
    assert_eq!(columns.columns, vec!["Region".to_string(), "fact_amount".to_string()]);
    assert_eq!(columns.ascending, vec![true, false]);
}

#[test]
fn selected_all_orders_metrics_view_by_then_segment() {
    let source = source(None);
    let selection = Selection::new()
        .with_segmented_by("label/region")
        .with_view_by("label/product")
        .with_view_by("label/city")
        .with_metric("metric/m2", None)
        .with_metric("fact/amount", Some(AggregationFunction::Avg));

    let catalog = load(&source, selection);
    assert_eq!(
        titles(&catalog.selected_view_by()),
        vec!["City", "Product"]
    );
    assert_eq!(
        catalog.selected_segmented_by().map(|o| o.title.as_str()),
        Some("Region")
    );
    assert_eq!(
        titles(&catalog.selected_all()),
        vec!["Amount", "Orders", "City", "Product", "Region"]
    );
}

#[test]
fn filter_attributes_resolve_in_catalog_order() {
    let source = source(None);
    let selection = Selection::new()
        .with_filter("label/product", ["Shoes"])
        .with_filter("label/region", ["West"]);

    let catalog = load(&source, selection);
    assert_eq!(
        titles(&catalog.selected_filter_attributes()),
        vec!["Region", "Product"]
    );
    assert_eq!(source.call_count("compute_valid_objects"), 0);
}

#[test]
fn removed_objects_disappear_from_views() {
    let valid = ValidObjects::new()
        .with_ids(ObjectKind::Metric, ["m1"])
        .with_ids(ObjectKind::Attribute, ["region"]);
    let source = source(Some(valid));
    let selection = Selection::new()
        .with_metric("metric/m1", None)
        .with_metric("metric/m3", None)
        .with_view_by("label/region")
        .with_segmented_by("label/city");

    let catalog = load(&source, selection);
    assert_eq!(source.call_count("compute_valid_objects"), 1);
    assert_eq!(titles(&catalog.selected_metrics()), vec!["Revenue"]);
    assert!(catalog.selected_segmented_by().is_none());
    assert_eq!(titles(&catalog.selected_all()), vec!["Revenue", "Region"]);
    assert_eq!(catalog.filtered_objects().count_all(), 7);
    assert_eq!(catalog.all_metrics().len(), 3);
    assert_eq!(
        catalog.report_removed().unwrap(),
        "Removed objects:\n- Removed facts:\n\t1. Amount\n- Removed metrics:\n\t1. Orders\n\t2. Margin\n- Removed attributes:\n\t1. City\n\t2. Product\n"
    );
}

#[test]
fn stale_sort_id_follows_configured_policy() {
    let valid = ValidObjects::new().with_ids(ObjectKind::Metric, ["m1"]);
    let source = source(Some(valid));
    let selection = Selection::new()
        .with_metric("metric/m1", None)
        .with_sort("metric/m2", true)
        .with_sort("metric/m1", true);

    let strict = load(&source, selection.clone());
    let err = strict.selected_sort_by().unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Projection(ProjectionError::SortObjectNotFound(ref id)) if id == "metric/m2"
    ));

    let settings = CatalogSettings {
        stale_sort_policy: StaleSortPolicy::Skip,
        report_mode: RemovalReportMode::FirstKindOnly,
        ..CatalogSettings::default()
    };
    let lenient = Catalog::load(&source, "sales", selection, settings).unwrap();
    let columns = lenient.selected_sort_columns().unwrap();
    assert_eq!(columns.columns, vec![local_id("metric/m1")]);
    assert_eq!(columns.ascending, vec![false]);
    assert_eq!(
        lenient.report_removed().unwrap(),
        "- Removed facts:\n\t1. Amount\n"
    );
}

#[test]
fn custom_local_id_is_used_for_metric_columns() {
    fn quoted(obj_id: &str) -> String {
        format!("\"{obj_id}\"")
    }

    let source = source(None);
    let selection = Selection::new()
        .with_metric("metric/m1", None)
        .with_sort("metric/m1", false);
    let catalog = load(&source, selection).with_local_id(quoted);
    assert_eq!(
        catalog.selected_sort_columns().unwrap().columns,
        vec!["\"metric/m1\"".to_string()]
    );
}

#[test]
fn invalid_workspace_id_is_rejected_before_fetching() {
    let source = source(None);
    let err = Catalog::load(&source, "../etc", Selection::new(), CatalogSettings::default())
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidWorkspaceId(_)));
    assert_eq!(source.call_count("facts"), 0);
}

#[test]
fn unknown_workspace_surfaces_source_error() {
    let source = source(None);
    let err = Catalog::load(&source, "marketing", Selection::new(), CatalogSettings::default())
        .unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));
    assert_eq!(source.workspaces().unwrap().len(), 1);
}

#[test]
fn extra_validity_kinds_do_not_fail_loading() {
    let source = FixtureCatalogSource::from_json_str(
        r#"{
            "workspaces": [{"id": "sales", "name": "Sales"}],
            "catalogs": {
                "sales": {
                    "metrics": [
                        {"id": "m1", "obj_id": "metric/m1", "kind": "metric", "title": "Revenue"}
                    ],
                    "attributes": [
                        {"id": "region", "obj_id": "label/region", "kind": "attribute", "title": "Region"}
                    ],
                    "valid_objects": {"metric": ["m1"], "label": ["region"], "dataset": ["orders"]}
                }
            }
        }"#,
    )
    .unwrap();
    let selection = Selection::from_json_str(
        r#"{"metrics": [{"obj_id": "metric/m1"}, {"obj_id": "metric/m1"}], "view_by": ["label/region"]}"#,
    )
    .unwrap();

    let catalog = load(&source, selection);
    assert_eq!(titles(&catalog.selected_metrics()), vec!["Revenue"]);
    assert!(catalog.selected_view_by().is_empty());
    assert_eq!(catalog.filtered_objects().count_removed(), 1);
}
