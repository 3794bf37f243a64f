use pbix_extract_container::ArchiveBuilder;
use pbix_extract_core::{IssueKind, UiModel};
use pbix_extract_discovery::output::{OutputFormat, format_model};
use pbix_extract_discovery::pipeline::UiExtractor;
use serde_json::{Value, json};

fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Serializes a configuration the way real containers carry it: a JSON
/// document inside a JSON string.
fn string_config(config: &Value) -> Value {
    Value::String(config.to_string())
}

fn bar_chart_config() -> Value {
    json!({"singleVisual": {
        "visualType": "barChart",
        "projections": {
            "Category": [{"queryRef": "Sales.Category"}],
            "Y": [{"queryRef": "Sum(Sales.Amount)"}]
        }
    }})
}

fn button_config() -> Value {
    json!({"singleVisual": {
        "visualType": "actionButton",
        "vcObjects": {"visualLink": [
            {"properties": {
                "type": {"expr": {"Literal": {"Value": "'Bookmark'"}}},
                "bookmark": {"expr": {"Literal": {"Value": "'BM1'"}}}
            }}
        ]}
    }})
}

fn table_config() -> Value {
    json!({"singleVisual": {
        "visualType": "tableEx",
        "query": {"dataRoles": [{"role": "Values", "queryRef": "Sales.Amount"}]}
    }})
}

/// A two-page layout in the shape the producing application writes.
fn sample_layout() -> Value {
    json!({
        "id": 0,
        "sections": [
            {
                "name": "ReportSection1",
                "displayName": "Overview",
                "ordinal": 0,
                "width": 1280, "height": 720,
                "visualContainers": [
                    {"id": 1, "x": 40, "y": 80, "width": 600, "height": 400, "z": 0,
                     "config": string_config(&bar_chart_config())},
                    {"id": 2, "x": 700, "y": 80, "width": 200, "height": 60, "z": 1,
                     "config": string_config(&button_config())}
                ],
                "filters": [{"field": "Year"}]
            },
            {
                "name": "ReportSection2",
                "displayName": "Detail",
                "ordinal": 1,
                "width": 1280, "height": 720,
                "visualContainers": [
                    {"id": 3, "x": 0, "y": 0, "width": 1280, "height": 720, "z": 0,
                     "config": string_config(&table_config())}
                ]
            }
        ]
    })
}

fn sample_container() -> Vec<u8> {
    ArchiveBuilder::new()
        .stored("Report/Layout", &utf16le(&sample_layout().to_string()))
        .stored("Metadata", &utf16le("{\"fileVersion\": \"5.43\"}"))
        .stored(
            "Report/CustomVisuals/chiclet/package.json",
            b"{\"name\": \"ChicletSlicer\", \"version\": \"1.6.3\"}",
        )
        .stored("Report/CustomVisuals/chiclet/icon.png", &[0u8, 1, 2, 3])
        .stored("Version", &utf16le("1.28"))
        .stored("DataModel", &[8u8, 9, 10, 11])
        .finish()
}

fn extract(bytes: Vec<u8>) -> UiModel {
    UiExtractor::from_bytes(bytes)
        .expect("container should open")
        .extract()
        .expect("extraction should succeed")
}

/// Strips the per-run timestamp so two models of the same source compare.
fn comparable(mut model: UiModel) -> Value {
    model.run.started_at = String::new();
    serde_json::to_value(&model).expect("model should serialize")
}

#[test]
fn test_full_extraction_of_two_page_container() {
    let model = extract(sample_container());

    assert_eq!(model.pages.len(), 2);
    assert_eq!(model.pages[0].name, "ReportSection1");
    assert_eq!(model.pages[0].display_label(), "Overview");
    assert_eq!(model.pages[1].ordinal, 1);
    assert_eq!(model.run.page_count, 2);
    assert_eq!(model.run.visual_count, 3);
    assert!(model.run.issues.is_empty(), "clean container must produce no issues");
}

#[test]
fn test_visual_classification_and_bindings_survive_the_pipeline() {
    let model = extract(sample_container());

    let chart = model.find_visual("1").expect("bar chart should be extracted");
    assert_eq!(chart.canonical_type, "Bar Chart");
    assert_eq!(chart.raw_type, "barChart");
    assert_eq!(chart.page.as_deref(), Some("ReportSection1"));
    assert_eq!(chart.geometry.width, 600.0);
    assert!(chart.data_roles.iter().any(|b| b.field == "Sales.Category"));
    assert!(chart.data_roles.iter().any(|b| b.field == "Sum(Sales.Amount)"));

    let table = model.find_visual("3").expect("table should be extracted");
    assert_eq!(table.canonical_type, "Table");
    assert_eq!(table.page.as_deref(), Some("ReportSection2"));

    assert_eq!(model.visual_type_histogram.get("Bar Chart"), Some(&1));
    assert_eq!(model.visual_type_histogram.get("Action Button"), Some(&1));
    assert_eq!(model.visual_type_histogram.get("Table"), Some(&1));
}

#[test]
fn test_bookmark_inventory_crosses_references() {
    let model = extract(sample_container());

    assert_eq!(model.bookmarks.len(), 1);
    let bookmark = &model.bookmarks[0];
    assert_eq!(bookmark.target, "BM1");
    assert_eq!(bookmark.visual_id, "2");
    assert_eq!(bookmark.visual_type, "Action Button");
    assert_eq!(bookmark.page.as_deref(), Some("ReportSection1"));
    assert_eq!(model.run.bookmark_count, 1);
}

#[test]
fn test_page_filters_and_counts() {
    let model = extract(sample_container());

    assert_eq!(model.pages[0].filters.len(), 1);
    assert!(model.filters.is_empty());
    assert_eq!(model.run.filter_count, 1);
}

#[test]
fn test_ancillary_members_are_collected() {
    let model = extract(sample_container());

    assert_eq!(model.run.producer_version.as_deref(), Some("1.28"));
    assert!(model.report_metadata.contains_key("Metadata"));

    assert_eq!(model.custom_visuals.len(), 2);
    let package = model
        .custom_visuals
        .iter()
        .find(|d| d.member_path.ends_with("package.json"))
        .expect("descriptor member should be collected");
    assert_eq!(package.name.as_deref(), Some("ChicletSlicer"));
    assert_eq!(package.version.as_deref(), Some("1.6.3"));
    assert!(!package.parse_failed);

    let icon = model
        .custom_visuals
        .iter()
        .find(|d| d.member_path.ends_with("icon.png"))
        .expect("binary asset should be collected");
    assert!(icon.parse_failed);
    assert_eq!(icon.size, 4);

    // The opaque data member is never read.
    assert!(!model.run.members_consumed.iter().any(|m| m == "DataModel"));
    assert!(model.run.members_consumed.iter().any(|m| m == "Report/Layout"));
}

#[test]
fn test_container_without_layout_yields_empty_model_not_error() {
    let bytes = ArchiveBuilder::new().stored("DataModel", &[1u8, 2, 3]).finish();
    let model = extract(bytes);

    assert!(model.is_empty());
    assert!(model.model_version.is_some());
    assert!(
        model
            .run
            .issues
            .iter()
            .any(|issue| issue.kind == IssueKind::NoLayoutCandidates)
    );

    let summary = format_model(&model, OutputFormat::Text).expect("summary should format");
    assert!(summary.contains("Errors encountered: 1"));
    assert!(summary.contains("no_layout_candidates"));
}

#[test]
fn test_string_and_object_configs_extract_identically() {
    let stringly = sample_layout();

    let mut inline = sample_layout();
    for section in inline["sections"].as_array_mut().expect("sections") {
        for container in section["visualContainers"].as_array_mut().expect("containers") {
            let raw = container["config"].as_str().expect("string config").to_string();
            container["config"] = serde_json::from_str(&raw).expect("config should parse");
        }
    }

    let model_a = extract(
        ArchiveBuilder::new()
            .stored("Report/Layout", &utf16le(&stringly.to_string()))
            .finish(),
    );
    let model_b = extract(
        ArchiveBuilder::new()
            .stored("Report/Layout", &utf16le(&inline.to_string()))
            .finish(),
    );

    // Same pages, visuals, bindings, bookmarks, and counts either way; only
    // the source digest and timestamp may differ.
    let volatile = |model: &UiModel| {
        (
            serde_json::to_value(&model.pages).unwrap(),
            serde_json::to_value(&model.visuals).unwrap(),
            serde_json::to_value(&model.bookmarks).unwrap(),
            serde_json::to_value(&model.visual_type_histogram).unwrap(),
        )
    };
    assert_eq!(volatile(&model_a), volatile(&model_b));
    assert!(model_a.run.issues.is_empty());
    assert!(model_b.run.issues.is_empty());
}

#[test]
fn test_over_collection_never_under_reports() {
    // Pages reachable both through the section list and a nested page list,
    // plus a free-floating visual: everything must surface at least once.
    let doc = json!({
        "sections": [
            {"name": "ReportSection1", "ordinal": 0, "visualContainers": [
                {"id": 1, "config": string_config(&bar_chart_config())}
            ]},
            {"name": "ReportSection2", "ordinal": 1, "visualContainers": [],
             "pages": [{"name": "NestedPage", "ordinal": 7, "visualContainers": []}]}
        ],
        "floating": {"visualType": "card"}
    });
    let model = extract(
        ArchiveBuilder::new()
            .stored("Report/Layout", &utf16le(&doc.to_string()))
            .finish(),
    );

    assert!(model.pages.len() >= 3, "expected at least 3 pages, got {}", model.pages.len());
    assert!(model.visuals.len() >= 2, "expected at least 2 visuals, got {}", model.visuals.len());
}

#[test]
fn test_broken_member_degrades_while_good_member_extracts() {
    let bytes = ArchiveBuilder::new()
        .stored("Report/Layout", &utf16le(&sample_layout().to_string()))
        .stored("Report/LayoutAux", b"{not valid json")
        .finish();
    let model = extract(bytes);

    assert_eq!(model.pages.len(), 2, "good member must still extract");
    let parse_issues: Vec<_> = model
        .run
        .issues
        .iter()
        .filter(|issue| issue.kind == IssueKind::ParseFailure)
        .collect();
    assert_eq!(parse_issues.len(), 1);
    assert_eq!(parse_issues[0].member, "Report/LayoutAux");
    assert!(parse_issues[0].detail.contains("retained preview"));
}

#[test]
fn test_parallel_extraction_matches_sequential() {
    let bytes = sample_container();

    let sequential = UiExtractor::from_bytes(bytes.clone())
        .expect("container should open")
        .extract()
        .expect("sequential extraction should succeed");
    let parallel = UiExtractor::from_bytes(bytes)
        .expect("container should open")
        .with_parallel(true)
        .extract()
        .expect("parallel extraction should succeed");

    assert_eq!(comparable(sequential), comparable(parallel));
}

#[test]
fn test_extraction_is_deterministic_across_runs() {
    let bytes = sample_container();
    let first = extract(bytes.clone());
    let second = extract(bytes);
    assert_eq!(comparable(first), comparable(second));
}
