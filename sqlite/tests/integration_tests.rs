//! Integration tests for the pbix-extract-sqlite crate.

use pbix_extract_core::{
    CustomVisualDescriptor, DataRoleBinding, Filter, Geometry, Page, UiModel, Visual,
};
use pbix_extract_datamodel::{
    CalculatedColumn, DataModelBundle, Measure, Relationship, SourceQuery,
};
use pbix_extract_sqlite::Projector;
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Builds a three-page model: two populated pages and one without visuals.
fn sample_model() -> UiModel {
    let mut model = UiModel::default();

    let mut overview = Page::new("ReportSection1")
        .with_display_name("Overview")
        .with_ordinal(0)
        .with_dimensions(1280.0, 720.0);
    overview.visual_ids = vec!["vc1".to_string(), "vc2".to_string()];
    overview.filters.push(Filter::new(
        "sections[0]",
        serde_json::json!({"field": "Year", "type": "Advanced"}),
    ));

    let mut detail = Page::new("ReportSection2")
        .with_display_name("Detail")
        .with_ordinal(1)
        .with_dimensions(1280.0, 720.0);
    detail.visual_ids = vec!["vc3".to_string()];

    let blank = Page::new("ReportSection3").with_ordinal(2);

    model.pages.extend([overview, detail, blank]);

    let mut chart = Visual::new("vc1", "barChart", "Bar Chart")
        .with_geometry(Geometry::rounded(0.0, 0.0, 640.0, 480.0, 0.0))
        .with_discovery_path("sections[0].visualContainers[0]");
    chart.page = Some("ReportSection1".to_string());
    chart
        .data_roles
        .push(DataRoleBinding::new("Category", "Sales.Region"));
    chart.data_roles.push(DataRoleBinding::new("Y", "Sales.Amount"));
    chart.config_size = 412;

    let mut button = Visual::new("vc2", "actionButton", "Action Button")
        .with_geometry(Geometry::rounded(700.0, 10.0, 120.0, 40.0, 1.0))
        .with_discovery_path("sections[0].visualContainers[1]");
    button.page = Some("ReportSection1".to_string());
    button.bookmark_target = Some("BM1".to_string());

    let mut textbox = Visual::new("vc3", "textbox", "Text Box")
        .with_geometry(Geometry::rounded(20.0, 20.0, 400.0, 80.0, 0.0))
        .with_discovery_path("sections[1].visualContainers[0]");
    textbox.page = Some("ReportSection2".to_string());
    textbox.text_content = Some("Quarterly sales".to_string());

    model.visuals.extend([chart, button, textbox]);

    model.custom_visuals.push(CustomVisualDescriptor::parsed(
        "Report/CustomVisuals/Chiclet/package.json",
        Some("ChicletSlicer".to_string()),
        Some("1.6.3".to_string()),
        2048,
    ));
    model.custom_visuals.push(CustomVisualDescriptor::unparsed(
        "Report/CustomVisuals/Chiclet/icon.png",
        512,
    ));

    model
}

/// Builds a bundle with at least one row in every projected category.
fn sample_bundle() -> DataModelBundle {
    let mut bundle = DataModelBundle::default();

    bundle.measures.push(Measure {
        table: "Sales".into(),
        name: "Total Sales".into(),
        expression: "SUM(Sales[Amount])".into(),
        description: Some("Gross sales".into()),
    });
    bundle.measures.push(Measure {
        table: "Sales".into(),
        name: "Margin".into(),
        expression: "DIVIDE([Profit], [Total Sales])".into(),
        description: None,
    });

    bundle.calculated_columns.push(CalculatedColumn {
        table: "Sales".into(),
        column: "Profit".into(),
        expression: "[Amount] - [Cost]".into(),
        data_type: Some("Double".into()),
    });

    bundle.relationships.push(Relationship {
        from_table: "Sales".into(),
        from_column: "ProductId".into(),
        to_table: "Products".into(),
        to_column: "Id".into(),
        cardinality: Some("M:1".into()),
        is_active: true,
    });
    bundle.relationships.push(Relationship {
        from_table: "Sales".into(),
        from_column: "Date".into(),
        to_table: "Calendar".into(),
        to_column: "Date".into(),
        cardinality: None,
        is_active: false,
    });

    bundle.source_queries.push(SourceQuery {
        name: "Sales".into(),
        expression: r#"let Source = Sql.Database("srv", "dw") in Source"#.into(),
    });
    bundle.source_queries.push(SourceQuery {
        name: "Manual".into(),
        expression: "let x = 1 in x".into(),
    });

    bundle
}

/// In-memory projector with the store created.
fn setup_projector() -> Projector {
    let conn = Connection::open_in_memory().expect("in-memory connection should open");
    let mut projector = Projector::new(conn, "pbi_").expect("default prefix should validate");
    projector.up().expect("store creation should succeed");
    projector
}

// =============================================================================
// Projection Round Trips
// =============================================================================

#[test]
fn test_projection_writes_every_category() {
    let mut projector = setup_projector();
    let report = projector
        .project(&sample_model(), &sample_bundle())
        .expect("projection should succeed");

    assert_eq!(report.pages_written, 3);
    assert_eq!(report.visuals_written, 3);
    assert_eq!(report.custom_visuals_written, 2);
    assert_eq!(report.measures_written, 2);
    assert_eq!(report.calculated_columns_written, 1);
    assert_eq!(report.relationships_written, 2);
    assert_eq!(report.source_queries_written, 2);
    assert_eq!(report.total(), 14);

    let status = projector.status().unwrap();
    assert_eq!(status.page_count, 3);
    assert_eq!(status.visual_count, 3);
    assert_eq!(status.custom_visual_count, 2);
    assert_eq!(status.measure_count, 2);
    assert_eq!(status.calculated_column_count, 1);
    assert_eq!(status.relationship_count, 2);
    assert_eq!(status.source_query_count, 2);
    assert_eq!(status.total_rows(), 14);
}

#[test]
fn test_projection_is_idempotent() {
    let mut projector = setup_projector();
    let model = sample_model();
    let bundle = sample_bundle();

    projector.project(&model, &bundle).unwrap();
    let first = projector.status().unwrap();

    projector.project(&model, &bundle).unwrap();
    let second = projector.status().unwrap();

    assert_eq!(first.category_counts(), second.category_counts());
    assert_eq!(second.total_rows(), 14);
}

#[test]
fn test_reprojection_replaces_changed_rows() {
    let mut projector = setup_projector();
    projector
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    let mut changed = sample_model();
    changed.visuals[2].text_content = Some("Restated quarterly sales".to_string());
    projector.project(&changed, &DataModelBundle::default()).unwrap();

    let conn = projector.connection();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM pbi_visuals", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);

    let text: String = conn
        .query_row(
            "SELECT text_content FROM pbi_visuals WHERE visual_id = 'vc3'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(text, "Restated quarterly sales");
}

#[test]
fn test_duplicate_visual_keys_collapse_last_wins() {
    let mut model = UiModel::default();
    model.pages.push(Page::new("s1"));

    let mut first = Visual::new("vc1", "card", "Card");
    first.page = Some("s1".to_string());
    let mut second = Visual::new("vc1", "multiRowCard", "Multi-row Card");
    second.page = Some("s1".to_string());
    model.visuals.extend([first, second]);

    let mut projector = setup_projector();
    let report = projector.project(&model, &DataModelBundle::default()).unwrap();
    // Two write statements, one surviving row.
    assert_eq!(report.visuals_written, 2);

    let conn = projector.connection();
    let (count, canonical): (i64, String) = conn
        .query_row(
            "SELECT COUNT(*), MAX(canonical_type) FROM pbi_visuals WHERE visual_id = 'vc1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(canonical, "Multi-row Card");
}

#[test]
fn test_empty_model_projects_cleanly() {
    let mut projector = setup_projector();
    let report = projector
        .project(&UiModel::default(), &DataModelBundle::default())
        .unwrap();
    assert_eq!(report.total(), 0);
    assert_eq!(projector.status().unwrap().total_rows(), 0);
}

// =============================================================================
// Stored Row Fidelity
// =============================================================================

#[test]
fn test_page_row_carries_config_json() {
    let mut projector = setup_projector();
    projector
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    let filters: String = projector
        .connection()
        .query_row(
            "SELECT filters_config FROM pbi_pages WHERE page_id = 'ReportSection1'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&filters).unwrap();
    assert_eq!(parsed[0]["payload"]["field"], "Year");
}

#[test]
fn test_visual_row_carries_bindings_and_geometry() {
    let mut projector = setup_projector();
    projector
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    let (width, roles_count, roles_json): (f64, i64, String) = projector
        .connection()
        .query_row(
            "SELECT width, data_roles_count, data_roles_json \
             FROM pbi_visuals WHERE visual_id = 'vc1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(width, 640.0);
    assert_eq!(roles_count, 2);
    assert!(roles_json.contains("Sales.Region"));
}

#[test]
fn test_custom_visual_rows_keep_parse_outcome() {
    let mut projector = setup_projector();
    projector
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    let conn = projector.connection();
    let (name, failed): (Option<String>, i64) = conn
        .query_row(
            "SELECT visual_name, parse_failed FROM pbi_custom_visuals \
             WHERE member_path LIKE '%package.json'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(name.as_deref(), Some("ChicletSlicer"));
    assert_eq!(failed, 0);

    let (size, failed): (i64, i64) = conn
        .query_row(
            "SELECT payload_size, parse_failed FROM pbi_custom_visuals \
             WHERE member_path LIKE '%icon.png'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(size, 512);
    assert_eq!(failed, 1);
}

#[test]
fn test_source_queries_classified_on_write() {
    let mut projector = setup_projector();
    projector
        .project(&UiModel::default(), &sample_bundle())
        .unwrap();

    let conn = projector.connection();
    let mut stmt = conn
        .prepare("SELECT query_name, source_type FROM pbi_source_queries ORDER BY query_name")
        .unwrap();
    let types: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        types,
        vec![
            ("Manual".to_string(), "Other".to_string()),
            ("Sales".to_string(), "SQL Database".to_string()),
        ]
    );
}

// =============================================================================
// Derived Views
// =============================================================================

#[test]
fn test_page_summary_view_aggregates() {
    let mut projector = setup_projector();
    projector
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    let conn = projector.connection();
    let (count, types): (i64, Option<String>) = conn
        .query_row(
            "SELECT visual_count, visual_types FROM pbi_page_summary \
             WHERE page_id = 'ReportSection1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 2);
    let types = types.unwrap();
    assert!(types.contains("Bar Chart"));
    assert!(types.contains("Action Button"));

    // Pages without visuals still appear, at zero.
    let empty: i64 = conn
        .query_row(
            "SELECT visual_count FROM pbi_page_summary WHERE page_id = 'ReportSection3'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(empty, 0);
}

#[test]
fn test_visual_type_summary_counts_presence() {
    let mut projector = setup_projector();
    projector
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    let conn = projector.connection();
    let (count, bookmarks, texts): (i64, i64, i64) = conn
        .query_row(
            "SELECT visual_count, bookmark_count, text_count \
             FROM pbi_visual_type_summary WHERE canonical_type = 'Action Button'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(bookmarks, 1);
    assert_eq!(texts, 0);

    let footprint: f64 = conn
        .query_row(
            "SELECT avg_footprint FROM pbi_visual_type_summary \
             WHERE canonical_type = 'Bar Chart'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(footprint, 640.0 * 480.0);
}

#[test]
fn test_model_overview_lists_every_category() {
    let mut projector = setup_projector();
    projector.project(&sample_model(), &sample_bundle()).unwrap();

    let conn = projector.connection();
    let mut stmt = conn
        .prepare("SELECT category, row_count FROM pbi_model_overview")
        .unwrap();
    let counts: BTreeMap<String, i64> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(counts.len(), 7);
    assert_eq!(counts["pages"], 3);
    assert_eq!(counts["visuals"], 3);
    assert_eq!(counts["custom_visuals"], 2);
    assert_eq!(counts["measures"], 2);
    assert_eq!(counts["calculated_columns"], 1);
    assert_eq!(counts["relationships"], 2);
    assert_eq!(counts["source_queries"], 2);
}

// =============================================================================
// Transaction Semantics
// =============================================================================

#[test]
fn test_failed_projection_rolls_back() {
    let mut projector = setup_projector();
    // Sabotage a table written late in the projection; pages written
    // earlier in the same transaction must not survive the failure.
    projector
        .connection()
        .execute_batch("DROP TABLE pbi_source_queries;")
        .unwrap();

    let result = projector.project(&sample_model(), &sample_bundle());
    assert!(result.is_err());

    let page_count: i64 = projector
        .connection()
        .query_row("SELECT COUNT(*) FROM pbi_pages", [], |row| row.get(0))
        .unwrap();
    assert_eq!(page_count, 0);
}

#[test]
fn test_failed_projection_preserves_prior_state() {
    let mut projector = setup_projector();
    projector
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    projector
        .connection()
        .execute_batch("DROP TABLE pbi_measures;")
        .unwrap();

    let mut changed = sample_model();
    changed.pages[0].ordinal = 99;
    assert!(projector.project(&changed, &sample_bundle()).is_err());

    // The store still reflects the earlier successful projection.
    let ordinal: i64 = projector
        .connection()
        .query_row(
            "SELECT ordinal FROM pbi_pages WHERE page_id = 'ReportSection1'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(ordinal, 0);
}

// =============================================================================
// Store Management
// =============================================================================

#[test]
fn test_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("report.db");

    {
        let conn = Connection::open(&db_path).unwrap();
        let mut projector = Projector::new(conn, "pbi_").unwrap();
        projector.up().unwrap();
        projector.project(&sample_model(), &sample_bundle()).unwrap();
    }

    let conn = Connection::open(&db_path).unwrap();
    let projector = Projector::new(conn, "pbi_").unwrap();
    let status = projector.status().unwrap();
    assert!(status.tables_exist);
    assert!(status.views_exist);
    assert_eq!(status.page_count, 3);
    assert_eq!(status.measure_count, 2);
}

#[test]
fn test_prefixes_isolate_stores() {
    let conn = Connection::open_in_memory().unwrap();
    let mut first = Projector::new(conn, "run1_").unwrap();
    first.up().unwrap();
    first
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    let mut second = Projector::new(first.into_connection(), "run2_").unwrap();
    second.up().unwrap();
    let status = second.status().unwrap();
    assert!(status.tables_exist);
    assert_eq!(status.page_count, 0);
}

#[test]
fn test_down_then_status_reports_missing() {
    let mut projector = setup_projector();
    projector
        .project(&sample_model(), &DataModelBundle::default())
        .unwrap();

    projector.down().unwrap();
    let status = projector.status().unwrap();
    assert!(!status.tables_exist);
    assert_eq!(status.total_rows(), 0);
}
