//! SQL DDL generation for the relational projection.
//!
//! Generates `CREATE TABLE` / `CREATE INDEX` / `CREATE VIEW` statements for
//! the projected store, parameterized by a table prefix. Every table is keyed
//! by natural identity rather than a surrogate row id, so repeated projection
//! of the same model replaces rows instead of accumulating them.
//!
//! Tables (with default prefix `pbi_`):
//!
//! - `pbi_pages` — one row per report page, keyed by internal page name
//! - `pbi_visuals` — one row per visual, keyed by (visual id, page id)
//! - `pbi_custom_visuals` — one row per custom-visual member, keyed by path
//! - `pbi_measures` — DAX measures, keyed by (table, measure name)
//! - `pbi_calculated_columns` — DAX columns, keyed by (table, column name)
//! - `pbi_relationships` — model relationships, keyed by endpoint quadruple
//! - `pbi_source_queries` — M source expressions, keyed by query name
//!
//! Views:
//!
//! - `pbi_page_summary` — per-page visual counts and distinct-type roster
//! - `pbi_visual_type_summary` — per-type counts, average footprint,
//!   bookmark/text presence
//! - `pbi_model_overview` — cross-entity row-count inventory

use crate::error::{Result, SqliteError};

/// Validates that a table prefix contains only safe characters.
///
/// Prefixes are interpolated directly into SQL statements, so only
/// alphanumeric characters and underscores are allowed.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Generates the complete DDL for the projected store.
///
/// All statements use `IF NOT EXISTS`, so the result can be executed
/// against a database that already carries the schema.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid
/// characters.
pub fn generate_schema_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    Ok(format!(
        r#"
CREATE TABLE IF NOT EXISTS {prefix}pages (
    page_id TEXT PRIMARY KEY,
    page_name TEXT NOT NULL,
    ordinal INTEGER NOT NULL DEFAULT 0,
    width REAL NOT NULL DEFAULT 0,
    height REAL NOT NULL DEFAULT 0,
    is_visible INTEGER NOT NULL DEFAULT 1 CHECK (is_visible IN (0, 1)),
    visual_count INTEGER NOT NULL DEFAULT 0,
    background_config TEXT,
    filters_config TEXT
);

CREATE TABLE IF NOT EXISTS {prefix}visuals (
    visual_id TEXT NOT NULL,
    page_id TEXT NOT NULL,
    visual_type TEXT NOT NULL,
    canonical_type TEXT NOT NULL,
    x_position REAL NOT NULL DEFAULT 0,
    y_position REAL NOT NULL DEFAULT 0,
    width REAL NOT NULL DEFAULT 0,
    height REAL NOT NULL DEFAULT 0,
    z_order REAL NOT NULL DEFAULT 0,
    data_roles_count INTEGER NOT NULL DEFAULT 0,
    data_roles_json TEXT,
    text_content TEXT,
    bookmark_action TEXT,
    config_size INTEGER NOT NULL DEFAULT 0,
    discovery_path TEXT,
    PRIMARY KEY (visual_id, page_id)
);

CREATE TABLE IF NOT EXISTS {prefix}custom_visuals (
    member_path TEXT PRIMARY KEY,
    visual_name TEXT,
    visual_version TEXT,
    payload_size INTEGER NOT NULL DEFAULT 0,
    parse_failed INTEGER NOT NULL DEFAULT 0 CHECK (parse_failed IN (0, 1))
);

CREATE TABLE IF NOT EXISTS {prefix}measures (
    table_name TEXT NOT NULL,
    measure_name TEXT NOT NULL,
    expression TEXT NOT NULL,
    description TEXT,
    PRIMARY KEY (table_name, measure_name)
);

CREATE TABLE IF NOT EXISTS {prefix}calculated_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    expression TEXT NOT NULL,
    data_type TEXT,
    PRIMARY KEY (table_name, column_name)
);

CREATE TABLE IF NOT EXISTS {prefix}relationships (
    from_table TEXT NOT NULL,
    from_column TEXT NOT NULL,
    to_table TEXT NOT NULL,
    to_column TEXT NOT NULL,
    cardinality TEXT,
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    PRIMARY KEY (from_table, from_column, to_table, to_column)
);

CREATE TABLE IF NOT EXISTS {prefix}source_queries (
    query_name TEXT PRIMARY KEY,
    expression TEXT NOT NULL,
    source_type TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_{prefix}pages_ordinal ON {prefix}pages(ordinal);
CREATE INDEX IF NOT EXISTS idx_{prefix}visuals_page ON {prefix}visuals(page_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}visuals_type ON {prefix}visuals(canonical_type);
CREATE INDEX IF NOT EXISTS idx_{prefix}measures_table ON {prefix}measures(table_name);
CREATE INDEX IF NOT EXISTS idx_{prefix}columns_table ON {prefix}calculated_columns(table_name);
CREATE INDEX IF NOT EXISTS idx_{prefix}relationships_from ON {prefix}relationships(from_table);

CREATE VIEW IF NOT EXISTS {prefix}page_summary AS
SELECT
    p.page_id,
    p.page_name,
    p.ordinal,
    COUNT(v.visual_id) AS visual_count,
    COUNT(DISTINCT v.canonical_type) AS distinct_visual_types,
    GROUP_CONCAT(DISTINCT v.canonical_type) AS visual_types
FROM {prefix}pages p
LEFT JOIN {prefix}visuals v ON v.page_id = p.page_id
GROUP BY p.page_id, p.page_name, p.ordinal
ORDER BY p.ordinal, p.page_id;

CREATE VIEW IF NOT EXISTS {prefix}visual_type_summary AS
SELECT
    canonical_type,
    COUNT(*) AS visual_count,
    AVG(width * height) AS avg_footprint,
    SUM(CASE WHEN bookmark_action IS NOT NULL THEN 1 ELSE 0 END) AS bookmark_count,
    SUM(CASE WHEN text_content IS NOT NULL THEN 1 ELSE 0 END) AS text_count
FROM {prefix}visuals
GROUP BY canonical_type
ORDER BY visual_count DESC, canonical_type;

CREATE VIEW IF NOT EXISTS {prefix}model_overview AS
SELECT 'pages' AS category, COUNT(*) AS row_count FROM {prefix}pages
UNION ALL SELECT 'visuals', COUNT(*) FROM {prefix}visuals
UNION ALL SELECT 'custom_visuals', COUNT(*) FROM {prefix}custom_visuals
UNION ALL SELECT 'measures', COUNT(*) FROM {prefix}measures
UNION ALL SELECT 'calculated_columns', COUNT(*) FROM {prefix}calculated_columns
UNION ALL SELECT 'relationships', COUNT(*) FROM {prefix}relationships
UNION ALL SELECT 'source_queries', COUNT(*) FROM {prefix}source_queries;
"#,
        prefix = prefix
    ))
}

/// Generates DDL to remove the projected store.
///
/// Views are dropped before the tables they read from. All statements use
/// `IF EXISTS`, so the result can be executed against a database that never
/// carried the schema.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid
/// characters.
pub fn generate_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    Ok(format!(
        r#"
DROP VIEW IF EXISTS {prefix}model_overview;
DROP VIEW IF EXISTS {prefix}visual_type_summary;
DROP VIEW IF EXISTS {prefix}page_summary;
DROP TABLE IF EXISTS {prefix}source_queries;
DROP TABLE IF EXISTS {prefix}relationships;
DROP TABLE IF EXISTS {prefix}calculated_columns;
DROP TABLE IF EXISTS {prefix}measures;
DROP TABLE IF EXISTS {prefix}custom_visuals;
DROP TABLE IF EXISTS {prefix}visuals;
DROP TABLE IF EXISTS {prefix}pages;
"#,
        prefix = prefix
    ))
}
