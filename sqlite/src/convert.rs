//! Conversion from canonical-model values to SQLite rows.
//!
//! Handles writing pages, visuals, custom-visual descriptors, and
//! data-model bundle rows into the prefixed tables. Every write is an
//! `INSERT OR REPLACE` keyed by the row's natural identity, so projecting
//! the same model twice leaves the store byte-for-byte unchanged.
//!
//! # Internal API
//!
//! Functions here operate on a borrowed connection (typically the open
//! projection transaction) and are driven by
//! [`Projector::project`](crate::Projector::project); the module is not
//! exposed outside the crate.

use pbix_extract_core::{CustomVisualDescriptor, Page, Visual};
use pbix_extract_datamodel::{
    CalculatedColumn, Measure, Relationship, SourceQuery, classify_source_expression,
};
use rusqlite::{Connection, params};

use crate::error::Result;

/// Serializes an optional opaque payload to JSON text; `None` stays NULL.
pub(crate) fn json_or_null(value: Option<&serde_json::Value>) -> Result<Option<String>> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

/// Writes a page row keyed by its internal name.
///
/// The opaque background payload and the page's filter records are stored
/// as JSON text; both stay NULL when absent.
pub fn replace_page(conn: &Connection, prefix: &str, page: &Page) -> Result<()> {
    let background = json_or_null(page.background.as_ref())?;
    let filters = if page.filters.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&page.filters)?)
    };

    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {prefix}pages \
             (page_id, page_name, ordinal, width, height, is_visible, visual_count, background_config, filters_config) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        params![
            page.name,
            page.display_label(),
            page.ordinal,
            page.width,
            page.height,
            page.visible as i32,
            page.visual_ids.len() as i64,
            background,
            filters,
        ],
    )?;
    Ok(())
}

/// Writes a visual row keyed by (visual id, page id).
///
/// Unresolved visuals carry an empty page id so the composite key stays
/// total; they drop out of page joins but still count in the per-type view.
pub fn replace_visual(conn: &Connection, prefix: &str, visual: &Visual) -> Result<()> {
    let data_roles = if visual.data_roles.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&visual.data_roles)?)
    };

    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {prefix}visuals \
             (visual_id, page_id, visual_type, canonical_type, \
              x_position, y_position, width, height, z_order, \
              data_roles_count, data_roles_json, text_content, bookmark_action, \
              config_size, discovery_path) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            visual.id,
            visual.page.as_deref().unwrap_or(""),
            visual.raw_type,
            visual.canonical_type,
            visual.geometry.x,
            visual.geometry.y,
            visual.geometry.width,
            visual.geometry.height,
            visual.geometry.z,
            visual.data_roles.len() as i64,
            data_roles,
            visual.text_content,
            visual.bookmark_target,
            visual.config_size as i64,
            visual.discovery_path,
        ],
    )?;
    Ok(())
}

/// Writes a custom-visual row keyed by its container member path.
pub fn replace_custom_visual(
    conn: &Connection,
    prefix: &str,
    descriptor: &CustomVisualDescriptor,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {prefix}custom_visuals \
             (member_path, visual_name, visual_version, payload_size, parse_failed) \
             VALUES (?1, ?2, ?3, ?4, ?5)"
        ),
        params![
            descriptor.member_path,
            descriptor.name,
            descriptor.version,
            descriptor.size as i64,
            descriptor.parse_failed as i32,
        ],
    )?;
    Ok(())
}

/// Writes a DAX measure row keyed by (table, measure name).
pub fn replace_measure(conn: &Connection, prefix: &str, measure: &Measure) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {prefix}measures \
             (table_name, measure_name, expression, description) \
             VALUES (?1, ?2, ?3, ?4)"
        ),
        params![
            measure.table,
            measure.name,
            measure.expression,
            measure.description,
        ],
    )?;
    Ok(())
}

/// Writes a calculated-column row keyed by (table, column name).
pub fn replace_calculated_column(
    conn: &Connection,
    prefix: &str,
    column: &CalculatedColumn,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {prefix}calculated_columns \
             (table_name, column_name, expression, data_type) \
             VALUES (?1, ?2, ?3, ?4)"
        ),
        params![column.table, column.column, column.expression, column.data_type],
    )?;
    Ok(())
}

/// Writes a relationship row keyed by its endpoint quadruple.
pub fn replace_relationship(
    conn: &Connection,
    prefix: &str,
    relationship: &Relationship,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {prefix}relationships \
             (from_table, from_column, to_table, to_column, cardinality, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ),
        params![
            relationship.from_table,
            relationship.from_column,
            relationship.to_table,
            relationship.to_column,
            relationship.cardinality,
            relationship.is_active as i32,
        ],
    )?;
    Ok(())
}

/// Writes a source-query row keyed by query name.
///
/// The stored `source_type` is derived from the M expression's connector
/// fingerprint at write time.
pub fn replace_source_query(conn: &Connection, prefix: &str, query: &SourceQuery) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {prefix}source_queries \
             (query_name, expression, source_type) \
             VALUES (?1, ?2, ?3)"
        ),
        params![
            query.name,
            query.expression,
            classify_source_expression(&query.expression),
        ],
    )?;
    Ok(())
}
