//! Store lifecycle and transactional projection.
//!
//! Provides [`Projector`] for creating and dropping the prefixed table set,
//! projecting a canonical model (plus the external data-model bundle) into
//! it, and querying store status. All mutation operations use transactions:
//! a projection either lands completely or leaves the store in its prior
//! state.
//!
//! # Example
//!
//! ```no_run
//! use pbix_extract_core::UiModel;
//! use pbix_extract_datamodel::DataModelBundle;
//! use pbix_extract_sqlite::Projector;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("report.db").unwrap();
//! let mut projector = Projector::new(conn, "pbi_").unwrap();
//!
//! // Create tables and views
//! projector.up().unwrap();
//!
//! // Project a model
//! let model = UiModel::default();
//! let bundle = DataModelBundle::default();
//! let report = projector.project(&model, &bundle).unwrap();
//! println!("{} rows written", report.total());
//!
//! // Check status
//! let status = projector.status().unwrap();
//! assert!(status.tables_exist);
//! ```

use pbix_extract_core::UiModel;
use pbix_extract_datamodel::DataModelBundle;
use rusqlite::Connection;

use crate::convert;
use crate::error::{Result, SqliteError};
use crate::schema::{generate_drop_sql, generate_schema_sql, validate_prefix};

/// Names of the derived views, checked by [`Projector::status`].
const VIEW_SUFFIXES: [&str; 3] = ["page_summary", "visual_type_summary", "model_overview"];

/// Manages the lifecycle of the projected store.
///
/// Provides operations to create the table set ([`up`](Self::up)), drop it
/// ([`down`](Self::down)), project a run's results into it
/// ([`project`](Self::project)), and inspect the current store state
/// ([`status`](Self::status)).
///
/// All writes for one projection execute inside a single transaction. A
/// failure partway rolls the transaction back, so the store keeps whatever
/// state the previous successful projection left.
pub struct Projector {
    conn: Connection,
    prefix: String,
}

impl Projector {
    /// Creates a projector for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains
    /// invalid characters.
    pub fn new(conn: Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { conn, prefix })
    }

    /// Creates all store tables, indexes, and views.
    ///
    /// Uses `IF NOT EXISTS` statements so it is safe to call repeatedly.
    /// Executes within a transaction for atomicity.
    pub fn up(&mut self) -> Result<()> {
        let sql = generate_schema_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::ProjectionError(format!("failed to create store: {e}")))?;
        tx.commit()?;
        Ok(())
    }

    /// Drops all store views and tables.
    ///
    /// Uses `IF EXISTS` statements so it is safe to call even when the
    /// store was never created. Executes within a transaction for atomicity.
    pub fn down(&mut self) -> Result<()> {
        let sql = generate_drop_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::ProjectionError(format!("failed to drop store: {e}")))?;
        tx.commit()?;
        Ok(())
    }

    /// Projects a canonical model and data-model bundle into the store.
    ///
    /// Every row is written with `INSERT OR REPLACE` keyed by natural
    /// identity, so re-projecting the same model is a no-op for row counts.
    /// All writes execute inside a single transaction; any failure rolls
    /// the whole projection back.
    ///
    /// Requires the store to exist; call [`up`](Self::up) first.
    pub fn project(&mut self, model: &UiModel, bundle: &DataModelBundle) -> Result<ProjectionReport> {
        // An early return drops the open transaction, which rolls back.
        let tx = self.conn.transaction()?;
        let mut report = ProjectionReport::default();

        for page in &model.pages {
            convert::replace_page(&tx, &self.prefix, page)?;
            report.pages_written += 1;
        }

        for visual in &model.visuals {
            convert::replace_visual(&tx, &self.prefix, visual)?;
            report.visuals_written += 1;
        }

        for descriptor in &model.custom_visuals {
            convert::replace_custom_visual(&tx, &self.prefix, descriptor)?;
            report.custom_visuals_written += 1;
        }

        for measure in &bundle.measures {
            convert::replace_measure(&tx, &self.prefix, measure)?;
            report.measures_written += 1;
        }

        for column in &bundle.calculated_columns {
            convert::replace_calculated_column(&tx, &self.prefix, column)?;
            report.calculated_columns_written += 1;
        }

        for relationship in &bundle.relationships {
            convert::replace_relationship(&tx, &self.prefix, relationship)?;
            report.relationships_written += 1;
        }

        for query in &bundle.source_queries {
            convert::replace_source_query(&tx, &self.prefix, query)?;
            report.source_queries_written += 1;
        }

        tx.commit()?;
        Ok(report)
    }

    /// Returns the current state of the store.
    ///
    /// Reports whether the tables and views exist and how many rows each
    /// entity table holds.
    pub fn status(&self) -> Result<StoreStatus> {
        let tables_exist = self.tables_exist()?;

        if !tables_exist {
            return Ok(StoreStatus::default());
        }

        Ok(StoreStatus {
            tables_exist,
            views_exist: self.views_exist()?,
            page_count: self.count_rows("pages")?,
            visual_count: self.count_rows("visuals")?,
            custom_visual_count: self.count_rows("custom_visuals")?,
            measure_count: self.count_rows("measures")?,
            calculated_column_count: self.count_rows("calculated_columns")?,
            relationship_count: self.count_rows("relationships")?,
            source_query_count: self.count_rows("source_queries")?,
        })
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the projector and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Checks whether the pages table exists.
    fn tables_exist(&self) -> Result<bool> {
        let table_name = format!("{}pages", self.prefix);
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
        let count: i64 = stmt.query_row([&table_name], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Checks whether all derived views exist.
    fn views_exist(&self) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='view' AND name=?1")?;
        for suffix in VIEW_SUFFIXES {
            let view_name = format!("{}{}", self.prefix, suffix);
            let count: i64 = stmt.query_row([&view_name], |row| row.get(0))?;
            if count == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Counts rows in a prefixed table.
    fn count_rows(&self, table: &str) -> Result<usize> {
        let full_table = format!("{}{}", self.prefix, table);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT COUNT(*) FROM {full_table}"))?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Snapshot of the projected store's state.
///
/// Returned by [`Projector::status`]; the basis of the `status` subcommand
/// and the post-projection summary block.
#[derive(Debug, Clone, Default)]
pub struct StoreStatus {
    /// Whether the entity tables exist in the database.
    pub tables_exist: bool,
    /// Whether all derived views exist.
    pub views_exist: bool,
    /// Number of page rows.
    pub page_count: usize,
    /// Number of visual rows.
    pub visual_count: usize,
    /// Number of custom-visual rows.
    pub custom_visual_count: usize,
    /// Number of DAX measure rows.
    pub measure_count: usize,
    /// Number of calculated-column rows.
    pub calculated_column_count: usize,
    /// Number of relationship rows.
    pub relationship_count: usize,
    /// Number of source-query rows.
    pub source_query_count: usize,
}

impl StoreStatus {
    /// Total rows across all entity tables.
    pub fn total_rows(&self) -> usize {
        self.page_count
            + self.visual_count
            + self.custom_visual_count
            + self.measure_count
            + self.calculated_column_count
            + self.relationship_count
            + self.source_query_count
    }

    /// Per-category row counts, in a fixed reporting order.
    pub fn category_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("pages", self.page_count),
            ("visuals", self.visual_count),
            ("custom_visuals", self.custom_visual_count),
            ("measures", self.measure_count),
            ("calculated_columns", self.calculated_column_count),
            ("relationships", self.relationship_count),
            ("source_queries", self.source_query_count),
        ]
    }
}

/// Row counts written by one projection.
///
/// Returned by [`Projector::project`]. Counts reflect write statements
/// issued, not net new rows; replaced rows count the same as inserts.
#[derive(Debug, Clone, Default)]
pub struct ProjectionReport {
    /// Number of page rows written.
    pub pages_written: usize,
    /// Number of visual rows written.
    pub visuals_written: usize,
    /// Number of custom-visual rows written.
    pub custom_visuals_written: usize,
    /// Number of measure rows written.
    pub measures_written: usize,
    /// Number of calculated-column rows written.
    pub calculated_columns_written: usize,
    /// Number of relationship rows written.
    pub relationships_written: usize,
    /// Number of source-query rows written.
    pub source_queries_written: usize,
}

impl ProjectionReport {
    /// Total rows written across all tables.
    pub fn total(&self) -> usize {
        self.pages_written
            + self.visuals_written
            + self.custom_visuals_written
            + self.measures_written
            + self.calculated_columns_written
            + self.relationships_written
            + self.source_queries_written
    }
}
