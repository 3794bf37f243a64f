//! Typed rows for the data-model collaborator's output.
//!
//! Structured-data-model extraction (tables, DAX, relationships, M queries)
//! is delegated to an external library; this module only models its results
//! so they can be counted in summaries and projected into the relational
//! store. Field aliases accept the collaborator's PascalCase/camelCase
//! artifact keys alongside this crate's snake_case form.
//!
//! # Loading
//!
//! ```no_run
//! use pbix_extract_datamodel::DataModelBundle;
//!
//! let bundle = DataModelBundle::from_path("data_model.json").unwrap();
//! println!("{} measures", bundle.measures.len());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A model table (name only; column detail stays with the collaborator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    #[serde(alias = "Name", alias = "TableName")]
    pub name: String,
}

/// A calculated (DAX) measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    #[serde(alias = "TableName")]
    pub table: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Expression")]
    pub expression: String,
    #[serde(default, alias = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A calculated (DAX) column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedColumn {
    #[serde(alias = "TableName")]
    pub table: String,
    #[serde(alias = "ColumnName")]
    pub column: String,
    #[serde(alias = "Expression")]
    pub expression: String,
    #[serde(default, alias = "DataType", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// A calculated (DAX) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedTable {
    #[serde(alias = "TableName", alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Expression", skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// A relationship between two model tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(alias = "fromTable", alias = "FromTableName")]
    pub from_table: String,
    #[serde(alias = "fromColumn", alias = "FromColumnName")]
    pub from_column: String,
    #[serde(alias = "toTable", alias = "ToTableName")]
    pub to_table: String,
    #[serde(alias = "toColumn", alias = "ToColumnName")]
    pub to_column: String,
    #[serde(default, alias = "Cardinality", skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<String>,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// A transformation-query (M) source expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceQuery {
    #[serde(alias = "TableName", alias = "Name")]
    pub name: String,
    #[serde(alias = "Expression")]
    pub expression: String,
}

/// Everything the external collaborator produced for one container.
///
/// Every category may independently be empty; a report without DAX
/// measures or with an unreadable model section is still projectable.
///
/// # Examples
///
/// ```
/// use pbix_extract_datamodel::{DataModelBundle, Measure};
///
/// let mut bundle = DataModelBundle::default();
/// bundle.measures.push(Measure {
///     table: "Sales".into(),
///     name: "Total Sales".into(),
///     expression: "SUM(Sales[Amount])".into(),
///     description: None,
/// });
/// assert!(!bundle.is_empty());
/// assert_eq!(bundle.row_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataModelBundle {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<Measure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calculated_columns: Vec<CalculatedColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calculated_tables: Vec<CalculatedTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_queries: Vec<SourceQuery>,
}

impl DataModelBundle {
    /// Loads a bundle from a JSON artifact.
    ///
    /// Absent categories default to empty, so a partial artifact (or an
    /// empty object) loads cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError::IoError`](crate::DataModelError::IoError)
    /// if the file cannot be read, or
    /// [`DataModelError::JsonError`](crate::DataModelError::JsonError) if it
    /// is not valid JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Whether every category is empty.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Total rows across all categories.
    pub fn row_count(&self) -> usize {
        self.category_counts().iter().map(|(_, count)| count).sum()
    }

    /// Per-category row counts, in a fixed reporting order.
    pub fn category_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("tables", self.tables.len()),
            ("measures", self.measures.len()),
            ("calculated_columns", self.calculated_columns.len()),
            ("calculated_tables", self.calculated_tables.len()),
            ("relationships", self.relationships.len()),
            ("source_queries", self.source_queries.len()),
        ]
    }
}
