//! Data-model companion types for report UI extraction.
//!
//! The UI pipeline reads pages and visuals itself; the tabular data model
//! (tables, measures, relationships, source queries) comes from an external
//! collaborator. This crate defines the typed bundle those results arrive in,
//! the provider seam the collaborator plugs into, and the pipeline
//! configuration shared by extraction and projection.
//!
//! # Quick start
//!
//! ```no_run
//! use pbix_extract_datamodel::{DataModelBundle, classify_source_expression, collect_bundle};
//!
//! // Load a previously exported bundle
//! let bundle = DataModelBundle::from_path("model.json").unwrap();
//! for query in &bundle.source_queries {
//!     println!("{}: {}", query.name, classify_source_expression(&query.expression));
//! }
//!
//! // Or drive any provider, tolerating per-category failures
//! let (bundle, issues) = collect_bundle(&DataModelBundle::default());
//! assert!(issues.is_empty());
//! # let _ = bundle;
//! ```

mod bundle;
mod config;
mod error;
mod provider;
mod source_type;

pub use bundle::{
    CalculatedColumn, CalculatedTable, DataModelBundle, Measure, Relationship, SourceQuery,
    TableInfo,
};
pub use config::{ExtractionSettings, PipelineConfig, ProjectionSettings};
pub use error::{DataModelError, Result};
pub use provider::{DataModelProvider, collect_bundle};
pub use source_type::classify_source_expression;
