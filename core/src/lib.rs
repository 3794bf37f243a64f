//! Canonical model types and shared primitives for Power BI report
//! extraction.
//!
//! This crate defines the foundational types the extraction pipeline
//! produces and the relational projector consumes:
//!
//! - [`UiModel`] — the unified canonical model for one extraction run
//!   (pages, visuals, filters, bookmarks, custom visuals, aggregates).
//! - [`Page`] / [`Visual`] / [`Filter`] / [`Bookmark`] /
//!   [`CustomVisualDescriptor`] — the extracted UI entities.
//! - [`ExtractionRun`] — per-run metadata: source identity, timestamp,
//!   entity counts, consumed members, and the issue log.
//! - [`IssueKind`] / [`RunIssue`] — the recoverable-failure taxonomy.
//! - [`canonical_visual_type`] — the raw-code → canonical-name vocabulary.
//!
//! Validation ([`validate_model`]) catches structural errors such as
//! duplicate page ordinals, duplicate visual ids, and dangling references.
//! Violations are reported, never silently repaired, since the source format
//! enforces none of these invariants.
//!
//! # Example
//!
//! ```
//! use pbix_extract_core::*;
//!
//! // Assemble a tiny model by hand
//! let mut model = UiModel::default();
//! model.model_version = Some(MODEL_CONTRACT_VERSION.into());
//! model.pages.push(
//!     Page::new("ReportSection1")
//!         .with_display_name("Overview")
//!         .with_dimensions(1280.0, 720.0),
//! );
//! let mut chart = Visual::new("vc1", "barChart", &canonical_visual_type("barChart"));
//! chart.page = Some("ReportSection1".into());
//! chart.data_roles.push(DataRoleBinding::new("Category", "Sales.Category"));
//! model.visuals.push(chart);
//!
//! assert_eq!(model.visuals[0].canonical_type, "Bar Chart");
//! assert!(validate_model(&model).is_empty());
//! ```

mod issue;
mod model;
mod validate;
mod vocabulary;

pub use issue::{IssueKind, RunIssue};
pub use model::*;
pub use validate::{ValidationError, validate_model};
pub use vocabulary::{
    UNKNOWN_VISUAL_TYPE, canonical_visual_type, is_stock_visual_type, title_case_code,
};
