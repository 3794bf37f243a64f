//! Report UI discovery and extraction.
//!
//! This crate turns an undocumented report container into a canonical
//! [`UiModel`]: it mines layout JSON for page/visual/filter structures,
//! classifies visuals and extracts their data bindings, resolves visuals
//! onto pages, and assembles the merged model with a full issue log.
//!
//! # Main entry points
//!
//! - [`extract_ui_model`] — open a container file and extract its model in
//!   one call.
//! - [`pipeline::UiExtractor`] — the same pipeline with control over the
//!   source (in-memory bytes) and parallelism.
//! - [`analyze_layout_document`] — mine, classify, and resolve one
//!   already-parsed layout document without touching a container.
//!
//! # Example
//!
//! ```
//! use pbix_extract_container::ArchiveBuilder;
//! use pbix_extract_discovery::pipeline::UiExtractor;
//!
//! let layout = serde_json::json!({
//!     "sections": [{
//!         "name": "ReportSection1",
//!         "ordinal": 0,
//!         "visualContainers": [{
//!             "id": 1, "x": 0, "y": 0, "width": 640, "height": 480,
//!             "config": "{\"singleVisual\": {\"visualType\": \"barChart\"}}"
//!         }]
//!     }]
//! });
//! let bytes: Vec<u8> = layout.to_string().encode_utf16().flat_map(u16::to_le_bytes).collect();
//! let container = ArchiveBuilder::new().stored("Report/Layout", &bytes).finish();
//!
//! let model = UiExtractor::from_bytes(container).unwrap().extract().unwrap();
//! assert_eq!(model.pages[0].name, "ReportSection1");
//! assert_eq!(model.visuals[0].canonical_type, "Bar Chart");
//! assert_eq!(model.visuals[0].page.as_deref(), Some("ReportSection1"));
//! ```
//!
//! # Crate type
//!
//! This is a **library-only crate** with no binary targets. For CLI usage,
//! use the `pbix-extract-cli` crate, which provides the `pbix-extract`
//! binary.
//!
//! [`UiModel`]: pbix_extract_core::UiModel

pub mod assembler;
pub mod classifier;
pub mod miner;
pub mod output;
pub mod pipeline;
pub mod resolver;

pub use assembler::{MemberAnalysis, assemble_model};
pub use classifier::{ClassifiedVisual, classify_visual};
pub use miner::{PageCandidate, VisualCandidate, find_filters, find_pages, find_visuals};
pub use output::{OutputFormat, clean_page_name, format_model};
pub use pipeline::{UiExtractor, analyze_layout_document, extract_ui_model};
pub use resolver::{PageAssignment, resolve_visual_page};
