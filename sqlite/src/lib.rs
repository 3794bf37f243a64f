//! SQLite projection of extracted report models.
//!
//! This crate persists the canonical UI model and the external data-model
//! bundle into prefixed relational tables, keyed by natural identity so that
//! re-projection replaces rows instead of accumulating them. Derived
//! read-only views give downstream consumers per-page and per-type
//! aggregates without touching the Rust types.
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - **`schema`** — SQL generation (tables, indexes, views) with validated
//!   table prefixes
//! - **`convert`** — canonical-model values to `INSERT OR REPLACE` rows
//! - **`projector`** — store lifecycle (up/down/status) and transactional
//!   projection
//!
//! # Quick start
//!
//! ```
//! use pbix_extract_core::{Page, UiModel};
//! use pbix_extract_datamodel::DataModelBundle;
//! use pbix_extract_sqlite::Projector;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! let mut projector = Projector::new(conn, "pbi_").unwrap();
//! projector.up().unwrap();
//!
//! let mut model = UiModel::default();
//! model.pages.push(Page::new("ReportSection1").with_display_name("Overview"));
//!
//! let report = projector.project(&model, &DataModelBundle::default()).unwrap();
//! assert_eq!(report.pages_written, 1);
//! assert_eq!(projector.status().unwrap().page_count, 1);
//! ```
//!
//! # Transaction semantics
//!
//! Every projection runs inside a single transaction. Any failure partway,
//! such as a missing table or a constraint violation, rolls the whole
//! projection back, so the store always reflects either the previous
//! successful run or the current one, never a mix.

mod convert;
mod error;
mod projector;
mod schema;

pub use error::{Result, SqliteError};
pub use projector::{ProjectionReport, Projector, StoreStatus};
