//! Canonical model validation.
//!
//! Validates structural invariants of an assembled [`UiModel`]: page identity
//! uniqueness, ordinal collisions, visual identity, and referential
//! integrity between visuals, pages, and bookmarks. Violations are reported,
//! never repaired: the source format does not enforce these invariants, so
//! downstream consumers decide how to react.
//!
//! # Examples
//!
//! ```
//! use pbix_extract_core::*;
//!
//! let mut model = UiModel::default();
//! model.pages.push(Page::new("ReportSection1"));
//! model.visuals.push(Visual::new("vc1", "barChart", "Bar Chart"));
//! assert!(validate_model(&model).is_empty());
//!
//! // A visual pointing at a page the model does not contain
//! let mut broken = UiModel::default();
//! let mut visual = Visual::new("vc1", "barChart", "Bar Chart");
//! visual.page = Some("ReportSection9".into());
//! broken.visuals.push(visual);
//! assert!(!validate_model(&broken).is_empty());
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::UiModel;

/// Canonical model validation errors.
///
/// Each variant describes a specific structural problem found during
/// validation. The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A page has an empty or whitespace-only name.
    #[error("page name cannot be empty")]
    EmptyPageName,
    /// Two pages share the same identity key.
    #[error("duplicate page in model: {0}")]
    DuplicatePage(String),
    /// Two distinct pages declare the same ordinal.
    #[error("duplicate page ordinal {ordinal}: {first} and {second}")]
    DuplicateOrdinal {
        ordinal: i64,
        first: String,
        second: String,
    },
    /// A visual has an empty id.
    #[error("visual id cannot be empty (path: {0})")]
    EmptyVisualId(String),
    /// Two visuals on the same page share an id.
    #[error("duplicate visual id on page {page}: {id}")]
    DuplicateVisual { page: String, id: String },
    /// A visual references a page the model does not contain.
    #[error("visual {visual} references unknown page: {page}")]
    UnknownPageRef { visual: String, page: String },
    /// A bookmark references a visual the model does not contain.
    #[error("bookmark {target} references unknown visual: {visual}")]
    UnknownBookmarkVisual { target: String, visual: String },
}

/// Validates an assembled canonical model.
///
/// Returns every violation found; an empty vector means the model satisfies
/// all structural invariants. Duplicate ordinals are a violation of the
/// page-ordinal uniqueness invariant but are common in real containers, so
/// callers typically downgrade them to run issues rather than failing.
pub fn validate_model(model: &UiModel) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_pages: HashSet<&str> = HashSet::new();
    let mut ordinals: HashMap<i64, &str> = HashMap::new();
    for page in &model.pages {
        let name = page.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyPageName);
            continue;
        }
        if !seen_pages.insert(name) {
            errors.push(ValidationError::DuplicatePage(name.to_string()));
        }
        if let Some(first) = ordinals.insert(page.ordinal, name) {
            errors.push(ValidationError::DuplicateOrdinal {
                ordinal: page.ordinal,
                first: first.to_string(),
                second: name.to_string(),
            });
        }
    }

    let mut seen_visuals: HashSet<(&str, &str)> = HashSet::new();
    let mut visual_ids: HashSet<&str> = HashSet::new();
    for visual in &model.visuals {
        if visual.id.trim().is_empty() {
            errors.push(ValidationError::EmptyVisualId(
                visual.discovery_path.clone(),
            ));
            continue;
        }
        visual_ids.insert(visual.id.as_str());

        let page = visual.page.as_deref().unwrap_or("");
        if !seen_visuals.insert((page, visual.id.as_str())) {
            errors.push(ValidationError::DuplicateVisual {
                page: page.to_string(),
                id: visual.id.clone(),
            });
        }
        if let Some(page_name) = visual.page.as_deref() {
            if model.find_page(page_name).is_none() {
                errors.push(ValidationError::UnknownPageRef {
                    visual: visual.id.clone(),
                    page: page_name.to_string(),
                });
            }
        }
    }

    for bookmark in &model.bookmarks {
        if !visual_ids.contains(bookmark.visual_id.as_str()) {
            errors.push(ValidationError::UnknownBookmarkVisual {
                target: bookmark.target.clone(),
                visual: bookmark.visual_id.clone(),
            });
        }
    }

    errors
}
