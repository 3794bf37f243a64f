//! Page–visual resolution.
//!
//! Mining finds pages and visuals independently; nothing in the layout
//! format ties a visual to its page reliably. Resolution applies an ordered
//! fallback chain, most trustworthy first:
//!
//! 1. container identity — the visual's id appears in a page's own
//!    visual-container list;
//! 2. positional — the visual's discovery path names a section index that a
//!    mined page exists for;
//! 3. first page — the conventional home for anything else.
//!
//! Only an empty page set leaves a visual [`Unresolved`]. Every strategy is
//! a pure function, so resolution is deterministic for identical inputs.
//!
//! [`Unresolved`]: PageAssignment::Unresolved

use std::sync::LazyLock;

use pbix_extract_core::Visual;
use regex::Regex;
use serde_json::Value;

use crate::miner::{PageCandidate, VISUAL_CONTAINER_KEYS};

/// Outcome of resolving one visual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAssignment {
    /// The visual belongs to the named page.
    Resolved(String),
    /// No strategy applied; only possible when no pages were mined.
    Unresolved,
}

impl PageAssignment {
    /// Returns the resolved page name, if any.
    pub fn page_name(&self) -> Option<&str> {
        match self {
            PageAssignment::Resolved(name) => Some(name),
            PageAssignment::Unresolved => None,
        }
    }
}

/// Resolves the owning page for one visual.
///
/// # Examples
///
/// ```
/// use pbix_extract_core::Visual;
/// use pbix_extract_discovery::miner::find_pages;
/// use pbix_extract_discovery::resolver::{PageAssignment, resolve_visual_page};
///
/// let doc = serde_json::json!({
///     "sections": [{"name": "ReportSection1", "visualContainers": [{"id": 7}]}]
/// });
/// let pages = find_pages(&doc);
///
/// let visual = Visual::new("7", "barChart", "Bar Chart");
/// let assignment = resolve_visual_page(&visual, &pages);
/// assert_eq!(assignment, PageAssignment::Resolved("ReportSection1".into()));
/// ```
pub fn resolve_visual_page(visual: &Visual, pages: &[PageCandidate]) -> PageAssignment {
    if let Some(name) = by_container_identity(visual, pages) {
        return PageAssignment::Resolved(name);
    }
    if let Some(name) = by_section_index(&visual.discovery_path, pages) {
        return PageAssignment::Resolved(name);
    }
    match pages.first() {
        Some(candidate) => PageAssignment::Resolved(candidate.page.name.clone()),
        None => PageAssignment::Unresolved,
    }
}

/// Strategy 1: the visual's id matches a container entry in a page's own
/// container list. Ids are compared stringified, since the source mixes
/// numeric and string identities.
fn by_container_identity(visual: &Visual, pages: &[PageCandidate]) -> Option<String> {
    for candidate in pages {
        for key in VISUAL_CONTAINER_KEYS {
            let Some(containers) = candidate.payload.get(*key).and_then(Value::as_array) else {
                continue;
            };
            let matched = containers.iter().any(|container| {
                identity(container.get("id")).as_deref() == Some(&visual.id)
                    || identity(container.get("name")).as_deref() == Some(&visual.id)
            });
            if matched {
                return Some(candidate.page.name.clone());
            }
        }
    }
    None
}

/// Strategy 2: a section index in the discovery path.
///
/// Index 0 means the first mined page regardless of count; indexes 1–3 are
/// honored when that many pages exist. Higher indexes are not trusted, as
/// deeply nested paths repeat section markers from unrelated structures.
fn by_section_index(path: &str, pages: &[PageCandidate]) -> Option<String> {
    static SECTION_INDEX_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"sections\[(\d+)\]").expect("static regex must compile"));

    let captures = SECTION_INDEX_RE.captures(path)?;
    let index: usize = captures[1].parse().ok()?;
    match index {
        0 => pages.first().map(|c| c.page.name.clone()),
        1..=3 if pages.len() > index => Some(pages[index].page.name.clone()),
        _ => None,
    }
}

fn identity(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
