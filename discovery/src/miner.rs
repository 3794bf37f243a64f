//! Structural mining over parsed layout documents.
//!
//! Layout members carry deeply nested JSON whose shape varies by
//! producing-application version and has no published schema. Instead of
//! deserializing into fixed types, this module walks the document and applies
//! structural predicates to every map node: a node that *looks like* a page,
//! a visual, or a filter list is collected as a candidate, tagged with the
//! path where it was found.
//!
//! The traversal never stops at a match: a matching node's children are
//! still searched, so nested report sections and duplicated structures are
//! all captured. Over-collection is the contract here; the assembler merges
//! and de-duplicates later. Each call returns its own findings, concatenated
//! by the caller, so member analyses share no mutable state.

use pbix_extract_core::{Filter, Page};
use serde_json::Value;

/// Keys whose list (or map) value holds report pages.
const PAGE_LIST_KEYS: &[&str] = &["pages", "reportPages", "sections", "Pages", "ReportPages"];

/// Keys that identify a map node as page-like when a visual container is
/// also present.
const PAGE_IDENTITY_KEYS: &[&str] = &["name", "displayName", "ordinal", "width", "height"];

/// Keys whose list value holds child visual records.
pub(crate) const VISUAL_CONTAINER_KEYS: &[&str] = &["visualContainers", "visuals", "visualizations"];

/// Keys that identify a map node as visual-like on their own.
const VISUAL_MARKER_KEYS: &[&str] = &["visualType", "singleVisual", "config"];

/// A page-like node found during mining.
///
/// Carries the parsed identity fields alongside the raw payload; the raw
/// payload is what the page–visual resolver inspects for container-id
/// matches.
#[derive(Debug, Clone)]
pub struct PageCandidate {
    /// Structural path of the node (e.g., `sections[0]`).
    pub path: String,
    /// Identity fields parsed out of the payload.
    pub page: Page,
    /// The raw node, preserved for resolution.
    pub payload: Value,
}

/// A visual-like node found during mining, not yet classified.
#[derive(Debug, Clone)]
pub struct VisualCandidate {
    /// Structural path of the node (e.g., `sections[0].visualContainers[2]`).
    pub path: String,
    /// The raw node.
    pub payload: Value,
}

/// Finds every page-like structure in the document.
///
/// A map node is a page candidate when it sits under a recognized page-list
/// key, or when it carries a page-identity key together with a list-valued
/// visual-container key.
///
/// # Examples
///
/// ```
/// use pbix_extract_discovery::miner::find_pages;
///
/// let doc = serde_json::json!({
///     "sections": [
///         {"name": "ReportSection1", "ordinal": 0, "visualContainers": []},
///         {"name": "ReportSection2", "ordinal": 1, "visualContainers": []}
///     ]
/// });
/// let pages = find_pages(&doc);
/// assert_eq!(pages.len(), 2);
/// assert_eq!(pages[0].page.name, "ReportSection1");
/// assert_eq!(pages[0].path, "sections[0]");
/// ```
pub fn find_pages(doc: &Value) -> Vec<PageCandidate> {
    collect_pages(doc, "", false)
}

fn collect_pages(node: &Value, path: &str, under_page_list: bool) -> Vec<PageCandidate> {
    let mut found = Vec::new();
    match node {
        Value::Object(map) => {
            if under_page_list || looks_like_page(node) {
                found.push(PageCandidate {
                    path: path.to_string(),
                    page: parse_page(node, path),
                    payload: node.clone(),
                });
            }
            for (key, value) in map {
                let child_path = join_key(path, key);
                let child_under_list = PAGE_LIST_KEYS.contains(&key.as_str());
                found.extend(collect_pages(value, &child_path, child_under_list));
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let child_path = format!("{path}[{index}]");
                found.extend(collect_pages(item, &child_path, under_page_list));
            }
        }
        _ => {}
    }
    found
}

fn looks_like_page(node: &Value) -> bool {
    let Value::Object(map) = node else {
        return false;
    };
    let has_identity = PAGE_IDENTITY_KEYS.iter().any(|key| map.contains_key(*key));
    let has_container = VISUAL_CONTAINER_KEYS
        .iter()
        .any(|key| map.get(*key).is_some_and(Value::is_array));
    has_identity && has_container
}

/// Parses page identity fields out of a raw page node.
///
/// Absent fields take the entity defaults: ordinal 0, zero dimensions,
/// visible. The node's own list-valued `filters` key becomes the page's
/// filter set; string-valued filters stay opaque inside the payload.
fn parse_page(node: &Value, path: &str) -> Page {
    let name = string_field(node, "name")
        .or_else(|| string_field(node, "displayName"))
        .unwrap_or_else(|| "Unknown Page".to_string());

    let mut page = Page::new(&name);
    page.display_name = string_field(node, "displayName");
    page.ordinal = node.get("ordinal").and_then(Value::as_i64).unwrap_or(0);
    page.width = node.get("width").and_then(Value::as_f64).unwrap_or(0.0);
    page.height = node.get("height").and_then(Value::as_f64).unwrap_or(0.0);
    page.visible = parse_visibility(node.get("visibility"));
    page.background = node.get("background").cloned().filter(|v| !v.is_null());

    if let Some(Value::Array(filters)) = node.get("filters") {
        page.filters = filters
            .iter()
            .map(|payload| Filter::new(path, payload.clone()))
            .collect();
    }

    page
}

/// Interprets the producing application's visibility field.
///
/// Absent means visible. Numeric encodings use 0 for visible; string
/// encodings name the hidden states.
fn parse_visibility(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_i64() == Some(0),
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            !s.eq_ignore_ascii_case("hidden") && !s.eq_ignore_ascii_case("hiddeninviewmode")
        }
        _ => true,
    }
}

/// Finds every visual-like structure in the document.
///
/// A map node is a visual candidate when it carries a visual marker key
/// (a type indicator, a single-visual sub-object, or a serialized
/// configuration), or when it is an element of a list under a recognized
/// visual-container key.
///
/// # Examples
///
/// ```
/// use pbix_extract_discovery::miner::find_visuals;
///
/// let doc = serde_json::json!({
///     "sections": [{
///         "name": "ReportSection1",
///         "visualContainers": [
///             {"id": 1, "config": "{}"},
///             {"id": 2, "config": "{}"}
///         ]
///     }]
/// });
/// let visuals = find_visuals(&doc);
/// assert_eq!(visuals.len(), 2);
/// assert_eq!(visuals[1].path, "sections[0].visualContainers[1]");
/// ```
pub fn find_visuals(doc: &Value) -> Vec<VisualCandidate> {
    collect_visuals(doc, "", false)
}

fn collect_visuals(node: &Value, path: &str, member_of_container: bool) -> Vec<VisualCandidate> {
    let mut found = Vec::new();
    match node {
        Value::Object(map) => {
            if member_of_container || looks_like_visual(map) {
                found.push(VisualCandidate {
                    path: path.to_string(),
                    payload: node.clone(),
                });
            }
            for (key, value) in map {
                // Configuration carriers belong to the visual that holds
                // them; their internals are the classifier's input, not
                // independent structure. Skipping them keeps an inline
                // object configuration equivalent to its string-encoded
                // form.
                if key == "config" || key == "properties" {
                    continue;
                }
                let child_path = join_key(path, key);
                let child_in_container = VISUAL_CONTAINER_KEYS.contains(&key.as_str());
                found.extend(collect_visuals(value, &child_path, child_in_container));
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let child_path = format!("{path}[{index}]");
                found.extend(collect_visuals(item, &child_path, member_of_container));
            }
        }
        _ => {}
    }
    found
}

fn looks_like_visual(map: &serde_json::Map<String, Value>) -> bool {
    VISUAL_MARKER_KEYS.iter().any(|key| map.contains_key(*key))
}

/// Finds every filter record in the document.
///
/// A map node with a list-valued `filters` key contributes one record per
/// list element, tagged with the owning node's path. Non-list `filters`
/// values (the producing application sometimes double-encodes them as
/// strings) are left opaque.
///
/// # Examples
///
/// ```
/// use pbix_extract_discovery::miner::find_filters;
///
/// let doc = serde_json::json!({
///     "sections": [{
///         "name": "ReportSection1",
///         "visualContainers": [],
///         "filters": [{"field": "Region"}]
///     }]
/// });
/// let filters = find_filters(&doc);
/// assert_eq!(filters.len(), 1);
/// assert_eq!(filters[0].path, "sections[0]");
/// ```
pub fn find_filters(doc: &Value) -> Vec<Filter> {
    collect_filters(doc, "")
}

fn collect_filters(node: &Value, path: &str) -> Vec<Filter> {
    let mut found = Vec::new();
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                if key == "filters" {
                    if let Value::Array(items) = value {
                        found.extend(
                            items
                                .iter()
                                .map(|payload| Filter::new(path, payload.clone())),
                        );
                        // Elements are consumed; do not rediscover them below.
                        continue;
                    }
                }
                found.extend(collect_filters(value, &join_key(path, key)));
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                found.extend(collect_filters(item, &format!("{path}[{index}]")));
            }
        }
        _ => {}
    }
    found
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}
