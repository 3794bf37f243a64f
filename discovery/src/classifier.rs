//! Visual classification and binding extraction.
//!
//! A mined visual candidate carries an opaque configuration payload that is
//! frequently double-encoded: a JSON document serialized into a JSON string
//! inside the layout document. This module normalizes that payload, then
//! derives the typed facets of a [`Visual`] from it: the canonical type,
//! data-role bindings (which appear in three different shapes across
//! producing-application versions), formatting-property groups, literal text
//! content, and bookmark links.
//!
//! Every derivation step degrades independently. A configuration that does
//! not parse yields a visual with unknown type and no derived facets, plus a
//! warning for the run's issue log; it never fails the member or the run.

use pbix_extract_core::{
    DataRoleBinding, Geometry, PropertyGroup, UNKNOWN_VISUAL_TYPE, Visual, canonical_visual_type,
};
use serde_json::Value;

use crate::miner::VisualCandidate;

/// Maximum characters of a broken configuration quoted in a warning.
const CONFIG_PREVIEW_LIMIT: usize = 200;

/// A classified visual plus any warnings raised while deriving its facets.
#[derive(Debug, Clone)]
pub struct ClassifiedVisual {
    pub visual: Visual,
    pub warnings: Vec<String>,
}

/// Classifies one mined candidate into a typed [`Visual`].
///
/// Geometry and identity come from the candidate node itself; everything
/// else comes from the configuration payload when one parses. Pure: the same
/// candidate always classifies identically.
///
/// # Examples
///
/// ```
/// use pbix_extract_discovery::classifier::classify_visual;
/// use pbix_extract_discovery::miner::VisualCandidate;
///
/// let candidate = VisualCandidate {
///     path: "sections[0].visualContainers[0]".into(),
///     payload: serde_json::json!({
///         "id": 7,
///         "x": 10, "y": 20, "width": 640, "height": 480,
///         "config": "{\"singleVisual\": {\"visualType\": \"barChart\"}}"
///     }),
/// };
///
/// let classified = classify_visual(&candidate);
/// assert_eq!(classified.visual.id, "7");
/// assert_eq!(classified.visual.canonical_type, "Bar Chart");
/// assert!(classified.warnings.is_empty());
/// ```
pub fn classify_visual(candidate: &VisualCandidate) -> ClassifiedVisual {
    let payload = &candidate.payload;
    let mut warnings = Vec::new();

    let (config, config_size) = match locate_config(payload) {
        ConfigSource::Inline(value) => {
            let size = serde_json::to_string(&value).map(|s| s.len()).unwrap_or(0);
            (Some(value), size)
        }
        ConfigSource::Text(raw) => match parse_config_text(&raw) {
            Ok(value) => (Some(value), raw.len()),
            Err(detail) => {
                warnings.push(format!(
                    "configuration did not parse: {detail} (preview: {})",
                    preview_of(&raw)
                ));
                (None, raw.len())
            }
        },
        ConfigSource::Absent => (None, 0),
    };

    let id = synthesize_id(payload, config.as_ref(), &candidate.path);
    let raw_type = extract_raw_type(payload, config.as_ref());
    let canonical_type = extract_canonical_type(config.as_ref());

    let mut visual = Visual::new(&id, &raw_type, &canonical_type)
        .with_geometry(extract_geometry(payload))
        .with_discovery_path(&candidate.path);
    visual.config_size = config_size;

    if let Some(config) = &config {
        visual.data_roles = extract_data_roles(config);
        visual.property_groups = extract_property_groups(config);
        visual.text_content = extract_text_content(config);
        visual.bookmark_target = extract_bookmark_target(config);
    }

    ClassifiedVisual { visual, warnings }
}

// ---------------------------------------------------------------------------
// Configuration normalization
// ---------------------------------------------------------------------------

enum ConfigSource {
    /// Already an object inside the layout document.
    Inline(Value),
    /// Serialized into a string; needs a second parse.
    Text(String),
    Absent,
}

fn locate_config(payload: &Value) -> ConfigSource {
    match payload.get("config").or_else(|| payload.get("properties")) {
        Some(Value::String(raw)) => ConfigSource::Text(raw.clone()),
        Some(value @ Value::Object(_)) => ConfigSource::Inline(value.clone()),
        _ => ConfigSource::Absent,
    }
}

/// Parses a string-valued configuration.
///
/// Payloads normally start with `{` after the outer document parse; some
/// producer versions wrap them in a second layer of literal quotes, which
/// are stripped before retrying.
fn parse_config_text(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    let attempt = if trimmed.starts_with('{') {
        trimmed
    } else {
        trimmed.trim_matches('"')
    };
    serde_json::from_str(attempt).map_err(|err| err.to_string())
}

fn preview_of(raw: &str) -> String {
    match raw.char_indices().nth(CONFIG_PREVIEW_LIMIT) {
        Some((byte_idx, _)) => format!("{}...", &raw[..byte_idx]),
        None => raw.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Facet extraction
// ---------------------------------------------------------------------------

/// Picks a visual identity, synthesizing one from the discovery path when
/// the source declares none.
fn synthesize_id(payload: &Value, config: Option<&Value>, path: &str) -> String {
    identity_string(payload.get("id"))
        .or_else(|| identity_string(payload.get("name")))
        .or_else(|| config.and_then(|c| identity_string(c.get("name"))))
        .unwrap_or_else(|| format!("visual@{path}"))
}

fn identity_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Raw type code as the candidate node (or its configuration) declares it.
fn extract_raw_type(payload: &Value, config: Option<&Value>) -> String {
    payload
        .get("visualType")
        .and_then(Value::as_str)
        .or_else(|| payload.get("type").and_then(Value::as_str))
        .or_else(|| config.and_then(declared_type))
        .unwrap_or("unknown")
        .to_string()
}

/// Canonical type, derived only from the configuration's declared type.
///
/// Container-level type hints are kept as the raw code but do not feed the
/// canonical name; a missing or unparsed configuration therefore classifies
/// as [`UNKNOWN_VISUAL_TYPE`].
fn extract_canonical_type(config: Option<&Value>) -> String {
    match config.and_then(declared_type) {
        Some(code) => canonical_visual_type(code),
        None => UNKNOWN_VISUAL_TYPE.to_string(),
    }
}

fn declared_type(config: &Value) -> Option<&str> {
    config.get("singleVisual")?.get("visualType")?.as_str()
}

fn extract_geometry(payload: &Value) -> Geometry {
    let coord = |key: &str| payload.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let z = payload
        .get("z")
        .and_then(Value::as_f64)
        .or_else(|| payload.get("zOrder").and_then(Value::as_f64))
        .unwrap_or(0.0);
    Geometry::rounded(coord("x"), coord("y"), coord("width"), coord("height"), z)
}

/// Collects data-role bindings from the three shapes the producer has used:
/// `query.dataRoles` entries, the `projections` role→fields map, and
/// top-level `dataRoles` entries. All three contribute; duplicates are kept
/// as found.
fn extract_data_roles(config: &Value) -> Vec<DataRoleBinding> {
    let mut bindings = Vec::new();
    let single = config.get("singleVisual");

    if let Some(entries) = single
        .and_then(|s| s.get("query"))
        .and_then(|q| q.get("dataRoles"))
        .and_then(Value::as_array)
    {
        for entry in entries {
            bindings.push(binding_from_entry(entry));
        }
    }

    if let Some(projections) = single
        .and_then(|s| s.get("projections"))
        .and_then(Value::as_object)
    {
        for (role, fields) in projections {
            if let Some(items) = fields.as_array() {
                for item in items {
                    bindings.push(DataRoleBinding::new(role, &field_text(item)));
                }
            }
        }
    }

    if let Some(entries) = single.and_then(|s| s.get("dataRoles")).and_then(Value::as_array) {
        for entry in entries {
            bindings.push(binding_from_entry(entry));
        }
    }

    bindings
}

fn binding_from_entry(entry: &Value) -> DataRoleBinding {
    let role = entry
        .get("role")
        .or_else(|| entry.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let field = match entry
        .get("queryRef")
        .or_else(|| entry.get("field"))
        .or_else(|| entry.get("displayName"))
    {
        Some(Value::String(s)) => s.clone(),
        Some(other) => compact(other),
        None => compact(entry),
    };
    DataRoleBinding::new(role, &field)
}

fn field_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(_) => item
            .get("queryRef")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| compact(item)),
        other => compact(other),
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Flattens the configuration's `objects` map into named property groups,
/// one group per element that carries a `properties` payload.
fn extract_property_groups(config: &Value) -> Vec<PropertyGroup> {
    let mut groups = Vec::new();
    let Some(objects) = config
        .get("singleVisual")
        .and_then(|s| s.get("objects"))
        .and_then(Value::as_object)
    else {
        return groups;
    };

    for (name, elements) in objects {
        let Some(elements) = elements.as_array() else {
            continue;
        };
        for element in elements {
            if let Some(properties) = element.get("properties") {
                groups.push(PropertyGroup {
                    name: name.clone(),
                    properties: properties.clone(),
                });
            }
        }
    }
    groups
}

/// Probes for literal text content.
///
/// The `text` group's own `text` property is checked first; failing that,
/// any property whose name mentions text is probed for a literal
/// expression. First match wins.
fn extract_text_content(config: &Value) -> Option<String> {
    let objects = config.get("singleVisual")?.get("objects")?;

    if let Some(elements) = objects.get("text").and_then(Value::as_array) {
        for element in elements {
            let property = element.get("properties").and_then(|p| p.get("text"));
            if let Some(text) = literal_value(property) {
                return Some(text);
            }
        }
    }

    for elements in objects.as_object()?.values() {
        let Some(elements) = elements.as_array() else {
            continue;
        };
        for element in elements {
            let Some(properties) = element.get("properties").and_then(Value::as_object) else {
                continue;
            };
            for (name, value) in properties {
                if name.to_lowercase().contains("text") {
                    if let Some(text) = literal_value(Some(value)) {
                        return Some(text);
                    }
                }
            }
        }
    }
    None
}

/// Probes for a bookmark navigation target on the visual's link objects.
fn extract_bookmark_target(config: &Value) -> Option<String> {
    let links = config
        .get("singleVisual")?
        .get("vcObjects")?
        .get("visualLink")?
        .as_array()?;
    for link in links {
        let property = link.get("properties").and_then(|p| p.get("bookmark"));
        if let Some(target) = literal_value(property) {
            return Some(target);
        }
    }
    None
}

/// Unwraps a `{"expr": {"Literal": {"Value": "'...'"}}}` property into its
/// literal string, stripping the expression-language quote marks.
fn literal_value(property: Option<&Value>) -> Option<String> {
    let raw = property?.get("expr")?.get("Literal")?.get("Value")?.as_str()?;
    if raw.is_empty() {
        return None;
    }
    Some(raw.trim_matches('\'').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(payload: Value) -> VisualCandidate {
        VisualCandidate {
            path: "sections[0].visualContainers[0]".into(),
            payload,
        }
    }

    #[test]
    fn test_double_encoded_config_classifies_fully() {
        let config = json!({
            "singleVisual": {
                "visualType": "barChart",
                "projections": {
                    "Category": [{"queryRef": "Sales.Category"}],
                    "Y": [{"queryRef": "Sum(Sales.Amount)"}]
                }
            }
        });
        let classified = classify_visual(&candidate(json!({
            "id": 7,
            "x": 10.04, "y": 20, "width": 640, "height": 480, "z": 2,
            "config": config.to_string()
        })));

        let visual = &classified.visual;
        assert!(classified.warnings.is_empty());
        assert_eq!(visual.id, "7");
        assert_eq!(visual.canonical_type, "Bar Chart");
        assert_eq!(visual.geometry.x, 10.0);
        assert_eq!(visual.geometry.z, 2.0);
        assert_eq!(visual.data_roles.len(), 2);
        assert!(visual.data_roles.contains(&DataRoleBinding::new("Category", "Sales.Category")));
        assert_eq!(visual.config_size, config.to_string().len());
    }

    #[test]
    fn test_inline_config_equals_string_config() {
        let config = json!({
            "singleVisual": {
                "visualType": "lineChart",
                "projections": {"Y": [{"queryRef": "Sales.Total"}]}
            }
        });
        let inline = classify_visual(&candidate(json!({"id": 1, "config": config})));
        let stringly = classify_visual(&candidate(json!({"id": 1, "config": config.to_string()})));

        // Identical facets regardless of encoding depth.
        let left = serde_json::to_value(&inline.visual).unwrap();
        let right = serde_json::to_value(&stringly.visual).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn test_broken_config_degrades_with_warning() {
        let classified = classify_visual(&candidate(json!({
            "id": "vc9",
            "x": 5, "y": 5, "width": 100, "height": 50,
            "config": "{\"singleVisual\": truncated"
        })));

        assert_eq!(classified.warnings.len(), 1);
        assert!(classified.warnings[0].contains("did not parse"));
        assert!(classified.warnings[0].contains("truncated"));

        let visual = &classified.visual;
        assert_eq!(visual.canonical_type, UNKNOWN_VISUAL_TYPE);
        assert!(visual.data_roles.is_empty());
        // Geometry comes from the candidate node, not the configuration.
        assert_eq!(visual.geometry.width, 100.0);
        assert_eq!(visual.config_size, "{\"singleVisual\": truncated".len());
    }

    #[test]
    fn test_warning_preview_is_truncated() {
        let raw = format!("not json {}", "x".repeat(400));
        let classified = classify_visual(&candidate(json!({"id": 1, "config": raw})));
        let warning = &classified.warnings[0];
        assert!(warning.contains("..."));
        assert!(warning.len() < 400);
    }

    #[test]
    fn test_outer_quote_layer_is_stripped() {
        // The string value starts with a literal quote char; the retry path
        // strips the outer layer and parses the inner document.
        let raw = "\"{\"singleVisual\": {\"visualType\": \"card\"}}\"";
        let classified = classify_visual(&candidate(json!({"id": 1, "config": raw})));
        assert!(classified.warnings.is_empty());
        assert_eq!(classified.visual.canonical_type, "Card");
    }

    #[test]
    fn test_raw_and_canonical_types_diverge() {
        let classified = classify_visual(&candidate(json!({
            "id": 1,
            "type": "legacyBar",
            "config": {"singleVisual": {"visualType": "barChart"}}
        })));
        assert_eq!(classified.visual.raw_type, "legacyBar");
        assert_eq!(classified.visual.canonical_type, "Bar Chart");
    }

    #[test]
    fn test_container_type_alone_stays_unknown() {
        // The canonical name derives only from the configuration.
        let classified = classify_visual(&candidate(json!({"id": 1, "visualType": "barChart"})));
        assert_eq!(classified.visual.raw_type, "barChart");
        assert_eq!(classified.visual.canonical_type, UNKNOWN_VISUAL_TYPE);
    }

    #[test]
    fn test_unlisted_type_code_is_title_cased() {
        let classified = classify_visual(&candidate(json!({
            "id": 1,
            "config": {"singleVisual": {"visualType": "waffleChart"}}
        })));
        assert_eq!(classified.visual.canonical_type, "Waffle Chart");
    }

    #[test]
    fn test_binding_union_across_all_three_shapes() {
        let classified = classify_visual(&candidate(json!({
            "id": 1,
            "config": {"singleVisual": {
                "visualType": "tableEx",
                "query": {"dataRoles": [{"role": "Values", "queryRef": "Sales.Amount"}]},
                "projections": {"Values": ["Sales.Region"]},
                "dataRoles": [{"name": "Tooltips", "displayName": "Margin"}]
            }}
        })));

        let roles = &classified.visual.data_roles;
        assert_eq!(roles.len(), 3);
        assert_eq!(roles[0], DataRoleBinding::new("Values", "Sales.Amount"));
        assert_eq!(roles[1], DataRoleBinding::new("Values", "Sales.Region"));
        assert_eq!(roles[2], DataRoleBinding::new("Tooltips", "Margin"));
    }

    #[test]
    fn test_binding_entry_without_known_keys_keeps_payload() {
        let classified = classify_visual(&candidate(json!({
            "id": 1,
            "config": {"singleVisual": {
                "visualType": "card",
                "dataRoles": [{"select": 3}]
            }}
        })));
        let binding = &classified.visual.data_roles[0];
        assert_eq!(binding.role, "unknown");
        assert_eq!(binding.field, "{\"select\":3}");
    }

    #[test]
    fn test_text_literal_from_text_group() {
        let classified = classify_visual(&candidate(json!({
            "id": 1,
            "config": {"singleVisual": {
                "visualType": "textbox",
                "objects": {"text": [
                    {"properties": {"text": {"expr": {"Literal": {"Value": "'Quarterly Sales'"}}}}}
                ]}
            }}
        })));
        assert_eq!(classified.visual.text_content.as_deref(), Some("Quarterly Sales"));
        assert!(classified.visual.has_text());
    }

    #[test]
    fn test_text_fallback_probes_named_properties() {
        let classified = classify_visual(&candidate(json!({
            "id": 1,
            "config": {"singleVisual": {
                "visualType": "actionButton",
                "objects": {"labels": [
                    {"properties": {"buttonText": {"expr": {"Literal": {"Value": "'Go to detail'"}}}}}
                ]}
            }}
        })));
        assert_eq!(classified.visual.text_content.as_deref(), Some("Go to detail"));
    }

    #[test]
    fn test_bookmark_target_extracted_from_visual_link() {
        let classified = classify_visual(&candidate(json!({
            "id": 1,
            "config": {"singleVisual": {
                "visualType": "actionButton",
                "vcObjects": {"visualLink": [
                    {"properties": {
                        "type": {"expr": {"Literal": {"Value": "'Bookmark'"}}},
                        "bookmark": {"expr": {"Literal": {"Value": "'Bookmark4a3b2c'"}}}
                    }}
                ]}
            }}
        })));
        assert_eq!(classified.visual.bookmark_target.as_deref(), Some("Bookmark4a3b2c"));
        assert!(classified.visual.has_bookmark());
    }

    #[test]
    fn test_property_groups_flattened_per_element() {
        let classified = classify_visual(&candidate(json!({
            "id": 1,
            "config": {"singleVisual": {
                "visualType": "barChart",
                "objects": {
                    "dataPoint": [
                        {"properties": {"fill": {"solid": {"color": "#118DFF"}}}},
                        {"properties": {"showAllDataPoints": true}}
                    ],
                    "title": [{"properties": {"visible": false}}],
                    "padding": "not a list"
                }
            }}
        })));

        let groups = &classified.visual.property_groups;
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.iter().filter(|g| g.name == "dataPoint").count(), 2);
        assert_eq!(groups.iter().filter(|g| g.name == "title").count(), 1);
    }

    #[test]
    fn test_id_synthesis_fallback_chain() {
        let from_name = classify_visual(&candidate(json!({"name": "vcAlpha", "config": "{}"})));
        assert_eq!(from_name.visual.id, "vcAlpha");

        let from_config = classify_visual(&candidate(json!({
            "config": {"name": "cfgBeta", "singleVisual": {"visualType": "card"}}
        })));
        assert_eq!(from_config.visual.id, "cfgBeta");

        let synthesized = classify_visual(&candidate(json!({"visualType": "card"})));
        assert_eq!(synthesized.visual.id, "visual@sections[0].visualContainers[0]");
    }

    #[test]
    fn test_absent_config_yields_bare_visual() {
        let classified = classify_visual(&candidate(json!({
            "id": "vc1", "x": 1, "y": 2, "width": 3, "height": 4
        })));
        let visual = &classified.visual;
        assert!(classified.warnings.is_empty());
        assert_eq!(visual.config_size, 0);
        assert_eq!(visual.canonical_type, UNKNOWN_VISUAL_TYPE);
        assert!(visual.text_content.is_none());
        assert!(visual.property_groups.is_empty());
    }
}
