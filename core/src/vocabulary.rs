//! Visual-type vocabulary.
//!
//! Maps the producing application's raw visual-type codes (e.g., `barChart`,
//! `tableEx`) to canonical human-readable names. The table covers the stock
//! visual set; codes outside it (custom visuals, newer chart types) pass
//! through title-cased from their camelCase form instead of failing, and an
//! absent/unreadable code maps to [`UNKNOWN_VISUAL_TYPE`].

use std::collections::HashMap;
use std::sync::LazyLock;

/// Canonical type assigned when no type code can be read.
pub const UNKNOWN_VISUAL_TYPE: &str = "Unknown";

/// Raw code → canonical name for the stock visual set.
static VISUAL_TYPES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("actionButton", "Action Button"),
        ("card", "Card"),
        ("columnChart", "Column Chart"),
        ("barChart", "Bar Chart"),
        ("lineChart", "Line Chart"),
        ("areaChart", "Area Chart"),
        ("pieChart", "Pie Chart"),
        ("donutChart", "Donut Chart"),
        ("tableEx", "Table"),
        ("matrix", "Matrix"),
        ("slicer", "Slicer"),
        ("gauge", "Gauge"),
        ("scatterChart", "Scatter Chart"),
        ("map", "Map"),
        ("filledMap", "Filled Map"),
        ("treemap", "Treemap"),
        ("waterfallChart", "Waterfall Chart"),
        ("funnelChart", "Funnel Chart"),
        ("ribbonChart", "Ribbon Chart"),
        ("textbox", "Text Box"),
        ("shape", "Shape"),
        ("image", "Image"),
        ("multiRowCard", "Multi-row Card"),
        ("kpi", "KPI"),
        ("stackedAreaChart", "Stacked Area Chart"),
        ("clusteredBarChart", "Clustered Bar Chart"),
        ("stackedBarChart", "Stacked Bar Chart"),
        ("clusteredColumnChart", "Clustered Column Chart"),
        ("stackedColumnChart", "Stacked Column Chart"),
        ("lineStackedColumnComboChart", "Line and Stacked Column Chart"),
        ("lineClusteredColumnComboChart", "Line and Clustered Column Chart"),
        ("100stackedBarChart", "100% Stacked Bar Chart"),
        ("100stackedColumnChart", "100% Stacked Column Chart"),
        ("htmlViewer", "HTML Viewer"),
    ])
});

/// Maps a raw visual-type code to its canonical name.
///
/// Unknown codes are title-cased rather than rejected; an empty code yields
/// [`UNKNOWN_VISUAL_TYPE`].
///
/// # Examples
///
/// ```
/// use pbix_extract_core::canonical_visual_type;
///
/// assert_eq!(canonical_visual_type("barChart"), "Bar Chart");
/// assert_eq!(canonical_visual_type("tableEx"), "Table");
/// assert_eq!(canonical_visual_type("waffleChart"), "Waffle Chart");
/// assert_eq!(canonical_visual_type(""), "Unknown");
/// ```
pub fn canonical_visual_type(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return UNKNOWN_VISUAL_TYPE.to_string();
    }
    match VISUAL_TYPES.get(code) {
        Some(name) => (*name).to_string(),
        None => title_case_code(code),
    }
}

/// Whether a code is part of the stock vocabulary.
pub fn is_stock_visual_type(code: &str) -> bool {
    VISUAL_TYPES.contains_key(code.trim())
}

/// Title-cases a camelCase type code (`waffleChart` → `Waffle Chart`).
///
/// Word breaks occur at lowercase→uppercase transitions and at `_`/`-`
/// separators; each word is capitalized.
pub fn title_case_code(code: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in code.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| capitalize(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_codes_map_to_canonical_names() {
        assert_eq!(canonical_visual_type("barChart"), "Bar Chart");
        assert_eq!(canonical_visual_type("tableEx"), "Table");
        assert_eq!(canonical_visual_type("kpi"), "KPI");
        assert_eq!(canonical_visual_type("multiRowCard"), "Multi-row Card");
        assert_eq!(
            canonical_visual_type("100stackedBarChart"),
            "100% Stacked Bar Chart"
        );
        assert_eq!(
            canonical_visual_type("lineClusteredColumnComboChart"),
            "Line and Clustered Column Chart"
        );
    }

    #[test]
    fn test_unknown_codes_pass_through_title_cased() {
        assert_eq!(canonical_visual_type("waffleChart"), "Waffle Chart");
        assert_eq!(canonical_visual_type("esriMap"), "Esri Map");
        assert_eq!(canonical_visual_type("custom_widget"), "Custom Widget");
    }

    #[test]
    fn test_empty_code_is_unknown() {
        assert_eq!(canonical_visual_type(""), UNKNOWN_VISUAL_TYPE);
        assert_eq!(canonical_visual_type("   "), UNKNOWN_VISUAL_TYPE);
    }

    #[test]
    fn test_whitespace_around_codes_is_ignored() {
        assert_eq!(canonical_visual_type(" slicer "), "Slicer");
        assert!(is_stock_visual_type("  gauge"));
        assert!(!is_stock_visual_type("gaugeX"));
    }
}
