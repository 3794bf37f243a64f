//! Output formatting for extracted models.

use pbix_extract_core::UiModel;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Text,
}

impl OutputFormat {
    /// Conventional file extension for artifacts in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Text => "txt",
        }
    }
}

/// Formats a model in the requested output format.
pub fn format_model(model: &UiModel, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(model)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(model).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => Ok(model_to_text(model)),
    }
}

/// Presentation form of an internal page name.
///
/// Machine-generated `ReportSection` names read as `Page N`; absurdly long
/// generated names (GUID-suffixed) keep only their last four characters.
/// Hand-authored names pass through untouched.
pub fn clean_page_name(name: &str) -> String {
    if !name.starts_with("ReportSection") {
        return name.to_string();
    }
    let count = name.chars().count();
    if count > 50 {
        let tail: String = name.chars().skip(count - 4).collect();
        return format!("Page {tail}");
    }
    name.replace("ReportSection", "Page ")
}

fn model_to_text(model: &UiModel) -> String {
    let mut out = String::new();
    let run = &model.run;

    out.push_str("Report UI Extraction Summary\n");
    out.push_str("============================\n");
    out.push_str(&format!("Source: {}\n", run.source_path));
    out.push_str(&format!("Digest: {}\n", run.source_digest));
    if let Some(ref version) = run.producer_version {
        out.push_str(&format!("Producer version: {version}\n"));
    }
    out.push_str(&format!(
        "Pages: {}  Visuals: {}  Filters: {}  Bookmarks: {}  Custom visuals: {}\n",
        run.page_count, run.visual_count, run.filter_count, run.bookmark_count,
        run.custom_visual_count
    ));

    if !model.pages.is_empty() {
        out.push_str("\nPages:\n");
        for page in &model.pages {
            let visibility = if page.visible { "" } else { " [hidden]" };
            out.push_str(&format!(
                "  {:>2}. {} ({} visuals, {}x{}){}\n",
                page.ordinal,
                clean_page_name(page.display_label()),
                page.visual_ids.len(),
                page.width,
                page.height,
                visibility
            ));
        }
    }

    if !model.visual_type_histogram.is_empty() {
        out.push_str("\nVisual types:\n");
        for (kind, count) in &model.visual_type_histogram {
            out.push_str(&format!("  {kind}: {count}\n"));
        }
    }

    if !model.bookmarks.is_empty() {
        out.push_str("\nBookmarks:\n");
        for bookmark in &model.bookmarks {
            let page = bookmark
                .page
                .as_deref()
                .map(clean_page_name)
                .unwrap_or_else(|| "unresolved".to_string());
            out.push_str(&format!(
                "  {} <- {} '{}' on {page}\n",
                bookmark.target, bookmark.visual_type, bookmark.visual_id
            ));
        }
    }

    if !model.custom_visuals.is_empty() {
        out.push_str("\nCustom visuals:\n");
        for descriptor in &model.custom_visuals {
            let name = descriptor.name.as_deref().unwrap_or("Unknown");
            let version = descriptor.version.as_deref().unwrap_or("Unknown");
            out.push_str(&format!(
                "  {name} {version} ({}, {} bytes)\n",
                descriptor.member_path, descriptor.size
            ));
        }
    }

    out.push_str(&format!("\nErrors encountered: {}\n", run.issues.len()));
    if run.issues.is_empty() {
        out.push_str("  (none)\n");
    }
    for issue in &run.issues {
        out.push_str(&format!("  [{}] {}: {}\n", issue.kind, issue.member, issue.detail));
    }

    out
}
