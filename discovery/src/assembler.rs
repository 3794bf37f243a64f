//! Canonical model assembly.
//!
//! Each layout member is mined and classified independently; the assembler
//! merges those per-member analyses into one [`UiModel`]. Merging embraces
//! the over-collection contract: the same page is frequently discovered
//! through more than one structural route (and in more than one member), so
//! pages de-duplicate by name with the last-seen record winning. Visuals are
//! never de-duplicated; distinct widgets can legitimately look identical.
//!
//! Assembly is total: empty input produces an empty, valid model rather
//! than an error.

use std::collections::BTreeMap;

use pbix_extract_core::{
    Bookmark, CustomVisualDescriptor, ExtractionRun, Filter, IssueKind, MODEL_CONTRACT_VERSION,
    Page, RunIssue, UiModel, Visual,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::miner::PageCandidate;

/// Everything discovered in one layout member.
#[derive(Debug, Clone, Default)]
pub struct MemberAnalysis {
    /// Source member path.
    pub member: String,
    /// Mined page candidates, document order.
    pub pages: Vec<PageCandidate>,
    /// Classified (and resolved) visuals, document order.
    pub visuals: Vec<Visual>,
    /// All filter records found in the member.
    pub filters: Vec<Filter>,
    /// Recoverable failures hit while analyzing the member.
    pub issues: Vec<RunIssue>,
}

impl MemberAnalysis {
    /// Creates an empty analysis for a member.
    pub fn new(member: &str) -> Self {
        Self {
            member: member.to_string(),
            ..Self::default()
        }
    }
}

/// Merges per-member analyses into the canonical model.
///
/// The caller supplies analyses in a deterministic order (the pipeline
/// sorts them by member path); assembly itself is order-stable, so the same
/// analyses always produce the same model. The passed-in `run` keeps any
/// issues already recorded; analysis issues and merge findings are appended
/// and the entity counts filled in.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use pbix_extract_core::ExtractionRun;
/// use pbix_extract_discovery::assembler::{MemberAnalysis, assemble_model};
///
/// let model = assemble_model(vec![MemberAnalysis::new("Report/Layout")],
///                            Vec::new(), BTreeMap::new(), ExtractionRun::default());
/// assert!(model.is_empty());
/// assert!(model.model_version.is_some());
/// ```
pub fn assemble_model(
    analyses: Vec<MemberAnalysis>,
    custom_visuals: Vec<CustomVisualDescriptor>,
    report_metadata: BTreeMap<String, Value>,
    mut run: ExtractionRun,
) -> UiModel {
    let mut pages_by_name: BTreeMap<String, Page> = BTreeMap::new();
    let mut visuals: Vec<Visual> = Vec::new();
    let mut loose_filters: Vec<Filter> = Vec::new();

    for analysis in analyses {
        run.issues.extend(analysis.issues);

        // Last-seen-wins: a page rediscovered later (deeper in the document
        // or in a later member) replaces the earlier record wholesale.
        for candidate in analysis.pages {
            pages_by_name.insert(candidate.page.name.clone(), candidate.page);
        }

        // Filters found at a page's own path already live on that page
        // record; everything else is kept at model level.
        let page_paths: Vec<&str> = collect_paths(&pages_by_name);
        for filter in analysis.filters {
            if !page_paths.contains(&filter.path.as_str()) {
                loose_filters.push(filter);
            }
        }

        visuals.extend(analysis.visuals);
    }

    let mut pages: Vec<Page> = pages_by_name.into_values().collect();
    pages.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.name.cmp(&b.name)));

    for pair in pages.windows(2) {
        if pair[0].ordinal == pair[1].ordinal {
            warn!(
                first = %pair[0].name,
                second = %pair[1].name,
                ordinal = pair[0].ordinal,
                "pages share an ordinal"
            );
            run.issues.push(RunIssue::run_level(
                IssueKind::DuplicateOrdinal,
                &format!(
                    "pages '{}' and '{}' both declare ordinal {}",
                    pair[0].name, pair[1].name, pair[0].ordinal
                ),
            ));
        }
    }

    for page in &mut pages {
        page.visual_ids = visuals
            .iter()
            .filter(|visual| visual.page.as_deref() == Some(page.name.as_str()))
            .map(|visual| visual.id.clone())
            .collect();
    }

    let mut histogram: BTreeMap<String, usize> = BTreeMap::new();
    for visual in &visuals {
        *histogram.entry(visual.canonical_type.clone()).or_insert(0) += 1;
    }

    let bookmarks: Vec<Bookmark> = visuals
        .iter()
        .filter_map(|visual| {
            visual.bookmark_target.as_ref().map(|target| {
                let mut bookmark = Bookmark::new(target, &visual.id, &visual.canonical_type);
                bookmark.page = visual.page.clone();
                bookmark
            })
        })
        .collect();

    run.page_count = pages.len();
    run.visual_count = visuals.len();
    run.filter_count =
        loose_filters.len() + pages.iter().map(|page| page.filters.len()).sum::<usize>();
    run.bookmark_count = bookmarks.len();
    run.custom_visual_count = custom_visuals.len();

    debug!(
        pages = run.page_count,
        visuals = run.visual_count,
        filters = run.filter_count,
        bookmarks = run.bookmark_count,
        "assembled canonical model"
    );

    UiModel {
        model_version: Some(MODEL_CONTRACT_VERSION.to_string()),
        run,
        pages,
        visuals,
        filters: loose_filters,
        bookmarks,
        custom_visuals,
        visual_type_histogram: histogram,
        report_metadata,
    }
}

/// Paths of all page records merged so far, via their own filter records.
///
/// A page's path is not stored on [`Page`]; its own filters carry it, and a
/// filterless page cannot collide with loose filters anyway.
fn collect_paths(pages: &BTreeMap<String, Page>) -> Vec<&str> {
    pages
        .values()
        .flat_map(|page| page.filters.iter().map(|filter| filter.path.as_str()))
        .collect()
}
