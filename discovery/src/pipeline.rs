//! End-to-end extraction pipeline.
//!
//! [`UiExtractor`] drives one run: list container members, route them by
//! kind, mine and classify every layout member, resolve visuals onto pages,
//! and assemble the canonical model. Container access failures abort the
//! run; everything else degrades into run issues.
//!
//! Member processing order is the sorted member path, and per-member
//! analysis is a pure function of the member bytes, so a run is
//! deterministic whether members are analyzed sequentially or in parallel.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use pbix_extract_core::{CustomVisualDescriptor, ExtractionRun, IssueKind, RunIssue, UiModel};
use pbix_extract_container::{
    ContainerReader, MemberInfo, MemberKind, ParsedPayload, Result, decode, parse_structured,
};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, warn};

use crate::assembler::{MemberAnalysis, assemble_model};
use crate::classifier::classify_visual;
use crate::miner::{find_filters, find_pages, find_visuals};
use crate::resolver::{PageAssignment, resolve_visual_page};

/// One-shot extractor over a report container.
///
/// # Examples
///
/// ```
/// use pbix_extract_container::ArchiveBuilder;
/// use pbix_extract_discovery::pipeline::UiExtractor;
///
/// let layout: Vec<u8> = r#"{"sections": [{"name": "ReportSection1", "visualContainers": []}]}"#
///     .encode_utf16().flat_map(u16::to_le_bytes).collect();
/// let bytes = ArchiveBuilder::new().stored("Report/Layout", &layout).finish();
///
/// let model = UiExtractor::from_bytes(bytes).unwrap().extract().unwrap();
/// assert_eq!(model.pages.len(), 1);
/// ```
#[derive(Debug)]
pub struct UiExtractor {
    reader: ContainerReader,
    parallel: bool,
}

impl UiExtractor {
    /// Opens a container file for extraction.
    ///
    /// # Errors
    ///
    /// Propagates [`pbix_extract_container::ContainerError`] when the file
    /// cannot be read or is not an archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            reader: ContainerReader::open(path)?,
            parallel: false,
        })
    }

    /// Builds an extractor over in-memory container bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Self {
            reader: ContainerReader::from_bytes(bytes)?,
            parallel: false,
        })
    }

    /// Enables analyzing layout members on the rayon thread pool.
    ///
    /// Results are identical either way; only wall-clock time changes.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The underlying container reader.
    pub fn reader(&self) -> &ContainerReader {
        &self.reader
    }

    /// Runs the full extraction and assembles the canonical model.
    ///
    /// # Errors
    ///
    /// Only container access failures (unreadable member, damaged archive)
    /// abort; decode, parse, classification, and resolution failures are
    /// recorded as issues on the returned model's run.
    pub fn extract(&self) -> Result<UiModel> {
        let mut run = ExtractionRun {
            source_path: self.reader.source_path().display().to_string(),
            source_digest: self.reader.source_digest(),
            started_at: Utc::now().to_rfc3339(),
            ..ExtractionRun::default()
        };
        let mut consumed: Vec<String> = Vec::new();

        // Layout members: bytes are read up front (container errors abort),
        // then analyzed as pure functions over those bytes.
        let layout_members = self.sorted_members(MemberKind::Layout);
        let mut payloads: Vec<(String, Vec<u8>)> = Vec::with_capacity(layout_members.len());
        for member in &layout_members {
            payloads.push((member.path.clone(), self.reader.read_member(&member.path)?));
            consumed.push(member.path.clone());
        }

        let analyses: Vec<MemberAnalysis> = if self.parallel {
            payloads
                .par_iter()
                .map(|(member, bytes)| analyze_layout_member(member, bytes))
                .collect()
        } else {
            payloads
                .iter()
                .map(|(member, bytes)| analyze_layout_member(member, bytes))
                .collect()
        };

        if layout_members.is_empty() {
            run.issues.push(RunIssue::run_level(
                IssueKind::NoLayoutCandidates,
                "container has no layout members",
            ));
        }

        let mut report_metadata: BTreeMap<String, Value> = BTreeMap::new();
        for member in self.sorted_members(MemberKind::Metadata) {
            let bytes = self.reader.read_member(&member.path)?;
            consumed.push(member.path.clone());
            collect_metadata(&member.path, &bytes, &mut report_metadata, &mut run.issues);
        }

        let mut custom_visuals: Vec<CustomVisualDescriptor> = Vec::new();
        for member in self.sorted_members(MemberKind::CustomVisual) {
            let bytes = self.reader.read_member(&member.path)?;
            consumed.push(member.path.clone());
            custom_visuals.push(describe_custom_visual(&member, &bytes));
        }

        for member in self.sorted_members(MemberKind::Version) {
            let bytes = self.reader.read_member(&member.path)?;
            consumed.push(member.path.clone());
            match decode(&bytes) {
                Ok(decoded) if !decoded.is_blank() => {
                    run.producer_version = Some(decoded.text.trim().to_string());
                    break;
                }
                Ok(_) => {}
                Err(err) => run.issues.push(RunIssue::new(
                    &member.path,
                    IssueKind::DecodeFailure,
                    &err.to_string(),
                )),
            }
        }

        run.members_consumed = consumed;
        Ok(assemble_model(analyses, custom_visuals, report_metadata, run))
    }

    fn sorted_members(&self, kind: MemberKind) -> Vec<MemberInfo> {
        let mut members = self.reader.members_of_kind(kind);
        members.sort_by(|a, b| a.path.cmp(&b.path));
        members
    }
}

/// Opens a container and extracts its model in one call.
///
/// # Errors
///
/// Same as [`UiExtractor::extract`].
pub fn extract_ui_model(path: impl AsRef<Path>) -> Result<UiModel> {
    UiExtractor::open(path)?.extract()
}

// ---------------------------------------------------------------------------
// Per-member analysis
// ---------------------------------------------------------------------------

/// Analyzes one layout member's bytes: decode, parse, mine, classify,
/// resolve. Pure; safe to run on worker threads.
fn analyze_layout_member(member: &str, bytes: &[u8]) -> MemberAnalysis {
    let decoded = match decode(bytes) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(member, error = %err, "failed to decode layout member");
            let mut analysis = MemberAnalysis::new(member);
            analysis
                .issues
                .push(RunIssue::new(member, IssueKind::DecodeFailure, &err.to_string()));
            return analysis;
        }
    };
    if decoded.is_blank() {
        // An empty member carries no structure; not an error.
        return MemberAnalysis::new(member);
    }
    match parse_structured(&decoded.text) {
        ParsedPayload::Document(doc) => analyze_layout_document(member, &doc),
        ParsedPayload::Unparsed { preview, detail } => {
            warn!(member, error = %detail, "layout member is not structured JSON");
            let mut analysis = MemberAnalysis::new(member);
            analysis.issues.push(RunIssue::new(
                member,
                IssueKind::ParseFailure,
                &format!("{detail} (retained preview: {preview})"),
            ));
            analysis
        }
    }
}

/// Mines, classifies, and resolves one parsed layout document.
///
/// Exposed for callers that already hold structured layout JSON (offline
/// analysis, tests); [`UiExtractor::extract`] goes through the same path.
pub fn analyze_layout_document(member: &str, doc: &Value) -> MemberAnalysis {
    let mut analysis = MemberAnalysis::new(member);
    analysis.pages = find_pages(doc);
    analysis.filters = find_filters(doc);

    for candidate in find_visuals(doc) {
        let classified = classify_visual(&candidate);
        for warning in classified.warnings {
            analysis
                .issues
                .push(RunIssue::new(member, IssueKind::ClassificationFailure, &warning));
        }

        let mut visual = classified.visual;
        match resolve_visual_page(&visual, &analysis.pages) {
            PageAssignment::Resolved(page) => visual.page = Some(page),
            PageAssignment::Unresolved => analysis.issues.push(RunIssue::new(
                member,
                IssueKind::ResolutionAmbiguity,
                &format!(
                    "no page found for visual '{}' at {}",
                    visual.id, visual.discovery_path
                ),
            )),
        }
        analysis.visuals.push(visual);
    }

    debug!(
        member,
        pages = analysis.pages.len(),
        visuals = analysis.visuals.len(),
        filters = analysis.filters.len(),
        "analyzed layout member"
    );
    analysis
}

/// Parses a metadata member, keeping a truncated raw preview in the model
/// when parsing fails.
fn collect_metadata(
    member: &str,
    bytes: &[u8],
    report_metadata: &mut BTreeMap<String, Value>,
    issues: &mut Vec<RunIssue>,
) {
    match decode(bytes) {
        Err(err) => issues.push(RunIssue::new(member, IssueKind::DecodeFailure, &err.to_string())),
        Ok(decoded) if decoded.is_blank() => {}
        Ok(decoded) => match parse_structured(&decoded.text) {
            ParsedPayload::Document(doc) => {
                report_metadata.insert(member.to_string(), doc);
            }
            ParsedPayload::Unparsed { preview, detail } => {
                issues.push(RunIssue::new(member, IssueKind::ParseFailure, &detail));
                report_metadata.insert(
                    member.to_string(),
                    serde_json::json!({"error": detail, "raw_content": preview}),
                );
            }
        },
    }
}

/// Describes a custom-visual member: declared name/version for parseable
/// descriptors, a size+path record for binary assets.
fn describe_custom_visual(member: &MemberInfo, bytes: &[u8]) -> CustomVisualDescriptor {
    let Ok(decoded) = decode(bytes) else {
        return CustomVisualDescriptor::unparsed(&member.path, member.size);
    };
    match parse_structured(&decoded.text) {
        ParsedPayload::Document(doc) if doc.is_object() => CustomVisualDescriptor::parsed(
            &member.path,
            doc.get("name").and_then(Value::as_str).map(str::to_string),
            version_string(doc.get("version")),
            member.size,
        ),
        _ => CustomVisualDescriptor::unparsed(&member.path, member.size),
    }
}

fn version_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
