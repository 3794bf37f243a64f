//! Run issue taxonomy.
//!
//! Recoverable failures never abort an extraction run; they are recorded as
//! [`RunIssue`] values on the run metadata and surfaced in the summary
//! report's "errors encountered" section. Only container access and final
//! projection escalate to hard errors (handled by the owning crates' error
//! enums, not here).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a recoverable extraction failure.
///
/// Serialized in `snake_case`; [`fmt::Display`] matches the serialized form
/// so log lines and JSON artifacts agree.
///
/// # Examples
///
/// ```
/// use pbix_extract_core::IssueKind;
///
/// assert_eq!(IssueKind::DecodeFailure.to_string(), "decode_failure");
/// let json = serde_json::to_string(&IssueKind::ParseFailure).unwrap();
/// assert_eq!(json, "\"parse_failure\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A member's bytes survived no step of the encoding cascade.
    DecodeFailure,
    /// A member's text was not valid JSON; truncated raw text retained.
    ParseFailure,
    /// A visual's configuration could not be (fully) interpreted.
    ClassificationFailure,
    /// No resolution strategy produced a page for a visual.
    ResolutionAmbiguity,
    /// The container held no layout candidates at all.
    NoLayoutCandidates,
    /// Two distinct pages declared the same ordinal.
    DuplicateOrdinal,
    /// A data-model collaborator call failed; its category left empty.
    CollaboratorFailure,
}

impl IssueKind {
    /// Stable string form, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::DecodeFailure => "decode_failure",
            IssueKind::ParseFailure => "parse_failure",
            IssueKind::ClassificationFailure => "classification_failure",
            IssueKind::ResolutionAmbiguity => "resolution_ambiguity",
            IssueKind::NoLayoutCandidates => "no_layout_candidates",
            IssueKind::DuplicateOrdinal => "duplicate_ordinal",
            IssueKind::CollaboratorFailure => "collaborator_failure",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recoverable failure recorded during a run.
///
/// # Examples
///
/// ```
/// use pbix_extract_core::{IssueKind, RunIssue};
///
/// let issue = RunIssue::new("Report/Layout", IssueKind::ParseFailure, "expected value at line 1");
/// assert_eq!(issue.member, "Report/Layout");
/// assert_eq!(issue.kind, IssueKind::ParseFailure);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIssue {
    /// Member path (or pseudo-member like `<run>`) the issue belongs to.
    pub member: String,
    /// Failure category.
    pub kind: IssueKind,
    /// Human-readable detail.
    pub detail: String,
}

impl RunIssue {
    /// Creates an issue record.
    pub fn new(member: &str, kind: IssueKind, detail: &str) -> Self {
        Self {
            member: member.to_string(),
            kind,
            detail: detail.to_string(),
        }
    }

    /// Creates an issue not tied to a specific member.
    pub fn run_level(kind: IssueKind, detail: &str) -> Self {
        Self::new("<run>", kind, detail)
    }
}
