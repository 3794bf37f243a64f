//! Payload decoding and structured parsing.
//!
//! Container members do not declare their text encoding, and the producing
//! application is inconsistent about it across versions and member types.
//! [`decode`] therefore runs a fixed-priority cascade: UTF-16LE (the
//! producer's default for layout members), then UTF-8, then a lossy UTF-8
//! decode. [`parse_structured`] keeps a truncated raw preview when a
//! decoded payload is not valid JSON, so one bad member never fails a run.
//!
//! Each cascade step is a pure function returning `Option<String>`; the
//! first step to produce a result wins.

use serde_json::Value;
use thiserror::Error;

/// Maximum characters retained from an unparsable payload.
pub const RAW_PREVIEW_LIMIT: usize = 1000;

/// Which cascade step produced a decoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// 16-bit little-endian Unicode, with or without BOM.
    Utf16Le,
    /// Strict 8-bit Unicode.
    Utf8,
    /// Lossy 8-bit Unicode; undecodable sequences replaced.
    Utf8Lossy,
}

impl Encoding {
    /// Stable lowercase name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf8 => "utf-8",
            Encoding::Utf8Lossy => "utf-8-lossy",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A successfully decoded payload and the step that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: Encoding,
}

impl Decoded {
    /// Whether the payload holds no content worth parsing.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The payload survived no step of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Even the lossy decode was dominated by replacement characters.
    #[error("payload does not decode as text")]
    NotText,
}

/// The fixed-priority encoding cascade.
const CASCADE: &[(Encoding, fn(&[u8]) -> Option<String>)] = &[
    (Encoding::Utf16Le, decode_utf16le),
    (Encoding::Utf8, decode_utf8),
    (Encoding::Utf8Lossy, decode_utf8_lossy),
];

/// Decodes an opaque byte payload into text.
///
/// Tries UTF-16LE, then UTF-8, then lossy UTF-8, returning the first step
/// that produces plausible text. Pure: the same bytes always yield the same
/// result. Empty input decodes to an empty string (no content), not an
/// error.
///
/// # Errors
///
/// Returns [`DecodeError::NotText`] when every step fails; in practice,
/// binary payloads whose lossy decode is mostly replacement characters.
///
/// # Examples
///
/// ```
/// use pbix_extract_container::{Encoding, decode};
///
/// let utf16: Vec<u8> = "{\"a\":1}".encode_utf16().flat_map(u16::to_le_bytes).collect();
/// let decoded = decode(&utf16).unwrap();
/// assert_eq!(decoded.encoding, Encoding::Utf16Le);
/// assert_eq!(decoded.text, "{\"a\":1}");
/// ```
pub fn decode(bytes: &[u8]) -> Result<Decoded, DecodeError> {
    for (encoding, step) in CASCADE {
        if let Some(text) = step(bytes) {
            return Ok(Decoded {
                text,
                encoding: *encoding,
            });
        }
    }
    Err(DecodeError::NotText)
}

/// UTF-16LE step.
///
/// A leading LE BOM is honored (and stripped) unconditionally. Without a
/// BOM the decoded text must pass the plausibility gate: UTF-8 JSON misread
/// as UTF-16LE pairs ASCII bytes into CJK-range units with almost no ASCII
/// left, while genuine report payloads are ASCII-heavy JSON.
fn decode_utf16le(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let (payload, had_bom) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, ..] => return None, // big-endian; not the producer's default
        _ => (bytes, false),
    };

    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16(&units).ok()?;

    if had_bom || is_plausible_text(&text) {
        Some(text)
    } else {
        None
    }
}

/// UTF-8 step; strips a leading BOM.
fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let payload = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(payload).ok().map(str::to_string)
}

/// Lossy step; refuses payloads that are mostly not text.
fn decode_utf8_lossy(bytes: &[u8]) -> Option<String> {
    let payload = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = String::from_utf8_lossy(payload).into_owned();
    let total = text.chars().count();
    let replacements = text.chars().filter(|c| *c == '\u{FFFD}').count();
    if total > 0 && replacements * 2 > total {
        return None;
    }
    Some(text)
}

/// At least half the characters must be ASCII for a BOM-less UTF-16LE
/// decode to be believed.
fn is_plausible_text(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return true;
    }
    let ascii = text.chars().filter(char::is_ascii).count();
    ascii * 2 >= total
}

/// Outcome of structured parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    /// The payload parsed as JSON.
    Document(Value),
    /// Not valid JSON; the member is retained as a truncated raw preview.
    Unparsed { preview: String, detail: String },
}

impl ParsedPayload {
    /// Returns the parsed document, if any.
    pub fn document(&self) -> Option<&Value> {
        match self {
            ParsedPayload::Document(value) => Some(value),
            ParsedPayload::Unparsed { .. } => None,
        }
    }
}

/// Attempts strict JSON parsing of a decoded payload.
///
/// On failure the member is not discarded: the first
/// [`RAW_PREVIEW_LIMIT`] characters are preserved alongside the parse
/// error so the run can report what it skipped.
///
/// # Examples
///
/// ```
/// use pbix_extract_container::{ParsedPayload, parse_structured};
///
/// assert!(parse_structured("{\"pages\":[]}").document().is_some());
///
/// match parse_structured("not json at all") {
///     ParsedPayload::Unparsed { preview, .. } => assert_eq!(preview, "not json at all"),
///     ParsedPayload::Document(_) => unreachable!(),
/// }
/// ```
pub fn parse_structured(text: &str) -> ParsedPayload {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => ParsedPayload::Document(value),
        Err(err) => ParsedPayload::Unparsed {
            preview: preview_of(text),
            detail: err.to_string(),
        },
    }
}

/// First [`RAW_PREVIEW_LIMIT`] characters, `...`-suffixed when truncated.
fn preview_of(text: &str) -> String {
    match text.char_indices().nth(RAW_PREVIEW_LIMIT) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
