//! Report container access.
//!
//! A Power BI report file is a ZIP archive of undocumented members. This
//! crate provides the input layer of the extraction pipeline:
//!
//! - [`ContainerReader`] — opens the archive, lists members, reads member
//!   bytes (stored and DEFLATE compression).
//! - [`classify_member`] / [`MemberKind`] — substring-marker routing of
//!   members into layout / metadata / custom-visual / version / other.
//! - [`decode`] — the fixed-priority encoding cascade (UTF-16LE → UTF-8 →
//!   lossy) for payloads that never declare their encoding.
//! - [`parse_structured`] — strict JSON parsing with a truncated raw-text
//!   fallback so an unparsable member degrades instead of failing the run.
//! - [`ArchiveBuilder`] — a minimal writer used to synthesize containers in
//!   tests.
//!
//! # Example
//!
//! ```
//! use pbix_extract_container::*;
//!
//! // Layout members are UTF-16LE in real containers.
//! let layout: Vec<u8> = "{\"sections\": []}".encode_utf16().flat_map(u16::to_le_bytes).collect();
//! let bytes = ArchiveBuilder::new()
//!     .stored("Report/Layout", &layout)
//!     .finish();
//!
//! let reader = ContainerReader::from_bytes(bytes).unwrap();
//! let member = &reader.members_of_kind(MemberKind::Layout)[0];
//! let decoded = decode(&reader.read_member(&member.path).unwrap()).unwrap();
//! assert_eq!(decoded.encoding, Encoding::Utf16Le);
//! assert!(parse_structured(&decoded.text).document().is_some());
//! ```

mod archive;
mod encoding;
mod error;
mod reader;

pub use archive::ArchiveBuilder;
pub use encoding::{
    DecodeError, Decoded, Encoding, ParsedPayload, RAW_PREVIEW_LIMIT, decode, parse_structured,
};
pub use error::{ContainerError, Result};
pub use reader::{ContainerReader, MemberInfo, MemberKind, classify_member};
