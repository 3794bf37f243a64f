//! Container access and member classification.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::archive::{self, ZipEntry};
use crate::error::{ContainerError, Result};

/// Role a member plays in extraction, derived from its path.
///
/// Classification is substring matching only: the producing application
/// has changed member naming across versions, so no exact paths are
/// assumed. Matching is case-insensitive and first-match-wins in the order
/// layout, metadata, custom visual, version.
///
/// # Examples
///
/// ```
/// use pbix_extract_container::{MemberKind, classify_member};
///
/// assert_eq!(classify_member("Report/Layout"), MemberKind::Layout);
/// assert_eq!(classify_member("Metadata"), MemberKind::Metadata);
/// assert_eq!(classify_member("Report/CustomVisuals/chiclet/package.json"), MemberKind::CustomVisual);
/// assert_eq!(classify_member("Version"), MemberKind::Version);
/// assert_eq!(classify_member("DataModel"), MemberKind::Other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// Holds the report page/visual structure.
    Layout,
    /// Holds report-level metadata.
    Metadata,
    /// A custom-visual descriptor or asset.
    CustomVisual,
    /// Holds the producing-application version string.
    Version,
    /// Everything else; preserved as a size+path record only.
    Other,
}

impl MemberKind {
    /// Stable lowercase name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Layout => "layout",
            MemberKind::Metadata => "metadata",
            MemberKind::CustomVisual => "custom_visual",
            MemberKind::Version => "version",
            MemberKind::Other => "other",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies a member path by its substring markers.
pub fn classify_member(path: &str) -> MemberKind {
    let lower = path.to_lowercase();
    if lower.contains("layout") {
        MemberKind::Layout
    } else if lower.contains("metadata") {
        MemberKind::Metadata
    } else if lower.contains(".visual") || lower.contains("customvisuals") {
        MemberKind::CustomVisual
    } else if lower.contains("version") {
        MemberKind::Version
    } else {
        MemberKind::Other
    }
}

/// A listed member: path, uncompressed size, and classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub path: String,
    pub size: u64,
    pub kind: MemberKind,
}

/// Read access to one report container.
///
/// Opening parses the whole central directory up front; member reads then
/// decompress on demand. The reader never decodes member bytes as text
/// (that is [`decode`](crate::decode)'s job) and never assumes member
/// naming beyond [`classify_member`].
///
/// # Examples
///
/// ```
/// use pbix_extract_container::{ArchiveBuilder, ContainerReader, MemberKind};
///
/// let bytes = ArchiveBuilder::new()
///     .stored("Report/Layout", b"{\"sections\": []}")
///     .stored("Version", b"1.0")
///     .finish();
/// let reader = ContainerReader::from_bytes(bytes).unwrap();
///
/// assert_eq!(reader.member_count(), 2);
/// let layout: Vec<_> = reader.members_of_kind(MemberKind::Layout);
/// assert_eq!(layout[0].path, "Report/Layout");
/// ```
#[derive(Debug)]
pub struct ContainerReader {
    path: PathBuf,
    data: Vec<u8>,
    entries: Vec<ZipEntry>,
    by_name: HashMap<String, usize>,
}

impl ContainerReader {
    /// Opens a container file.
    ///
    /// # Errors
    ///
    /// [`ContainerError::Io`] when the file cannot be read,
    /// [`ContainerError::NotAContainer`] when no central directory is
    /// found, and [`ContainerError::Truncated`] /
    /// [`ContainerError::Zip64Unsupported`] for damaged or oversized
    /// archives.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::from_parts(path.to_path_buf(), data)
    }

    /// Builds a reader over in-memory archive bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_parts(PathBuf::from("<memory>"), data)
    }

    fn from_parts(path: PathBuf, data: Vec<u8>) -> Result<Self> {
        let eocd = archive::locate_eocd(&data).ok_or_else(|| ContainerError::NotAContainer {
            path: path.display().to_string(),
        })?;
        let entries = archive::parse_entries(&data, eocd)?;
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.name.clone(), idx))
            .collect();
        debug!(
            container = %path.display(),
            members = entries.len(),
            "opened report container"
        );
        Ok(Self {
            path,
            data,
            entries,
            by_name,
        })
    }

    /// Path the container was opened from (`<memory>` for byte readers).
    pub fn source_path(&self) -> &Path {
        &self.path
    }

    /// SHA-256 digest of the container bytes, lowercase hex.
    pub fn source_digest(&self) -> String {
        let hash = Sha256::digest(&self.data);
        format!("{:x}", hash)
    }

    /// Number of members in the container.
    pub fn member_count(&self) -> usize {
        self.entries.len()
    }

    /// All member paths, in central-directory order.
    pub fn member_paths(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// All members with sizes and classification.
    pub fn members(&self) -> Vec<MemberInfo> {
        self.entries
            .iter()
            .map(|entry| MemberInfo {
                path: entry.name.clone(),
                size: entry.uncompressed_size,
                kind: classify_member(&entry.name),
            })
            .collect()
    }

    /// Members of one classification, in central-directory order.
    pub fn members_of_kind(&self, kind: MemberKind) -> Vec<MemberInfo> {
        self.members()
            .into_iter()
            .filter(|member| member.kind == kind)
            .collect()
    }

    /// Whether a member exists.
    pub fn contains(&self, member: &str) -> bool {
        self.by_name.contains_key(member)
    }

    /// Reads one member's uncompressed bytes.
    ///
    /// # Errors
    ///
    /// [`ContainerError::MemberNotFound`] when the path is absent;
    /// decompression failures surface as [`ContainerError::Inflate`] or
    /// [`ContainerError::UnsupportedCompression`].
    pub fn read_member(&self, member: &str) -> Result<Vec<u8>> {
        let idx = self
            .by_name
            .get(member)
            .ok_or_else(|| ContainerError::MemberNotFound {
                member: member.to_string(),
            })?;
        archive::read_entry(&self.data, &self.entries[*idx])
    }
}
