//! Canonical model type definitions for the extracted UI layer.
//!
//! This module defines the entity set an extraction run produces: report
//! pages, visual widgets, filters, bookmarks, and custom-visual descriptors,
//! plus the run metadata that travels with them. The types are designed for
//! serialization with [`serde`] and round-trip through JSON, YAML, and the
//! SQLite projection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::issue::RunIssue;

/// Version of the canonical model contract (semver).
///
/// Embedded in every serialized [`UiModel`] to track compatibility across
/// model revisions.
pub const MODEL_CONTRACT_VERSION: &str = "1.0.0";

/// A report page and the entities it owns.
///
/// Pages are identified by their internal name (e.g., `ReportSection1`);
/// the display name shown to report consumers is optional and frequently
/// absent in older producing-application versions.
///
/// # Examples
///
/// ```
/// use pbix_extract_core::Page;
///
/// let page = Page::new("ReportSection1")
///     .with_display_name("Overview")
///     .with_ordinal(0);
/// assert_eq!(page.display_label(), "Overview");
/// assert!(page.visible);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Internal page name; the identity key for dedup and projection.
    pub name: String,
    /// Human-facing page title, when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Position of the page among its siblings.
    pub ordinal: i64,
    /// Page canvas width in pixels (0 when undeclared).
    pub width: f64,
    /// Page canvas height in pixels (0 when undeclared).
    pub height: f64,
    /// Whether the page is shown in view mode.
    pub visible: bool,
    /// Opaque background/style payload, preserved as found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<serde_json::Value>,
    /// Ids of visuals resolved onto this page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visual_ids: Vec<String>,
    /// Filters discovered on this page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

impl Page {
    /// Creates a page with the given internal name.
    ///
    /// Pages start visible, at ordinal 0, with zero dimensions.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: None,
            ordinal: 0,
            width: 0.0,
            height: 0.0,
            visible: true,
            background: None,
            visual_ids: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    /// Sets the ordinal position.
    pub fn with_ordinal(mut self, ordinal: i64) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Sets the canvas dimensions.
    pub fn with_dimensions(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Returns the display name, falling back to the internal name.
    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Position and size of a visual on its page canvas.
///
/// All fields default to 0 when the source omits them. Position and size are
/// rounded to one decimal place for display stability.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Stacking order; higher values render on top.
    pub z: f64,
}

impl Geometry {
    /// Creates a geometry with every coordinate rounded to one decimal place.
    ///
    /// # Examples
    ///
    /// ```
    /// use pbix_extract_core::Geometry;
    ///
    /// let g = Geometry::rounded(10.04, 20.06, 300.0, 200.0, 1.0);
    /// assert_eq!(g.x, 10.0);
    /// assert_eq!(g.y, 20.1);
    /// ```
    pub fn rounded(x: f64, y: f64, width: f64, height: f64, z: f64) -> Self {
        Self {
            x: round1(x),
            y: round1(y),
            width: round1(width),
            height: round1(height),
            z: round1(z),
        }
    }

    /// Canvas area covered by the visual.
    pub fn footprint(&self) -> f64 {
        self.width * self.height
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// An association between a visual's display role and a data field.
///
/// # Examples
///
/// ```
/// use pbix_extract_core::DataRoleBinding;
///
/// let binding = DataRoleBinding::new("Category", "Sales.Category");
/// assert_eq!(binding.role, "Category");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRoleBinding {
    /// Display role name (axis, legend, values, ...).
    pub role: String,
    /// Field reference text (query reference when available).
    pub field: String,
}

impl DataRoleBinding {
    /// Creates a binding.
    pub fn new(role: &str, field: &str) -> Self {
        Self {
            role: role.to_string(),
            field: field.to_string(),
        }
    }
}

/// A named formatting-property group, preserved opaquely.
///
/// Groups are not interpreted beyond the text/bookmark literal probes; the
/// payload keeps whatever shape the source had.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyGroup {
    /// Group name (e.g., `text`, `visualLink`, `background`).
    pub name: String,
    /// Raw group payload.
    pub properties: serde_json::Value,
}

/// A visual widget discovered on (or near) a report page.
///
/// Identity may be synthesized when the source declares none; the page
/// association stays `None` until resolution and may legitimately remain
/// `None` for orphaned visuals.
///
/// # Examples
///
/// ```
/// use pbix_extract_core::{Geometry, Visual};
///
/// let visual = Visual::new("vc1", "barChart", "Bar Chart")
///     .with_geometry(Geometry::rounded(0.0, 0.0, 640.0, 480.0, 0.0));
/// assert_eq!(visual.canonical_type, "Bar Chart");
/// assert!(visual.page.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visual {
    /// Visual identity, unique within its page.
    pub id: String,
    /// Raw type code as found in the source (empty when unreadable).
    pub raw_type: String,
    /// Canonical human-readable type name.
    pub canonical_type: String,
    /// Owning page name once resolved; `None` while (or if never) resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Canvas placement.
    pub geometry: Geometry,
    /// Field bindings by display role.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_roles: Vec<DataRoleBinding>,
    /// Opaque formatting-property groups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_groups: Vec<PropertyGroup>,
    /// Literal text content for text-bearing visuals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// Bookmark/action navigation target, when the visual triggers one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_target: Option<String>,
    /// Size of the raw configuration payload in bytes (diagnostic only).
    pub config_size: usize,
    /// Structural path where the visual was discovered (diagnostic only).
    pub discovery_path: String,
}

impl Visual {
    /// Creates a visual with the given identity and type names.
    pub fn new(id: &str, raw_type: &str, canonical_type: &str) -> Self {
        Self {
            id: id.to_string(),
            raw_type: raw_type.to_string(),
            canonical_type: canonical_type.to_string(),
            page: None,
            geometry: Geometry::default(),
            data_roles: Vec::new(),
            property_groups: Vec::new(),
            text_content: None,
            bookmark_target: None,
            config_size: 0,
            discovery_path: String::new(),
        }
    }

    /// Sets the canvas placement.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Sets the structural discovery path.
    pub fn with_discovery_path(mut self, path: &str) -> Self {
        self.discovery_path = path.to_string();
        self
    }

    /// Whether this visual carries a bookmark/action link.
    pub fn has_bookmark(&self) -> bool {
        self.bookmark_target.is_some()
    }

    /// Whether this visual carries literal text content.
    pub fn has_text(&self) -> bool {
        self.text_content
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

/// A filter record surfaced from the document.
///
/// Filter payloads are not decoded; only their existence and location are
/// captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    /// Structural path of the `filters` list element.
    pub path: String,
    /// Opaque filter payload.
    pub payload: serde_json::Value,
}

impl Filter {
    /// Creates a filter record.
    pub fn new(path: &str, payload: serde_json::Value) -> Self {
        Self {
            path: path.to_string(),
            payload,
        }
    }
}

/// A bookmark/action link carried by a visual.
///
/// # Examples
///
/// ```
/// use pbix_extract_core::Bookmark;
///
/// let bookmark = Bookmark::new("BM1", "vc1", "Action Button");
/// assert_eq!(bookmark.target, "BM1");
/// assert!(bookmark.page.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    /// Navigation target identifier.
    pub target: String,
    /// Id of the visual that triggers the bookmark.
    pub visual_id: String,
    /// Canonical type of the originating visual.
    pub visual_type: String,
    /// Originating page name (best effort).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl Bookmark {
    /// Creates a bookmark record.
    pub fn new(target: &str, visual_id: &str, visual_type: &str) -> Self {
        Self {
            target: target.to_string(),
            visual_id: visual_id.to_string(),
            visual_type: visual_type.to_string(),
            page: None,
        }
    }
}

/// Descriptor for a custom-visual member bundled in the container.
///
/// Parseable descriptors carry a declared name/version; binary assets and
/// unparseable descriptors keep only their path and size, with
/// `parse_failed` marking the latter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomVisualDescriptor {
    /// Container member path.
    pub member_path: String,
    /// Declared visual name, when parseable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Declared visual version, when parseable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Member size in bytes.
    pub size: u64,
    /// True when the member could not be parsed as a descriptor.
    pub parse_failed: bool,
}

impl CustomVisualDescriptor {
    /// Creates a parsed descriptor.
    pub fn parsed(member_path: &str, name: Option<String>, version: Option<String>, size: u64) -> Self {
        Self {
            member_path: member_path.to_string(),
            name,
            version,
            size,
            parse_failed: false,
        }
    }

    /// Creates a size+path record for a member that could not be parsed.
    pub fn unparsed(member_path: &str, size: u64) -> Self {
        Self {
            member_path: member_path.to_string(),
            name: None,
            version: None,
            size,
            parse_failed: true,
        }
    }
}

/// Metadata describing one extraction run.
///
/// Created fresh for every run; entity counts are filled by the assembler
/// after merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionRun {
    /// Path of the source container.
    pub source_path: String,
    /// SHA-256 digest of the source container (hex).
    pub source_digest: String,
    /// Run start time (UTC, RFC 3339).
    pub started_at: String,
    /// Producing-application version string, when a version member exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_version: Option<String>,
    /// Number of pages in the assembled model.
    pub page_count: usize,
    /// Number of visuals in the assembled model.
    pub visual_count: usize,
    /// Number of filter records in the assembled model.
    pub filter_count: usize,
    /// Number of bookmarks in the assembled model.
    pub bookmark_count: usize,
    /// Number of custom-visual descriptors in the assembled model.
    pub custom_visual_count: usize,
    /// Member paths actually consumed during the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_consumed: Vec<String>,
    /// Recoverable failures encountered during the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<RunIssue>,
}

/// The unified canonical model produced by one extraction run.
///
/// Immutable once assembled: downstream consumers (artifact writers, the
/// relational projector, the summary report) read it without mutating it.
///
/// # Examples
///
/// ```
/// use pbix_extract_core::{Page, UiModel, Visual};
///
/// let mut model = UiModel::default();
/// model.pages.push(Page::new("ReportSection1"));
/// let mut visual = Visual::new("vc1", "barChart", "Bar Chart");
/// visual.page = Some("ReportSection1".into());
/// model.visuals.push(visual);
///
/// assert_eq!(model.visuals_on_page("ReportSection1").len(), 1);
/// assert!(!model.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiModel {
    /// Model contract version (populated from [`MODEL_CONTRACT_VERSION`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// Metadata for the run that produced this model.
    pub run: ExtractionRun,
    /// Report pages, ordinal order.
    pub pages: Vec<Page>,
    /// All discovered visuals, including page-less ones.
    pub visuals: Vec<Visual>,
    /// Filters not owned by any page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    /// Bookmark inventory cross-referenced from visuals.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bookmarks: Vec<Bookmark>,
    /// Custom-visual descriptors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_visuals: Vec<CustomVisualDescriptor>,
    /// Visual count per canonical type, deterministically ordered.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub visual_type_histogram: BTreeMap<String, usize>,
    /// Parsed metadata member payloads, keyed by member path (not mined).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub report_metadata: BTreeMap<String, serde_json::Value>,
}

impl UiModel {
    /// Finds a page by internal name.
    pub fn find_page(&self, name: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.name == name)
    }

    /// Finds a visual by id.
    pub fn find_visual(&self, id: &str) -> Option<&Visual> {
        self.visuals.iter().find(|visual| visual.id == id)
    }

    /// Returns the visuals resolved onto the named page.
    pub fn visuals_on_page(&self, page_name: &str) -> Vec<&Visual> {
        self.visuals
            .iter()
            .filter(|visual| visual.page.as_deref() == Some(page_name))
            .collect()
    }

    /// Whether the model holds no extracted entities at all.
    ///
    /// An empty model is a valid result (e.g., a container with no layout
    /// members), distinct from a failed run.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
            && self.visuals.is_empty()
            && self.filters.is_empty()
            && self.custom_visuals.is_empty()
    }
}
