/*!
 * Boundary snapshot models.
 *
 * A `StructureSnapshot` is the versioned logical skeleton of a document as
 * extracted by the external engine: metadata, styles, paragraph summaries,
 * headings, fields and tables. An `InventorySnapshot` is the raw-fragment
 * store kept verbatim for zero-information-loss round-tripping. Both are
 * created once per run and read-only afterwards; the core never mutates them.
 */

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version tag expected in `structure.v1` documents
pub const STRUCTURE_SCHEMA_VERSION: &str = "structure.v1";

/// Version tag expected in `inventory.full.v1` documents
pub const INVENTORY_SCHEMA_VERSION: &str = "inventory.full.v1";

/// Document-level metadata carried by a structure snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    /// Document title, if the engine reports one
    #[serde(default)]
    pub title: Option<String>,

    /// Author, if the engine reports one
    #[serde(default)]
    pub author: Option<String>,

    /// Last modification timestamp reported by the engine; pagination
    /// assertions require this to advance across an execution
    pub modified_time: DateTime<Utc>,

    /// Page count after the engine's last repagination
    pub page_count: i64,

    /// Word count, advisory only
    #[serde(default)]
    pub word_count: Option<i64>,
}

/// Line-spacing mode for a style rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineSpacingMode {
    Single,
    OneAndHalf,
    Double,
    Exactly,
    Multiple,
}

impl std::fmt::Display for LineSpacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Single => "single",
            Self::OneAndHalf => "one_and_half",
            Self::Double => "double",
            Self::Exactly => "exactly",
            Self::Multiple => "multiple",
        };
        f.write_str(name)
    }
}

/// One named style and the attributes the engine captured for it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleDefinition {
    /// Style name, unique within a snapshot
    pub name: String,

    /// Parent style name; unresolved parents are a warning, not an error
    #[serde(default)]
    pub based_on: Option<String>,

    /// Font used for East Asian runs
    #[serde(default)]
    pub east_asian_font: Option<String>,

    /// Font used for Latin runs
    #[serde(default)]
    pub latin_font: Option<String>,

    /// Font size in points
    #[serde(default)]
    pub size_pt: Option<f64>,

    /// Bold flag
    #[serde(default)]
    pub bold: Option<bool>,

    /// Line spacing mode
    #[serde(default)]
    pub line_spacing_mode: Option<LineSpacingMode>,

    /// Line spacing value, meaningful for exact/multiple modes
    #[serde(default)]
    pub line_spacing_value: Option<f64>,
}

/// Summary of one paragraph; previews are capped at 120 chars by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParagraphSummary {
    /// Position in the document body; unique and non-negative in a valid
    /// snapshot
    pub index: i64,

    /// Name of the applied style
    pub style: String,

    /// Truncated text preview
    #[serde(default)]
    pub preview: String,

    /// Whether the paragraph carries a heading style
    #[serde(default)]
    pub is_heading: bool,

    /// Outline level when `is_heading` is set
    #[serde(default)]
    pub heading_level: Option<i64>,
}

/// One entry of the heading outline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadingRef {
    /// Heading text as captured
    pub text: String,

    /// Outline level, 1-based
    pub level: i64,

    /// Paragraph the heading lives in; must resolve
    pub paragraph_index: i64,
}

/// A field code captured by the engine (TOC, page refs, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldRef {
    /// Field type tag, e.g. "TOC"
    pub field_type: String,

    /// Paragraph hosting the field; must resolve
    pub paragraph_index: i64,

    /// The field's last evaluated result text
    #[serde(default)]
    pub result_text: Option<String>,
}

/// A table anchor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableRef {
    /// Table position in document order
    pub index: i64,

    /// Paragraph the table is anchored at; must resolve
    pub paragraph_index: i64,

    /// Row count
    pub rows: i64,

    /// Column count
    pub cols: i64,
}

/// Immutable logical skeleton of a document at one point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureSnapshot {
    /// Always `structure.v1`
    pub schema_version: String,

    /// Document metadata
    pub metadata: DocumentMetadata,

    /// Captured styles, names unique
    #[serde(default)]
    pub styles: Vec<StyleDefinition>,

    /// Paragraph summaries in document order
    #[serde(default)]
    pub paragraphs: Vec<ParagraphSummary>,

    /// Heading outline
    #[serde(default)]
    pub headings: Vec<HeadingRef>,

    /// Captured fields
    #[serde(default)]
    pub fields: Vec<FieldRef>,

    /// Captured tables
    #[serde(default)]
    pub tables: Vec<TableRef>,
}

impl StructureSnapshot {
    /// Look up a paragraph by index
    pub fn paragraph(&self, index: i64) -> Option<&ParagraphSummary> {
        self.paragraphs.iter().find(|p| p.index == index)
    }

    /// Look up a style by name
    pub fn style(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.iter().find(|s| s.name == name)
    }

    /// Set of all paragraph indices, for cross-reference resolution
    pub fn paragraph_index_set(&self) -> HashSet<i64> {
        self.paragraphs.iter().map(|p| p.index).collect()
    }

    /// Paragraph indices that occur more than once
    pub fn duplicate_paragraph_indices(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for p in &self.paragraphs {
            if !seen.insert(p.index) && !dupes.contains(&p.index) {
                dupes.push(p.index);
            }
        }
        dupes
    }

    /// The heading outline as (text, level) pairs in document order
    pub fn heading_outline(&self) -> Vec<(&str, i64)> {
        self.headings
            .iter()
            .map(|h| (h.text.as_str(), h.level))
            .collect()
    }

    /// Headings at one specific level
    pub fn headings_at_level(&self, level: i64) -> impl Iterator<Item = &HeadingRef> {
        self.headings.iter().filter(move |h| h.level == level)
    }

    /// All TOC fields in the snapshot
    pub fn toc_fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.fields
            .iter()
            .filter(|f| f.field_type.eq_ignore_ascii_case("toc"))
    }
}

/// Media entry of the inventory, keyed by archive part path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaIndex {
    /// Engine-assigned media id
    pub media_id: String,

    /// MIME content type
    pub content_type: String,

    /// Original file extension
    #[serde(default)]
    pub file_extension: String,

    /// Payload size in bytes
    pub size_bytes: i64,
}

/// An indexed inventory entry (content control, formula, chart, note or
/// cross-reference). Unknown fields are retained verbatim so that nothing is
/// lost on round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedEntry {
    /// Entry id, non-empty in a valid inventory
    pub id: String,

    /// Position index, non-negative in a valid inventory
    pub index: i64,

    /// Everything else the engine captured, preserved as-is
    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

/// Immutable raw-fragment store for zero-information-loss round-tripping
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InventorySnapshot {
    /// Always `inventory.full.v1`
    #[serde(default)]
    pub schema_version: String,

    /// Raw markup fragments keyed by archive part path
    #[serde(default)]
    pub ooxml_fragments: BTreeMap<String, String>,

    /// Media entries keyed by archive part path
    #[serde(default)]
    pub media_indexes: BTreeMap<String, MediaIndex>,

    /// Content controls
    #[serde(default)]
    pub content_controls: Vec<IndexedEntry>,

    /// Formulas
    #[serde(default)]
    pub formulas: Vec<IndexedEntry>,

    /// Charts
    #[serde(default)]
    pub charts: Vec<IndexedEntry>,

    /// Footnotes
    #[serde(default)]
    pub footnotes: Vec<IndexedEntry>,

    /// Endnotes
    #[serde(default)]
    pub endnotes: Vec<IndexedEntry>,

    /// Cross-references
    #[serde(default)]
    pub cross_references: Vec<IndexedEntry>,
}

impl InventorySnapshot {
    /// All indexed entry groups with their group name, in a fixed order
    pub fn indexed_groups(&self) -> [(&'static str, &[IndexedEntry]); 6] {
        [
            ("content_controls", self.content_controls.as_slice()),
            ("formulas", self.formulas.as_slice()),
            ("charts", self.charts.as_slice()),
            ("footnotes", self.footnotes.as_slice()),
            ("endnotes", self.endnotes.as_slice()),
            ("cross_references", self.cross_references.as_slice()),
        ]
    }

    /// Total number of preserved items across all groups
    pub fn item_count(&self) -> usize {
        self.ooxml_fragments.len()
            + self.media_indexes.len()
            + self
                .indexed_groups()
                .iter()
                .map(|(_, entries)| entries.len())
                .sum::<usize>()
    }
}
