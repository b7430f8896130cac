/*!
 * Plan data model.
 *
 * A plan is an ordered sequence of atomic operations drawn from a closed
 * six-operation vocabulary. Plans arrive as untrusted JSON from the planner,
 * are validated and enforced, and are never mutated in place. They are inert
 * data; nothing in a plan is ever interpreted as code.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::snapshot::LineSpacingMode;

/// Version tag expected in `plan.v1` documents
pub const PLAN_SCHEMA_VERSION: &str = "plan.v1";

/// Discriminant for the six whitelisted operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    DeleteSectionByHeading,
    UpdateToc,
    DeleteToc,
    SetStyleRule,
    ReassignParagraphsToStyle,
    ClearDirectFormatting,
}

impl OperationKind {
    /// The full whitelist, in canonical order
    pub const WHITELIST: [OperationKind; 6] = [
        OperationKind::DeleteSectionByHeading,
        OperationKind::UpdateToc,
        OperationKind::DeleteToc,
        OperationKind::SetStyleRule,
        OperationKind::ReassignParagraphsToStyle,
        OperationKind::ClearDirectFormatting,
    ];

    /// Wire tag for this operation
    pub fn tag(&self) -> &'static str {
        match self {
            Self::DeleteSectionByHeading => "delete_section_by_heading",
            Self::UpdateToc => "update_toc",
            Self::DeleteToc => "delete_toc",
            Self::SetStyleRule => "set_style_rule",
            Self::ReassignParagraphsToStyle => "reassign_paragraphs_to_style",
            Self::ClearDirectFormatting => "clear_direct_formatting",
        }
    }

    /// Resolve a wire tag back to its kind, `None` for anything outside the
    /// whitelist
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::WHITELIST.into_iter().find(|kind| kind.tag() == tag)
    }

    /// All whitelisted tags, for error messages that must enumerate them
    pub fn allowed_tags() -> Vec<&'static str> {
        Self::WHITELIST.iter().map(|kind| kind.tag()).collect()
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// How a heading matcher compares text; wire values are uppercase
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchMode {
    #[default]
    Exact,
    Contains,
    Regex,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Exact => "EXACT",
            Self::Contains => "CONTAINS",
            Self::Regex => "REGEX",
        };
        f.write_str(name)
    }
}

/// Target scope of a formatting clear
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClearScope {
    #[default]
    Document,
    Body,
}

impl std::fmt::Display for ClearScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Document => "document",
            Self::Body => "body",
        };
        f.write_str(name)
    }
}

/// One atomic document edit. The union is closed: adding a variant is a
/// deliberate API change that the compiler surfaces at every match site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation_type", rename_all = "snake_case")]
pub enum AtomicOperation {
    /// Remove a section identified by its heading text and outline level
    DeleteSectionByHeading {
        heading_text: String,
        level: i64,
        #[serde(rename = "match", default)]
        match_mode: MatchMode,
    },

    /// Refresh the table of contents field
    UpdateToc {
        #[serde(default)]
        max_level: Option<i64>,
    },

    /// Remove the table of contents field entirely
    DeleteToc,

    /// Change attributes of one named style
    SetStyleRule {
        style_name: String,
        #[serde(default)]
        east_asian_font: Option<String>,
        #[serde(default)]
        latin_font: Option<String>,
        #[serde(default)]
        size_pt: Option<f64>,
        #[serde(default)]
        bold: Option<bool>,
        #[serde(default)]
        line_spacing_mode: Option<LineSpacingMode>,
        #[serde(default)]
        line_spacing_value: Option<f64>,
    },

    /// Move every paragraph from one style to another
    ReassignParagraphsToStyle {
        from_style: String,
        to_style: String,
    },

    /// Strip direct (non-style) formatting; requires explicit authorization
    ClearDirectFormatting {
        #[serde(default)]
        scope: ClearScope,
        #[serde(default)]
        authorization_required: bool,
    },
}

impl AtomicOperation {
    /// Discriminant of this operation
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::DeleteSectionByHeading { .. } => OperationKind::DeleteSectionByHeading,
            Self::UpdateToc { .. } => OperationKind::UpdateToc,
            Self::DeleteToc => OperationKind::DeleteToc,
            Self::SetStyleRule { .. } => OperationKind::SetStyleRule,
            Self::ReassignParagraphsToStyle { .. } => OperationKind::ReassignParagraphsToStyle,
            Self::ClearDirectFormatting { .. } => OperationKind::ClearDirectFormatting,
        }
    }

    /// Short human-readable description for logs and audit records
    pub fn describe(&self) -> String {
        match self {
            Self::DeleteSectionByHeading {
                heading_text,
                level,
                match_mode,
            } => format!(
                "delete_section_by_heading(\"{}\", level {}, {})",
                heading_text, level, match_mode
            ),
            Self::UpdateToc { max_level: Some(level) } => {
                format!("update_toc(max_level {})", level)
            }
            Self::UpdateToc { max_level: None } => "update_toc".to_string(),
            Self::DeleteToc => "delete_toc".to_string(),
            Self::SetStyleRule { style_name, .. } => {
                format!("set_style_rule(\"{}\")", style_name)
            }
            Self::ReassignParagraphsToStyle { from_style, to_style } => format!(
                "reassign_paragraphs_to_style(\"{}\" -> \"{}\")",
                from_style, to_style
            ),
            Self::ClearDirectFormatting { scope, .. } => {
                format!("clear_direct_formatting({})", scope)
            }
        }
    }
}

impl std::fmt::Display for AtomicOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// An ordered, inert sequence of atomic operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Always `plan.v1`
    pub schema_version: String,

    /// Operations in execution order
    pub ops: Vec<AtomicOperation>,
}

impl Plan {
    /// Build a plan with the current schema version
    pub fn new(ops: Vec<AtomicOperation>) -> Self {
        Self {
            schema_version: PLAN_SCHEMA_VERSION.to_string(),
            ops,
        }
    }

    /// Typed view of an untrusted JSON value; a parse failure here means the
    /// value never passed schema validation
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Operation kinds in execution order
    pub fn kinds(&self) -> Vec<OperationKind> {
        self.ops.iter().map(|op| op.kind()).collect()
    }
}
