/*!
 * In-memory document engine.
 *
 * Operates on a JSON bundle file of the form
 * `{"structure": ..., "inventory": ..., "direct_formatting": [...]}`.
 * The structure object is the document: paragraphs, headings, fields and
 * styles are mutated directly and written back on save. Used by the CLI
 * for dry runs against captured snapshots and by the integration tests as
 * a fully honest backend (real NOOP detection, real renumbering, a real
 * modification timestamp).
 */

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use log::{debug, info};
use regex::Regex;
use serde_json::{json, Value};

use crate::engine::{DocumentEngine, OperationOutcome};
use crate::errors::EngineError;
use crate::plan::{AtomicOperation, ClearScope, MatchMode, OperationKind};
use crate::recovery::RevisionStrategy;
use crate::snapshot::{StructureSnapshot, INVENTORY_SCHEMA_VERSION};

/// Paragraphs per synthesized page, used for page counts and TOC page
/// numbers
const PARAGRAPHS_PER_PAGE: usize = 20;

/// One open bundle document
pub struct MemoryDoc {
    path: PathBuf,
    structure: StructureSnapshot,
    inventory: Value,
    /// Paragraph indices carrying direct-formatting overrides
    direct_formatting: Vec<i64>,
    changes: usize,
}

impl MemoryDoc {
    fn load(path: &Path) -> Result<Self, EngineError> {
        let open_failed = |reason: String| EngineError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };
        let body = fs::read_to_string(path).map_err(|e| open_failed(e.to_string()))?;
        let bundle: Value =
            serde_json::from_str(&body).map_err(|e| open_failed(format!("not valid JSON: {}", e)))?;
        let structure_value = bundle
            .get("structure")
            .ok_or_else(|| open_failed("bundle has no structure object".to_string()))?;
        let structure: StructureSnapshot = serde_json::from_value(structure_value.clone())
            .map_err(|e| open_failed(format!("structure does not decode: {}", e)))?;
        let inventory = bundle
            .get("inventory")
            .cloned()
            .unwrap_or_else(|| json!({ "schema_version": INVENTORY_SCHEMA_VERSION }));
        let direct_formatting = match bundle.get("direct_formatting") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| open_failed(format!("direct_formatting does not decode: {}", e)))?,
            None => Vec::new(),
        };
        Ok(Self {
            path: path.to_path_buf(),
            structure,
            inventory,
            direct_formatting,
            changes: 0,
        })
    }

    fn page_of(paragraph_index: i64) -> i64 {
        paragraph_index / PARAGRAPHS_PER_PAGE as i64 + 1
    }

    fn delete_section(
        &mut self,
        heading_text: &str,
        level: i64,
        mode: MatchMode,
    ) -> Result<OperationOutcome, EngineError> {
        let pattern = match mode {
            MatchMode::Regex => Some(Regex::new(heading_text).map_err(|e| {
                EngineError::DispatchFailed {
                    operation: OperationKind::DeleteSectionByHeading,
                    reason: format!("match pattern does not compile: {}", e),
                }
            })?),
            _ => None,
        };
        let is_match = |text: &str| match mode {
            MatchMode::Exact => text == heading_text,
            MatchMode::Contains => text.contains(heading_text),
            MatchMode::Regex => pattern.as_ref().is_some_and(|re| re.is_match(text)),
        };

        // first heading at exactly this level whose text matches
        let Some(start) = self
            .structure
            .headings
            .iter()
            .filter(|h| h.level == level && is_match(&h.text))
            .map(|h| h.paragraph_index)
            .min()
        else {
            return Ok(OperationOutcome::noop(format!(
                "no level-{} heading matched \"{}\" ({})",
                level, heading_text, mode
            )));
        };
        // the section runs until the next heading of the same or higher rank
        let end = self
            .structure
            .headings
            .iter()
            .filter(|h| h.paragraph_index > start && h.level <= level)
            .map(|h| h.paragraph_index)
            .min()
            .unwrap_or(i64::MAX);

        let matched_text = self
            .structure
            .headings
            .iter()
            .find(|h| h.paragraph_index == start)
            .map(|h| h.text.clone())
            .unwrap_or_else(|| heading_text.to_string());

        let before = self.structure.paragraphs.len();
        self.structure
            .paragraphs
            .retain(|p| p.index < start || p.index >= end);
        let removed = before - self.structure.paragraphs.len();
        self.renumber();
        self.changes += 1;
        Ok(OperationOutcome::applied(format!(
            "deleted {} paragraph(s) in section \"{}\"",
            removed, matched_text
        )))
    }

    fn update_toc(&mut self, max_level: Option<i64>) -> OperationOutcome {
        let depth = max_level.unwrap_or(3);
        let body = self
            .structure
            .headings
            .iter()
            .filter(|h| h.level <= depth)
            .map(|h| format!("{}\t{}", h.text, Self::page_of(h.paragraph_index)))
            .collect::<Vec<_>>()
            .join("\n");

        let mut total = 0;
        let mut touched = 0;
        for field in &mut self.structure.fields {
            if !field.field_type.eq_ignore_ascii_case("toc") {
                continue;
            }
            total += 1;
            if field.result_text.as_deref() != Some(body.as_str()) {
                field.result_text = Some(body.clone());
                touched += 1;
            }
        }
        if total == 0 {
            return OperationOutcome::noop("document has no TOC fields");
        }
        if touched == 0 {
            return OperationOutcome::noop(format!("{} TOC field(s) already current", total));
        }
        self.changes += 1;
        OperationOutcome::applied(format!(
            "refreshed {} of {} TOC field(s) to depth {}",
            touched, total, depth
        ))
    }

    fn delete_toc(&mut self) -> OperationOutcome {
        let mut anchors: Vec<i64> = self
            .structure
            .fields
            .iter()
            .filter(|f| f.field_type.eq_ignore_ascii_case("toc"))
            .map(|f| f.paragraph_index)
            .collect();
        if anchors.is_empty() {
            return OperationOutcome::noop("document has no TOC fields");
        }
        anchors.sort_unstable();
        anchors.dedup();

        let removed = anchors.len();
        self.structure
            .fields
            .retain(|f| !f.field_type.eq_ignore_ascii_case("toc"));
        self.structure
            .paragraphs
            .retain(|p| !anchors.contains(&p.index));
        self.renumber();
        self.changes += 1;
        OperationOutcome::applied(format!("deleted {} TOC field(s)", removed))
    }

    #[allow(clippy::too_many_arguments)]
    fn set_style_rule(
        &mut self,
        style_name: &str,
        east_asian_font: &Option<String>,
        latin_font: &Option<String>,
        size_pt: Option<f64>,
        bold: Option<bool>,
        line_spacing_mode: Option<crate::snapshot::LineSpacingMode>,
        line_spacing_value: Option<f64>,
    ) -> OperationOutcome {
        let Some(style) = self
            .structure
            .styles
            .iter_mut()
            .find(|s| s.name == style_name)
        else {
            return OperationOutcome::noop(format!("style \"{}\" does not exist", style_name));
        };

        let mut touched = 0;
        if let Some(font) = east_asian_font {
            if style.east_asian_font.as_deref() != Some(font.as_str()) {
                style.east_asian_font = Some(font.clone());
                touched += 1;
            }
        }
        if let Some(font) = latin_font {
            if style.latin_font.as_deref() != Some(font.as_str()) {
                style.latin_font = Some(font.clone());
                touched += 1;
            }
        }
        if let Some(size) = size_pt {
            if style.size_pt != Some(size) {
                style.size_pt = Some(size);
                touched += 1;
            }
        }
        if let Some(flag) = bold {
            if style.bold != Some(flag) {
                style.bold = Some(flag);
                touched += 1;
            }
        }
        if let Some(mode) = line_spacing_mode {
            if style.line_spacing_mode != Some(mode) {
                style.line_spacing_mode = Some(mode);
                touched += 1;
            }
        }
        if let Some(value) = line_spacing_value {
            if style.line_spacing_value != Some(value) {
                style.line_spacing_value = Some(value);
                touched += 1;
            }
        }

        if touched == 0 {
            return OperationOutcome::noop(format!("style \"{}\" already matches", style_name));
        }
        self.changes += 1;
        OperationOutcome::applied(format!(
            "updated {} field(s) on style \"{}\"",
            touched, style_name
        ))
    }

    fn reassign_paragraphs(
        &mut self,
        from_style: &str,
        to_style: &str,
    ) -> Result<OperationOutcome, EngineError> {
        if self.structure.style(to_style).is_none() {
            return Err(EngineError::DispatchFailed {
                operation: OperationKind::ReassignParagraphsToStyle,
                reason: format!("target style \"{}\" does not exist", to_style),
            });
        }
        let mut moved = 0;
        for paragraph in &mut self.structure.paragraphs {
            if paragraph.style == from_style {
                paragraph.style = to_style.to_string();
                moved += 1;
            }
        }
        if moved == 0 {
            return Ok(OperationOutcome::noop(format!(
                "no paragraph uses style \"{}\"",
                from_style
            )));
        }
        self.changes += 1;
        Ok(OperationOutcome::applied(format!(
            "moved {} paragraph(s) from \"{}\" to \"{}\"",
            moved, from_style, to_style
        )))
    }

    fn clear_direct_formatting(&mut self, scope: ClearScope) -> OperationOutcome {
        // authorization was enforced before dispatch; the memory model has
        // a single story, so both scopes cover every paragraph
        if self.direct_formatting.is_empty() {
            return OperationOutcome::noop("no direct formatting to clear");
        }
        let cleared = self.direct_formatting.len();
        self.direct_formatting.clear();
        self.changes += 1;
        OperationOutcome::applied(format!(
            "cleared direct formatting from {} paragraph(s) ({} scope)",
            cleared, scope
        ))
    }

    /// Rebuild contiguous paragraph indices after a deletion and retarget
    /// every reference
    fn renumber(&mut self) {
        self.structure.paragraphs.sort_by_key(|p| p.index);
        let remap: HashMap<i64, i64> = self
            .structure
            .paragraphs
            .iter()
            .enumerate()
            .map(|(new_index, p)| (p.index, new_index as i64))
            .collect();

        for paragraph in &mut self.structure.paragraphs {
            if let Some(&new_index) = remap.get(&paragraph.index) {
                paragraph.index = new_index;
            }
        }
        self.structure
            .headings
            .retain(|h| remap.contains_key(&h.paragraph_index));
        for heading in &mut self.structure.headings {
            if let Some(&new_index) = remap.get(&heading.paragraph_index) {
                heading.paragraph_index = new_index;
            }
        }
        self.structure
            .fields
            .retain(|f| remap.contains_key(&f.paragraph_index));
        for field in &mut self.structure.fields {
            if let Some(&new_index) = remap.get(&field.paragraph_index) {
                field.paragraph_index = new_index;
            }
        }
        self.structure
            .tables
            .retain(|t| remap.contains_key(&t.paragraph_index));
        for table in &mut self.structure.tables {
            if let Some(&new_index) = remap.get(&table.paragraph_index) {
                table.paragraph_index = new_index;
            }
        }
        self.direct_formatting.retain(|i| remap.contains_key(i));
        for index in &mut self.direct_formatting {
            if let Some(&new_index) = remap.get(index) {
                *index = new_index;
            }
        }
    }

    fn refresh_metadata(&mut self) {
        let now = Utc::now();
        let floor = self.structure.metadata.modified_time + Duration::seconds(1);
        self.structure.metadata.modified_time = std::cmp::max(now, floor);

        let paragraphs = self.structure.paragraphs.len();
        self.structure.metadata.page_count =
            (paragraphs.div_ceil(PARAGRAPHS_PER_PAGE)).max(1) as i64;
        self.structure.metadata.word_count = Some(
            self.structure
                .paragraphs
                .iter()
                .map(|p| p.preview.split_whitespace().count() as i64)
                .sum(),
        );
    }
}

/// Engine over JSON bundle files
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryEngine;

impl MemoryEngine {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentEngine for MemoryEngine {
    type Doc = MemoryDoc;

    /// Bundle documents carry no tracked revisions, so the strategy is
    /// recorded but has nothing to apply to.
    fn open(&self, path: &Path, strategy: RevisionStrategy) -> Result<Self::Doc, EngineError> {
        let doc = MemoryDoc::load(path)?;
        debug!(
            "Opened {} ({} paragraph(s), revision strategy {})",
            path.display(),
            doc.structure.paragraphs.len(),
            strategy
        );
        Ok(doc)
    }

    fn extract_structure(&self, doc: &Self::Doc) -> Result<Value, EngineError> {
        serde_json::to_value(&doc.structure).map_err(|e| EngineError::ExtractionFailed(e.to_string()))
    }

    fn extract_inventory(&self, doc: &Self::Doc) -> Result<Value, EngineError> {
        Ok(doc.inventory.clone())
    }

    fn dispatch(
        &self,
        doc: &mut Self::Doc,
        operation: &AtomicOperation,
    ) -> Result<OperationOutcome, EngineError> {
        let outcome = match operation {
            AtomicOperation::DeleteSectionByHeading {
                heading_text,
                level,
                match_mode,
            } => doc.delete_section(heading_text, *level, *match_mode)?,
            AtomicOperation::UpdateToc { max_level } => doc.update_toc(*max_level),
            AtomicOperation::DeleteToc => doc.delete_toc(),
            AtomicOperation::SetStyleRule {
                style_name,
                east_asian_font,
                latin_font,
                size_pt,
                bold,
                line_spacing_mode,
                line_spacing_value,
            } => doc.set_style_rule(
                style_name,
                east_asian_font,
                latin_font,
                *size_pt,
                *bold,
                *line_spacing_mode,
                *line_spacing_value,
            ),
            AtomicOperation::ReassignParagraphsToStyle {
                from_style,
                to_style,
            } => doc.reassign_paragraphs(from_style, to_style)?,
            AtomicOperation::ClearDirectFormatting { scope, .. } => {
                doc.clear_direct_formatting(*scope)
            }
        };
        debug!("{}: {}", operation.kind(), outcome.detail);
        Ok(outcome)
    }

    fn save(&self, doc: &mut Self::Doc) -> Result<(), EngineError> {
        doc.refresh_metadata();
        let bundle = json!({
            "structure": serde_json::to_value(&doc.structure)
                .map_err(|e| EngineError::PersistFailed(e.to_string()))?,
            "inventory": doc.inventory,
            "direct_formatting": doc.direct_formatting,
        });
        let body = serde_json::to_string_pretty(&bundle)
            .map_err(|e| EngineError::PersistFailed(e.to_string()))?;
        fs::write(&doc.path, body)
            .map_err(|e| EngineError::PersistFailed(format!("{}: {}", doc.path.display(), e)))?;
        info!(
            "Saved {} ({} change(s) applied)",
            doc.path.display(),
            doc.changes
        );
        Ok(())
    }
}
