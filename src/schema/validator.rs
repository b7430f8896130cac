/*!
 * Two-layer boundary document validator.
 *
 * Layer one is JSON-schema conformance against the embedded definitions.
 * Layer two runs semantic checks that schemas cannot express (uniqueness,
 * cross-reference resolution, field bounds) and only runs once the document
 * is structurally sound. Both layers fold into one `ValidationResult`;
 * `validate` never fails for bad input, it reports.
 */

use jsonschema::Validator;
use log::debug;
use serde_json::Value;

use crate::errors::PipelineError;
use crate::plan::{AtomicOperation, OperationKind, Plan};
use crate::report::ValidationResult;
use crate::snapshot::StructureSnapshot;

use super::definitions;
use super::DocumentKind;

/// Validates boundary documents against the embedded `*.v1` schemas plus the
/// semantic rules of each kind.
pub struct SchemaValidator {
    structure: Validator,
    plan: Validator,
    inventory: Validator,
}

impl SchemaValidator {
    /// Compile all embedded schemas. Fails only on schema-definition
    /// corruption, which is a startup error, never a per-call outcome.
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            structure: Self::compile(DocumentKind::Structure)?,
            plan: Self::compile(DocumentKind::Plan)?,
            inventory: Self::compile(DocumentKind::Inventory)?,
        })
    }

    fn compile(kind: DocumentKind) -> Result<Validator, PipelineError> {
        jsonschema::validator_for(definitions::schema_for(kind)).map_err(|e| {
            PipelineError::Configuration(format!("embedded {} schema is corrupt: {}", kind, e))
        })
    }

    /// Validate raw text. A parse failure is reported under its own check
    /// name, distinct from schema conformance failures.
    pub fn validate_str(&self, raw: &str, kind: DocumentKind) -> ValidationResult {
        match serde_json::from_str::<Value>(raw) {
            Ok(doc) => self.validate(&doc, kind),
            Err(e) => {
                ValidationResult::failed("json_parse", format!("document is not valid JSON: {}", e))
            }
        }
    }

    /// Validate a parsed JSON document as the given kind
    pub fn validate(&self, doc: &Value, kind: DocumentKind) -> ValidationResult {
        let mut result = ValidationResult::passed();

        let validator = match kind {
            DocumentKind::Structure => &self.structure,
            DocumentKind::Plan => &self.plan,
            DocumentKind::Inventory => &self.inventory,
        };
        for error in validator.iter_errors(doc) {
            result.push_error("schema", format!("{}: {}", error.instance_path, error));
        }
        if !result.is_valid() {
            debug!(
                "{} document failed structural validation with {} error(s)",
                kind,
                result.errors.len()
            );
            return result;
        }

        match kind {
            DocumentKind::Structure => self.check_structure(doc, &mut result),
            DocumentKind::Plan => self.check_plan(doc, &mut result),
            DocumentKind::Inventory => self.check_inventory(doc, &mut result),
        }
        result
    }

    /// Semantic rules for `structure.v1`: unique non-negative indices,
    /// resolvable cross-references, advisory sequence and parent-style checks.
    fn check_structure(&self, doc: &Value, result: &mut ValidationResult) {
        let snapshot: StructureSnapshot = match serde_json::from_value(doc.clone()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                result.push_error("decode", format!("structure document failed to decode: {}", e));
                return;
            }
        };

        for p in &snapshot.paragraphs {
            if p.index < 0 {
                result.push_error("indices", format!("paragraph index {} is negative", p.index));
            }
        }
        for index in snapshot.duplicate_paragraph_indices() {
            result.push_error("indices", format!("paragraph index {} occurs more than once", index));
        }

        let known = snapshot.paragraph_index_set();
        for (i, h) in snapshot.headings.iter().enumerate() {
            if !known.contains(&h.paragraph_index) {
                result.push_error(
                    "cross_reference",
                    format!(
                        "headings[{}] \"{}\" references missing paragraph index {}",
                        i, h.text, h.paragraph_index
                    ),
                );
            }
        }
        for (i, f) in snapshot.fields.iter().enumerate() {
            if !known.contains(&f.paragraph_index) {
                result.push_error(
                    "cross_reference",
                    format!(
                        "fields[{}] ({}) references missing paragraph index {}",
                        i, f.field_type, f.paragraph_index
                    ),
                );
            }
        }
        for (i, t) in snapshot.tables.iter().enumerate() {
            if !known.contains(&t.paragraph_index) {
                result.push_error(
                    "cross_reference",
                    format!("tables[{}] references missing paragraph index {}", i, t.paragraph_index),
                );
            }
        }

        // Advisory only: engines are allowed to renumber sparsely
        let mut indices: Vec<i64> = snapshot.paragraphs.iter().map(|p| p.index).collect();
        indices.sort_unstable();
        indices.dedup();
        let sequential = indices
            .first()
            .map(|first| *first == 0 && indices.windows(2).all(|w| w[1] == w[0] + 1))
            .unwrap_or(true);
        if !sequential {
            result.push_warning("sequence", "paragraph indices are not sequential from 0");
        }

        let style_names: Vec<&str> = snapshot.styles.iter().map(|s| s.name.as_str()).collect();
        for s in &snapshot.styles {
            if let Some(parent) = &s.based_on {
                if !style_names.contains(&parent.as_str()) {
                    result.push_warning(
                        "style_parent",
                        format!("style \"{}\" is based on undefined style \"{}\"", s.name, parent),
                    );
                }
            }
        }
    }

    /// Semantic rules for `plan.v1`: whitelist membership re-checked on the
    /// raw document rather than trusting the schema enum, then field bounds
    /// on the typed model.
    fn check_plan(&self, doc: &Value, result: &mut ValidationResult) {
        let ops = doc.get("ops").and_then(Value::as_array).cloned().unwrap_or_default();
        for (i, op) in ops.iter().enumerate() {
            match op.get("operation_type").and_then(Value::as_str) {
                Some(tag) => {
                    if OperationKind::from_tag(tag).is_none() {
                        result.push_error(
                            "whitelist",
                            format!(
                                "ops[{}]: operation \"{}\" is not whitelisted; allowed operations: {}",
                                i,
                                tag,
                                OperationKind::allowed_tags().join(", ")
                            ),
                        );
                    }
                }
                None => {
                    result.push_error("whitelist", format!("ops[{}]: missing operation_type", i));
                }
            }
        }
        if !result.is_valid() {
            return;
        }

        let plan = match Plan::from_value(doc) {
            Ok(plan) => plan,
            Err(e) => {
                result.push_error("decode", format!("plan document failed to decode: {}", e));
                return;
            }
        };
        for (i, op) in plan.ops.iter().enumerate() {
            self.check_operation_bounds(i, op, result);
        }
    }

    fn check_operation_bounds(&self, i: usize, op: &AtomicOperation, result: &mut ValidationResult) {
        match op {
            AtomicOperation::DeleteSectionByHeading { heading_text, level, .. } => {
                if heading_text.trim().is_empty() {
                    result.push_error("bounds", format!("ops[{}]: heading_text must not be empty", i));
                }
                if heading_text.chars().count() > 255 {
                    result.push_error(
                        "bounds",
                        format!("ops[{}]: heading_text exceeds 255 characters", i),
                    );
                }
                if !(1..=9).contains(level) {
                    result.push_error(
                        "bounds",
                        format!("ops[{}]: level {} is outside [1, 9]", i, level),
                    );
                }
            }
            AtomicOperation::UpdateToc { max_level: Some(level) } => {
                if !(1..=9).contains(level) {
                    result.push_error(
                        "bounds",
                        format!("ops[{}]: max_level {} is outside [1, 9]", i, level),
                    );
                }
            }
            AtomicOperation::SetStyleRule { size_pt: Some(size), .. } => {
                if !(1.0..=72.0).contains(size) {
                    result.push_error(
                        "bounds",
                        format!("ops[{}]: size_pt {} is outside [1, 72]", i, size),
                    );
                }
            }
            AtomicOperation::ClearDirectFormatting { authorization_required, .. } => {
                if !authorization_required {
                    result.push_error(
                        "authorization",
                        format!(
                            "ops[{}]: clear_direct_formatting requires authorization_required=true",
                            i
                        ),
                    );
                }
            }
            _ => {}
        }
    }

    /// Semantic rules for `inventory.full.v1`, run on the raw document so
    /// that malformed payloads are named precisely.
    fn check_inventory(&self, doc: &Value, result: &mut ValidationResult) {
        if let Some(fragments) = doc.get("ooxml_fragments").and_then(Value::as_object) {
            for (path, payload) in fragments {
                if !payload.is_string() {
                    result.push_error(
                        "fragments",
                        format!("fragment \"{}\" payload must be a string", path),
                    );
                }
            }
        }

        if let Some(media) = doc.get("media_indexes").and_then(Value::as_object) {
            for (path, entry) in media {
                let media_id = entry.get("media_id").and_then(Value::as_str).unwrap_or("");
                if media_id.is_empty() {
                    result.push_error(
                        "media",
                        format!("media entry \"{}\" requires a non-empty media_id", path),
                    );
                }
                let content_type = entry.get("content_type").and_then(Value::as_str).unwrap_or("");
                if content_type.is_empty() {
                    result.push_error(
                        "media",
                        format!("media entry \"{}\" requires a non-empty content_type", path),
                    );
                }
                match entry.get("size_bytes").and_then(Value::as_i64) {
                    Some(size) if size >= 0 => {}
                    Some(size) => {
                        result.push_error(
                            "media",
                            format!("media entry \"{}\" has negative size_bytes {}", path, size),
                        );
                    }
                    None => {
                        result.push_error(
                            "media",
                            format!("media entry \"{}\" requires an integer size_bytes", path),
                        );
                    }
                }
            }
        }

        for group in [
            "content_controls",
            "formulas",
            "charts",
            "footnotes",
            "endnotes",
            "cross_references",
        ] {
            let Some(entries) = doc.get(group).and_then(Value::as_array) else {
                continue;
            };
            for (i, entry) in entries.iter().enumerate() {
                let id = entry.get("id").and_then(Value::as_str).unwrap_or("");
                if id.is_empty() {
                    result.push_error(
                        "inventory_entry",
                        format!("{}[{}] requires a non-empty id", group, i),
                    );
                }
                match entry.get("index").and_then(Value::as_i64) {
                    Some(index) if index >= 0 => {}
                    Some(index) => {
                        result.push_error(
                            "inventory_entry",
                            format!("{}[{}] has negative index {}", group, i, index),
                        );
                    }
                    None => {
                        result.push_error(
                            "inventory_entry",
                            format!("{}[{}] requires an integer index", group, i),
                        );
                    }
                }
            }
        }
    }
}
