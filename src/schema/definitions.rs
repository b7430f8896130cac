/*!
 * Embedded JSON-schema definitions for the three boundary documents.
 *
 * The schemas are compiled once at startup; corruption here is a programming
 * error and fails fast, unlike per-call input which is always reported as an
 * ordinary validation outcome.
 */

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::DocumentKind;

/// Draft-07 schema for `structure.v1`
pub static STRUCTURE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "structure.v1",
        "type": "object",
        "required": ["schema_version", "metadata"],
        "additionalProperties": false,
        "properties": {
            "schema_version": { "const": "structure.v1" },
            "metadata": {
                "type": "object",
                "required": ["modified_time", "page_count"],
                "properties": {
                    "title": { "type": ["string", "null"] },
                    "author": { "type": ["string", "null"] },
                    "modified_time": { "type": "string" },
                    "page_count": { "type": "integer" },
                    "word_count": { "type": ["integer", "null"] }
                }
            },
            "styles": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string" },
                        "based_on": { "type": ["string", "null"] },
                        "east_asian_font": { "type": ["string", "null"] },
                        "latin_font": { "type": ["string", "null"] },
                        "size_pt": { "type": ["number", "null"] },
                        "bold": { "type": ["boolean", "null"] },
                        "line_spacing_mode": {
                            "enum": ["single", "one_and_half", "double", "exactly", "multiple", null]
                        },
                        "line_spacing_value": { "type": ["number", "null"] }
                    }
                }
            },
            "paragraphs": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["index", "style"],
                    "properties": {
                        "index": { "type": "integer" },
                        "style": { "type": "string" },
                        "preview": { "type": "string", "maxLength": 120 },
                        "is_heading": { "type": "boolean" },
                        "heading_level": { "type": ["integer", "null"] }
                    }
                }
            },
            "headings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["text", "level", "paragraph_index"],
                    "properties": {
                        "text": { "type": "string" },
                        "level": { "type": "integer" },
                        "paragraph_index": { "type": "integer" }
                    }
                }
            },
            "fields": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["field_type", "paragraph_index"],
                    "properties": {
                        "field_type": { "type": "string" },
                        "paragraph_index": { "type": "integer" },
                        "result_text": { "type": ["string", "null"] }
                    }
                }
            },
            "tables": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["index", "paragraph_index", "rows", "cols"],
                    "properties": {
                        "index": { "type": "integer" },
                        "paragraph_index": { "type": "integer" },
                        "rows": { "type": "integer" },
                        "cols": { "type": "integer" }
                    }
                }
            }
        }
    })
});

/// Draft-07 schema for `plan.v1`. The operation tag enum here is the
/// structural gate; the whitelist is re-checked semantically and again by the
/// enforcer, so a schema edit alone can never widen the vocabulary.
pub static PLAN_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "plan.v1",
        "type": "object",
        "required": ["schema_version", "ops"],
        "additionalProperties": false,
        "properties": {
            "schema_version": { "const": "plan.v1" },
            "ops": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["operation_type"],
                    "properties": {
                        "operation_type": {
                            "enum": [
                                "delete_section_by_heading",
                                "update_toc",
                                "delete_toc",
                                "set_style_rule",
                                "reassign_paragraphs_to_style",
                                "clear_direct_formatting"
                            ]
                        }
                    },
                    "allOf": [
                        {
                            "if": {
                                "required": ["operation_type"],
                                "properties": { "operation_type": { "const": "delete_section_by_heading" } }
                            },
                            "then": {
                                "required": ["heading_text", "level"],
                                "properties": {
                                    "heading_text": { "type": "string" },
                                    "level": { "type": "integer" },
                                    "match": { "enum": ["EXACT", "CONTAINS", "REGEX"] }
                                }
                            }
                        },
                        {
                            "if": {
                                "required": ["operation_type"],
                                "properties": { "operation_type": { "const": "update_toc" } }
                            },
                            "then": {
                                "properties": {
                                    "max_level": { "type": ["integer", "null"] }
                                }
                            }
                        },
                        {
                            "if": {
                                "required": ["operation_type"],
                                "properties": { "operation_type": { "const": "set_style_rule" } }
                            },
                            "then": {
                                "required": ["style_name"],
                                "properties": {
                                    "style_name": { "type": "string" },
                                    "east_asian_font": { "type": ["string", "null"] },
                                    "latin_font": { "type": ["string", "null"] },
                                    "size_pt": { "type": ["number", "null"] },
                                    "bold": { "type": ["boolean", "null"] },
                                    "line_spacing_mode": {
                                        "enum": ["single", "one_and_half", "double", "exactly", "multiple", null]
                                    },
                                    "line_spacing_value": { "type": ["number", "null"] }
                                }
                            }
                        },
                        {
                            "if": {
                                "required": ["operation_type"],
                                "properties": { "operation_type": { "const": "reassign_paragraphs_to_style" } }
                            },
                            "then": {
                                "required": ["from_style", "to_style"],
                                "properties": {
                                    "from_style": { "type": "string" },
                                    "to_style": { "type": "string" }
                                }
                            }
                        },
                        {
                            "if": {
                                "required": ["operation_type"],
                                "properties": { "operation_type": { "const": "clear_direct_formatting" } }
                            },
                            "then": {
                                "properties": {
                                    "scope": { "enum": ["document", "body"] },
                                    "authorization_required": { "type": "boolean" }
                                }
                            }
                        }
                    ]
                }
            }
        }
    })
});

/// Draft-07 schema for `inventory.full.v1`. Deliberately loose on payload
/// shapes: the inventory is a verbatim store, and the detailed id/index/size
/// rules run in the semantic layer.
pub static INVENTORY_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "inventory.full.v1",
        "type": "object",
        "required": ["schema_version"],
        "properties": {
            "schema_version": { "const": "inventory.full.v1" },
            "ooxml_fragments": { "type": "object" },
            "media_indexes": { "type": "object" },
            "content_controls": { "type": "array" },
            "formulas": { "type": "array" },
            "charts": { "type": "array" },
            "footnotes": { "type": "array" },
            "endnotes": { "type": "array" },
            "cross_references": { "type": "array" }
        }
    })
});

/// Schema definition for one document kind
pub fn schema_for(kind: DocumentKind) -> &'static Value {
    match kind {
        DocumentKind::Structure => &STRUCTURE_SCHEMA,
        DocumentKind::Plan => &PLAN_SCHEMA,
        DocumentKind::Inventory => &INVENTORY_SCHEMA,
    }
}
