/*!
 * Pure plan-level constraint checks.
 *
 * Every function here takes untrusted input and returns a
 * `ValidationResult`; none of them touch the filesystem or any shared
 * state. The whitelist is re-derived from `OperationKind` on every call so
 * the operation vocabulary has exactly one definition in the crate.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::plan::OperationKind;
use crate::report::ValidationResult;

/// Find/replace and literal-assignment idioms. Plans must express edits
/// through the operation vocabulary, never as text surgery.
static STRING_REPLACEMENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\.text\s*=",
        r"(?i)\breplace_text\b",
        r"(?i)\bfind_and_replace\b",
        r"(?i)\bsearch_and_replace\b",
        r"(?i)\.replace\(",
        r"(?i)\bre\.sub\b",
        r#"(?i)"find"\s*:"#,
        r#"(?i)"replace(ment)?"\s*:"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("string replacement pattern must compile"))
    .collect()
});

/// Primitive text/paste mutation idioms that bypass the object layer
static OBJECT_LAYER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\binsert_text\b",
        r"(?i)\bappend_text\b",
        r"(?i)\badd_run\b",
        r"(?i)\badd_paragraph\b",
        r"(?i)\binsert_paragraph\b",
        r"(?i)\bpaste\b",
        r"(?i)\bclipboard\b",
        r"(?i)\btype_text\b",
        r"(?i)\bsend_keys\b",
        r"(?i)\binner_?html\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("object layer pattern must compile"))
    .collect()
});

/// Check every operation tag against the six-operation whitelist. One error
/// per offending op, each naming the tag and enumerating the whole
/// whitelist.
pub fn validate_whitelist(plan: &Value) -> ValidationResult {
    let mut result = ValidationResult::passed();
    let Some(ops) = plan.get("ops").and_then(Value::as_array) else {
        result.push_error("whitelist", "plan has no ops array");
        return result;
    };
    for (i, op) in ops.iter().enumerate() {
        match op.get("operation_type").and_then(Value::as_str) {
            Some(tag) if OperationKind::from_tag(tag).is_some() => {}
            Some(tag) => {
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
            None => {
                result.push_error("whitelist", format!("ops[{}]: missing operation_type", i));
            }
        }
    }
    result
}

/// Scan the serialized plan for find/replace idioms. Shows at most the
/// first three matches.
pub fn validate_no_string_replacement(serialized: &str) -> ValidationResult {
    let matches = collect_matches(serialized, &STRING_REPLACEMENT_PATTERNS);
    if matches.is_empty() {
        return ValidationResult::passed();
    }
    let shown: Vec<&str> = matches.iter().take(3).map(String::as_str).collect();
    let mut message = format!(
        "plan contains string-replacement idiom(s): {}",
        shown.join(", ")
    );
    if matches.len() > 3 {
        message.push_str(&format!(" (and {} more)", matches.len() - 3));
    }
    ValidationResult::failed("string_replacement", message)
}

/// Scan the serialized plan for primitive text/paste mutation idioms
pub fn validate_object_layer_only(serialized: &str) -> ValidationResult {
    let matches = collect_matches(serialized, &OBJECT_LAYER_PATTERNS);
    if matches.is_empty() {
        return ValidationResult::passed();
    }
    ValidationResult::failed(
        "object_layer",
        format!(
            "plan contains primitive mutation idiom(s) outside the object layer: {}",
            matches.join(", ")
        ),
    )
}

/// Formatting clears are destructive and require explicit authorization in
/// the op itself; absence is treated the same as `false`.
pub fn validate_authorization(plan: &Value) -> ValidationResult {
    let mut result = ValidationResult::passed();
    let Some(ops) = plan.get("ops").and_then(Value::as_array) else {
        return result;
    };
    for (i, op) in ops.iter().enumerate() {
        let tag = op.get("operation_type").and_then(Value::as_str);
        if tag != Some(OperationKind::ClearDirectFormatting.tag()) {
            continue;
        }
        let authorized = op
            .get("authorization_required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !authorized {
            result.push_error(
                "authorization",
                format!(
                    "ops[{}]: clear_direct_formatting requires authorization_required=true",
                    i
                ),
            );
        }
    }
    result
}

fn collect_matches(serialized: &str, patterns: &[Regex]) -> Vec<String> {
    let mut matches = Vec::new();
    for pattern in patterns {
        for m in pattern.find_iter(serialized) {
            matches.push(m.as_str().to_string());
        }
    }
    matches
}
