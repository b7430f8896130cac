/*!
 * Protocol-escape detection.
 *
 * A plan only ever names operations from the vocabulary; it has no business
 * carrying raw markup, archive part paths or encoded blobs. Any of those in
 * an upstream-generated payload signals an attempt to smuggle content past
 * the operation layer, so every finding is an error, never a warning.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::report::ValidationResult;

struct EscapePattern {
    category: &'static str,
    regex: Regex,
}

static ESCAPE_PATTERNS: Lazy<Vec<EscapePattern>> = Lazy::new(|| {
    [
        ("raw markup", r"(?i)<\?xml|<w:[a-z]|xmlns(:[a-z0-9]+)?\s*="),
        (
            "archive part path",
            r"(?i)(^|[^a-z0-9])(word|docprops|_rels)/|\[content_types\]\.xml",
        ),
        ("base64 blob", r"[A-Za-z0-9+/]{64,}={0,2}"),
    ]
    .iter()
    .map(|(category, pattern)| EscapePattern {
        category,
        regex: Regex::new(pattern).expect("escape pattern must compile"),
    })
    .collect()
});

/// Scan every string in an upstream-generated payload for protocol-escape
/// content. One error per finding, naming the category and the path.
pub fn scan_for_protocol_escape(value: &Value) -> ValidationResult {
    let mut result = ValidationResult::passed();
    scan_value(value, "$", &mut result);
    result
}

fn scan_value(value: &Value, path: &str, result: &mut ValidationResult) {
    match value {
        Value::String(s) => scan_string(s, path, result),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                scan_value(item, &format!("{}[{}]", path, i), result);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let child_path = format!("{}.{}", path, key);
                scan_string(key, &child_path, result);
                scan_value(item, &child_path, result);
            }
        }
        _ => {}
    }
}

fn scan_string(s: &str, path: &str, result: &mut ValidationResult) {
    for pattern in ESCAPE_PATTERNS.iter() {
        if let Some(m) = pattern.regex.find(s) {
            let snippet: String = m.as_str().chars().take(40).collect();
            result.push_error(
                "protocol_escape",
                format!("{} detected at {}: \"{}\"", pattern.category, path, snippet),
            );
        }
    }
}
