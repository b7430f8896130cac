/*!
 * Recursive parameter sanitization and injection detection.
 *
 * Sanitization walks arbitrarily nested JSON and normalizes it: null values
 * are stripped, control characters are removed from strings, and overlong
 * strings are truncated with a warning. Injection signatures are different:
 * they are never sanitized away. The first hit aborts the walk with a
 * security violation and no sanitized value is returned, so a caller can
 * never accidentally keep a "cleaned" malicious plan.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::{PipelineError, SecurityViolationKind};

/// Script/eval/exec/event-handler signatures. Matched case-insensitively
/// against every string (and key) in the input after control characters are
/// stripped, so `<scr\u{0}ipt` is caught as well.
static INJECTION_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("<script", r"(?i)<\s*script"),
        ("javascript:", r"(?i)javascript\s*:"),
        ("vbscript:", r"(?i)vbscript\s*:"),
        ("event handler", r"(?i)\bon[a-z0-9_]+\s*="),
        ("eval(", r"(?i)\beval\s*\("),
        ("exec(", r"(?i)\bexec\s*\("),
    ]
    .iter()
    .map(|(name, pattern)| (*name, Regex::new(pattern).expect("injection pattern must compile")))
    .collect()
});

/// Sanitized copy of an input value plus the warnings produced on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub value: Value,
    pub warnings: Vec<String>,
}

/// Name of the first injection signature found in `text`, if any
pub fn detect_injection(text: &str) -> Option<&'static str> {
    INJECTION_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(name, _)| *name)
}

/// Sanitize one untrusted value. Strings longer than `max_string_length`
/// characters are truncated to exactly that length with one warning each;
/// any injection signature fails the whole call.
pub fn sanitize_input(value: &Value, max_string_length: usize) -> Result<Sanitized, PipelineError> {
    let mut warnings = Vec::new();
    let sanitized = sanitize_value(value, "$", max_string_length, &mut warnings)?;
    Ok(Sanitized {
        value: sanitized.unwrap_or(Value::Null),
        warnings,
    })
}

fn sanitize_value(
    value: &Value,
    path: &str,
    max_string_length: usize,
    warnings: &mut Vec<String>,
) -> Result<Option<Value>, PipelineError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(_) | Value::Number(_) => Ok(Some(value.clone())),
        Value::String(s) => {
            let cleaned = sanitize_string(s, path, max_string_length, warnings)?;
            Ok(Some(Value::String(cleaned)))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let child_path = format!("{}[{}]", path, i);
                if let Some(v) = sanitize_value(item, &child_path, max_string_length, warnings)? {
                    out.push(v);
                }
            }
            Ok(Some(Value::Array(out)))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                let child_path = format!("{}.{}", path, key);
                let clean_key = sanitize_string(key, &child_path, max_string_length, warnings)?;
                if let Some(v) = sanitize_value(item, &child_path, max_string_length, warnings)? {
                    out.insert(clean_key, v);
                }
            }
            Ok(Some(Value::Object(out)))
        }
    }
}

fn sanitize_string(
    s: &str,
    path: &str,
    max_string_length: usize,
    warnings: &mut Vec<String>,
) -> Result<String, PipelineError> {
    let stripped: String = s
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    if let Some(signature) = detect_injection(&stripped) {
        return Err(PipelineError::Security {
            kind: SecurityViolationKind::Injection,
            detail: format!("injection signature \"{}\" at {}", signature, path),
        });
    }

    if stripped.chars().count() > max_string_length {
        warnings.push(format!(
            "{} truncated to {} characters",
            path, max_string_length
        ));
        return Ok(stripped.chars().take(max_string_length).collect());
    }
    Ok(stripped)
}
