/*!
 * Required-style assertions.
 *
 * The configuration names the styles a finished document must carry and,
 * per style, the attributes that must hold. Unset attributes are not
 * checked, set ones must match exactly, and every mismatched field is its
 * own violation so the operator sees the complete delta at once.
 */

use serde::{Deserialize, Serialize};

use crate::report::ValidationResult;
use crate::snapshot::{LineSpacingMode, StructureSnapshot, StyleDefinition};

/// Expected attributes for one named style; `None` means "don't check"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredStyle {
    pub name: String,

    #[serde(default)]
    pub east_asian_font: Option<String>,

    #[serde(default)]
    pub latin_font: Option<String>,

    #[serde(default)]
    pub size_pt: Option<f64>,

    #[serde(default)]
    pub bold: Option<bool>,

    #[serde(default)]
    pub line_spacing_mode: Option<LineSpacingMode>,

    #[serde(default)]
    pub line_spacing_value: Option<f64>,
}

impl RequiredStyle {
    /// Expectation on a style's existence only
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            east_asian_font: None,
            latin_font: None,
            size_pt: None,
            bold: None,
            line_spacing_mode: None,
            line_spacing_value: None,
        }
    }
}

/// Check every required style against the after-snapshot
pub fn style_assertions(
    after: &StructureSnapshot,
    required_styles: &[RequiredStyle],
) -> ValidationResult {
    let mut result = ValidationResult::passed();
    for required in required_styles {
        match after.style(&required.name) {
            Some(actual) => check_style_fields(required, actual, &mut result),
            None => {
                result.push_error(
                    "style",
                    format!("required style \"{}\" does not exist", required.name),
                );
            }
        }
    }
    result
}

fn check_style_fields(
    required: &RequiredStyle,
    actual: &StyleDefinition,
    result: &mut ValidationResult,
) {
    if let Some(expected) = &required.east_asian_font {
        if actual.east_asian_font.as_deref() != Some(expected.as_str()) {
            push_mismatch(result, &required.name, "east_asian_font", expected, &actual.east_asian_font);
        }
    }
    if let Some(expected) = &required.latin_font {
        if actual.latin_font.as_deref() != Some(expected.as_str()) {
            push_mismatch(result, &required.name, "latin_font", expected, &actual.latin_font);
        }
    }
    if let Some(expected) = required.size_pt {
        if actual.size_pt != Some(expected) {
            push_mismatch(result, &required.name, "size_pt", &expected, &actual.size_pt);
        }
    }
    if let Some(expected) = required.bold {
        if actual.bold != Some(expected) {
            push_mismatch(result, &required.name, "bold", &expected, &actual.bold);
        }
    }
    if let Some(expected) = required.line_spacing_mode {
        if actual.line_spacing_mode != Some(expected) {
            push_mismatch(result, &required.name, "line_spacing_mode", &expected, &actual.line_spacing_mode);
        }
    }
    if let Some(expected) = required.line_spacing_value {
        if actual.line_spacing_value != Some(expected) {
            push_mismatch(result, &required.name, "line_spacing_value", &expected, &actual.line_spacing_value);
        }
    }
}

fn push_mismatch<E: std::fmt::Debug, A: std::fmt::Debug>(
    result: &mut ValidationResult,
    style: &str,
    field: &str,
    expected: &E,
    actual: &A,
) {
    result.push_error(
        "style",
        format!(
            "style \"{}\": {} expected {:?}, found {:?}",
            style, field, expected, actual
        ),
    );
}
