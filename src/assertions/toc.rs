/*!
 * Table-of-contents assertions.
 *
 * A document without a TOC is fine. A document with one must have a
 * non-empty captured result text, and the entries parsed out of that text
 * should line up with the heading outline. Entry/heading correspondence is
 * heuristic (page numbers and outline numbering are stripped before
 * comparison), so a mismatch is only advisory; an empty TOC result is a
 * hard violation.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::report::ValidationResult;
use crate::snapshot::StructureSnapshot;

use super::matching::ApproxMatcher;

// "1.2.3 Background ...... 14" -> "Background"
static TRAILING_PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.\s]*\d+\s*$").expect("page number pattern must compile"));
static LEADING_OUTLINE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*[.\s]+").expect("outline number pattern must compile"));

/// Check every TOC field in the after-snapshot
pub fn toc_assertions(after: &StructureSnapshot, matcher: &ApproxMatcher) -> ValidationResult {
    let mut result = ValidationResult::passed();

    for field in after.toc_fields() {
        let text = field.result_text.as_deref().unwrap_or("");
        if text.trim().is_empty() {
            result.push_error(
                "toc",
                format!(
                    "TOC field at paragraph {} has an empty result text",
                    field.paragraph_index
                ),
            );
            continue;
        }

        for entry in parse_toc_entries(text) {
            let corresponds = after
                .headings
                .iter()
                .any(|heading| matcher.matches(&entry, &heading.text));
            if !corresponds {
                result.push_warning(
                    "toc",
                    format!("TOC entry \"{}\" does not correspond to any heading", entry),
                );
            }
        }
    }
    result
}

/// Entry texts of a captured TOC result, one per line, with page numbers
/// and outline numbering stripped
pub fn parse_toc_entries(result_text: &str) -> Vec<String> {
    result_text
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let without_page = TRAILING_PAGE_NUMBER.replace(line, "");
            let entry = LEADING_OUTLINE_NUMBER.replace(without_page.trim(), "");
            let entry = entry.trim();
            if entry.is_empty() {
                None
            } else {
                Some(entry.to_string())
            }
        })
        .collect()
}
