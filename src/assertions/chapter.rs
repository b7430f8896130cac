/*!
 * Chapter-level heading assertions.
 */

use log::debug;

use crate::report::ValidationResult;
use crate::snapshot::StructureSnapshot;

use super::matching::ApproxMatcher;

/// No level-1 heading may approximately match a forbidden heading. The same
/// text at level 2 or deeper is fine: forbidden headings are front-matter
/// names that must not masquerade as chapters, not banned words.
pub fn chapter_assertions(
    after: &StructureSnapshot,
    forbidden_headings: &[String],
    matcher: &ApproxMatcher,
) -> ValidationResult {
    let mut result = ValidationResult::passed();
    if forbidden_headings.is_empty() {
        return result;
    }

    for heading in after.headings_at_level(1) {
        if let Some(forbidden) = matcher.find_best_match(&heading.text, forbidden_headings) {
            result.push_error(
                "chapter",
                format!(
                    "level-1 heading \"{}\" (paragraph {}) matches forbidden heading \"{}\"",
                    heading.text, heading.paragraph_index, forbidden
                ),
            );
        }
    }
    debug!(
        "chapter assertions: {} level-1 heading(s) checked, {}",
        after.headings_at_level(1).count(),
        result.summary()
    );
    result
}
