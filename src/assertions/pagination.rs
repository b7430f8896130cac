/*!
 * Pagination assertions.
 */

use crate::report::ValidationResult;
use crate::snapshot::StructureSnapshot;

/// The engine repaginates on save; a modification timestamp that did not
/// advance between the snapshots proves nothing was actually recomputed,
/// which is a violation in itself regardless of any other field.
pub fn pagination_assertions(
    before: &StructureSnapshot,
    after: &StructureSnapshot,
) -> ValidationResult {
    let mut result = ValidationResult::passed();

    let before_time = before.metadata.modified_time;
    let after_time = after.metadata.modified_time;
    if after_time == before_time {
        result.push_error(
            "pagination",
            format!("modification timestamp did not advance (still {})", after_time),
        );
    } else if after_time < before_time {
        result.push_error(
            "pagination",
            format!(
                "modification timestamp went backwards ({} -> {})",
                before_time, after_time
            ),
        );
    }

    if after.metadata.page_count <= 0 {
        result.push_error(
            "pagination",
            format!("page count must be positive, got {}", after.metadata.page_count),
        );
    }
    result
}
