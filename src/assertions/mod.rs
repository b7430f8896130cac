/*!
 * Before/after document assertions and rollback.
 *
 * Assertions are pure functions over two structure snapshots; the only
 * filesystem action in this module is `rollback`. `DocumentValidator`
 * bundles the four assertion families behind one call so the pipeline has
 * a single verification step.
 */

pub mod chapter;
pub mod matching;
pub mod pagination;
pub mod rollback;
pub mod style;
pub mod toc;

pub use chapter::chapter_assertions;
pub use matching::ApproxMatcher;
pub use pagination::pagination_assertions;
pub use rollback::{backup_path, rollback, RollbackReceipt, BACKUP_SUFFIX};
pub use style::{style_assertions, RequiredStyle};
pub use toc::toc_assertions;

use serde::{Deserialize, Serialize};

use crate::report::ValidationResult;
use crate::snapshot::StructureSnapshot;

fn default_match_threshold() -> f32 {
    0.85
}

/// What the finished document must look like
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionConfig {
    /// Headings that must not appear at level 1 (compared approximately)
    #[serde(default)]
    pub forbidden_headings: Vec<String>,

    /// Styles that must exist, with per-field expectations
    #[serde(default)]
    pub required_styles: Vec<RequiredStyle>,

    /// Similarity threshold for approximate heading comparison
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,
}

impl Default for AssertionConfig {
    fn default() -> Self {
        Self {
            forbidden_headings: Vec::new(),
            required_styles: Vec::new(),
            match_threshold: default_match_threshold(),
        }
    }
}

/// Runs all assertion families over a before/after snapshot pair
pub struct DocumentValidator {
    config: AssertionConfig,
    matcher: ApproxMatcher,
}

impl DocumentValidator {
    pub fn new(config: AssertionConfig) -> Self {
        let matcher = ApproxMatcher::new(config.match_threshold);
        Self { config, matcher }
    }

    /// Chapter, style, TOC and pagination assertions folded into one result
    pub fn validate(
        &self,
        before: &StructureSnapshot,
        after: &StructureSnapshot,
    ) -> ValidationResult {
        let mut result = ValidationResult::passed();
        result.merge(chapter_assertions(
            after,
            &self.config.forbidden_headings,
            &self.matcher,
        ));
        result.merge(style_assertions(after, &self.config.required_styles));
        result.merge(toc_assertions(after, &self.matcher));
        result.merge(pagination_assertions(before, after));
        result
    }
}
