/*!
 * Tests for post-edit document assertions
 */

use chrono::Duration;

use docwarden::assertions::{AssertionConfig, DocumentValidator, RequiredStyle};
use docwarden::snapshot::StructureSnapshot;
use crate::common;

fn decoded_thesis() -> StructureSnapshot {
    serde_json::from_value(common::thesis_structure()).expect("fixture must decode")
}

/// An "after" snapshot whose timestamp advanced, as a real save would do
fn saved_thesis() -> StructureSnapshot {
    let mut after = decoded_thesis();
    after.metadata.modified_time = after.metadata.modified_time + Duration::seconds(5);
    after
}

/// Test that an untouched thesis passes with only the stale-TOC advisory
#[test]
fn test_validate_unchangedThesis_shouldPassWithTocAdvisoryOnly() {
    let validator = DocumentValidator::new(AssertionConfig::default());
    let result = validator.validate(&decoded_thesis(), &saved_thesis());

    assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
    assert!(
        result.warning_messages().iter().any(|w| w.contains("stale entries")),
        "The stale TOC entry should surface as an advisory"
    );
}

/// Test that a forbidden heading violates at level 1 but not at level 2
#[test]
fn test_validate_forbiddenHeading_shouldDependOnHeadingLevel() {
    let config = AssertionConfig {
        forbidden_headings: vec!["Abstract".to_string()],
        ..AssertionConfig::default()
    };
    let validator = DocumentValidator::new(config);
    let before = decoded_thesis();

    // Level 1: violation
    let mut after = saved_thesis();
    after.headings[0].text = "Abstract".to_string();
    let result = validator.validate(&before, &after);
    assert!(result.error_messages().iter().any(|m| m.contains("Abstract")));

    // Level 2: allowed
    let mut after = saved_thesis();
    after.headings[0].text = "Abstract".to_string();
    after.headings[0].level = 2;
    let result = validator.validate(&before, &after);
    assert!(
        !result.error_messages().iter().any(|m| m.contains("Abstract")),
        "Forbidden headings only bind at level 1"
    );
}

/// Test that approximate matching catches case and whitespace variants
#[test]
fn test_validate_forbiddenHeadingVariant_shouldStillViolate() {
    let config = AssertionConfig {
        forbidden_headings: vec!["Abstract".to_string()],
        ..AssertionConfig::default()
    };
    let validator = DocumentValidator::new(config);

    let mut after = saved_thesis();
    after.headings[0].text = "  ABSTRACT ".to_string();
    let result = validator.validate(&decoded_thesis(), &after);
    assert!(!result.is_valid(), "Case and whitespace variants should still match");
}

/// Test that a missing required style and a mismatched attribute are
/// separate violations
#[test]
fn test_validate_requiredStyles_shouldNameEachViolation() {
    let mut heading_style = RequiredStyle::named("Heading 1");
    heading_style.size_pt = Some(18.0); // fixture carries 16.0
    let config = AssertionConfig {
        required_styles: vec![heading_style, RequiredStyle::named("Caption")],
        ..AssertionConfig::default()
    };
    let validator = DocumentValidator::new(config);

    let result = validator.validate(&decoded_thesis(), &saved_thesis());
    assert_eq!(result.errors.len(), 2);
    assert!(result.error_messages().iter().any(|m| m.contains("size_pt")));
    assert!(result
        .error_messages()
        .iter()
        .any(|m| m.contains("\"Caption\" does not exist")));
}

/// Test that an emptied TOC result is a hard violation
#[test]
fn test_validate_emptyTocResult_shouldViolate() {
    let validator = DocumentValidator::new(AssertionConfig::default());

    let mut after = saved_thesis();
    after.fields[0].result_text = Some("   ".to_string());
    let result = validator.validate(&decoded_thesis(), &after);
    assert!(result
        .error_messages()
        .iter()
        .any(|m| m.contains("empty result text")));
}

/// Test that a timestamp that did not advance fails pagination
#[test]
fn test_validate_staleTimestamp_shouldViolatePagination() {
    let validator = DocumentValidator::new(AssertionConfig::default());

    // before == after timestamp means the save never recomputed anything
    let result = validator.validate(&decoded_thesis(), &decoded_thesis());
    assert!(result
        .error_messages()
        .iter()
        .any(|m| m.contains("did not advance")));
}
