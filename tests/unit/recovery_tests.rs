/*!
 * Tests for terminal statuses and rollback policy decisions
 */

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use docwarden::audit::{AuditSink, STATUS_FILE};
use docwarden::recovery::{
    ErrorContext, ErrorHandler, PipelineStage, ProcessingStatus, RevisionStrategy, RollbackPolicy,
};
use docwarden::report::ValidationResult;
use crate::common;

fn doc_pair(dir: &std::path::Path) -> (PathBuf, PathBuf) {
    let original = dir.join("original.json");
    let current = dir.join("current.json");
    fs::write(&original, b"pristine").unwrap();
    fs::write(&current, b"mutated").unwrap();
    (original, current)
}

fn handler(dir: &std::path::Path, policy: RollbackPolicy) -> (Arc<AuditSink>, ErrorHandler) {
    let sink = Arc::new(AuditSink::create(dir).unwrap());
    let handler = ErrorHandler::new(Arc::clone(&sink), RevisionStrategy::AcceptAll, policy);
    (sink, handler)
}

/// Test that every status serializes to its wire string
#[test]
fn test_processingStatus_wireStrings_shouldBeScreamingSnakeCase() {
    let cases = [
        (ProcessingStatus::Success, "SUCCESS"),
        (ProcessingStatus::InvalidPlan, "INVALID_PLAN"),
        (ProcessingStatus::SecurityViolation, "SECURITY_VIOLATION"),
        (ProcessingStatus::ExecutionError, "EXECUTION_ERROR"),
        (ProcessingStatus::Rollback, "ROLLBACK"),
        (ProcessingStatus::FailedValidation, "FAILED_VALIDATION"),
    ];
    for (status, wire) in cases {
        assert_eq!(status.as_str(), wire);
        assert_eq!(serde_json::to_value(status).unwrap(), json!(wire));
        assert_eq!(format!("{}", status), wire);
    }
}

/// Test revision strategy wire values
#[test]
fn test_revisionStrategy_wireStrings_shouldMatchEngineContract() {
    assert_eq!(RevisionStrategy::Bypass.as_str(), "BYPASS");
    assert_eq!(RevisionStrategy::AcceptAll.as_str(), "ACCEPT_ALL");
    assert_eq!(RevisionStrategy::RejectAll.as_str(), "REJECT_ALL");

    let parsed: RevisionStrategy = serde_json::from_str("\"REJECT_ALL\"").unwrap();
    assert_eq!(parsed, RevisionStrategy::RejectAll);
}

/// Test rollback policy config wire values
#[test]
fn test_rollbackPolicy_wireStrings_shouldBeSnakeCase() {
    let parsed: RollbackPolicy = serde_json::from_str("\"keep_and_warn\"").unwrap();
    assert_eq!(parsed, RollbackPolicy::KeepAndWarn);
    assert_eq!(serde_json::to_string(&RollbackPolicy::Rollback).unwrap(), "\"rollback\"");
}

/// Test that the same assertion failure restores or keeps depending on the
/// configured policy
#[test]
fn test_assertionFailure_underEachPolicy_shouldDivergeAsConfigured() -> Result<()> {
    let mut verdict = ValidationResult::passed();
    verdict.push_error("chapter", "level-1 heading \"Abstract\" matches forbidden heading");

    // Rollback policy: restore and report ROLLBACK
    let temp_dir = common::create_temp_dir()?;
    let (original, current) = doc_pair(temp_dir.path());
    let (_sink, strict) = handler(&temp_dir.path().join("audit"), RollbackPolicy::Rollback);
    let context = ErrorContext::new(PipelineStage::Validate, current.clone(), original.clone());

    let outcome = strict.handle_assertion_failure(&context, &verdict);
    assert_eq!(outcome.status, ProcessingStatus::Rollback);
    assert!(outcome.rollback_performed);
    assert_eq!(fs::read(&current)?, b"pristine");

    // KeepAndWarn policy: keep the bytes and demote the violation
    let temp_dir = common::create_temp_dir()?;
    let (original, current) = doc_pair(temp_dir.path());
    let (_sink, lenient) = handler(&temp_dir.path().join("audit"), RollbackPolicy::KeepAndWarn);
    let context = ErrorContext::new(PipelineStage::Validate, current.clone(), original);

    let outcome = lenient.handle_assertion_failure(&context, &verdict);
    assert_eq!(outcome.status, ProcessingStatus::Success);
    assert!(!outcome.rollback_performed);
    assert_eq!(fs::read(&current)?, b"mutated", "KeepAndWarn must not touch the document");
    assert!(outcome.warnings.iter().any(|w| w.contains("Abstract")));
    Ok(())
}

/// Test that a security violation rolls back even before execution
#[test]
fn test_securityViolation_shouldAlwaysRollBack_regardlessOfPolicy() -> Result<()> {
    let mut findings = ValidationResult::passed();
    findings.push_error("whitelist", "operation \"replace_text\" is not whitelisted");

    let temp_dir = common::create_temp_dir()?;
    let (original, current) = doc_pair(temp_dir.path());
    let (sink, lenient) = handler(&temp_dir.path().join("audit"), RollbackPolicy::KeepAndWarn);
    let context = ErrorContext::new(PipelineStage::Enforce, current.clone(), original);

    let outcome = lenient.handle_security_violation(&context, None, &findings);
    assert_eq!(outcome.status, ProcessingStatus::SecurityViolation);
    assert!(outcome.rollback_performed, "KeepAndWarn only softens assertion failures");
    assert_eq!(fs::read(&current)?, b"pristine");

    // The terminal status artifact holds the wire string
    let status = fs::read_to_string(sink.artifact_path(STATUS_FILE))?;
    assert!(status.starts_with("SECURITY_VIOLATION\n"));
    Ok(())
}

/// Test that the status artifact carries status then summary
#[test]
fn test_statusArtifact_format_shouldBeStatusLineThenSummary() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (_original, _current) = doc_pair(temp_dir.path());
    let (sink, h) = handler(&temp_dir.path().join("audit"), RollbackPolicy::Rollback);

    let outcome = h.handle_success(vec!["advisory".to_string()]);
    assert_eq!(outcome.status, ProcessingStatus::Success);

    let body = fs::read_to_string(sink.artifact_path(STATUS_FILE))?;
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("SUCCESS"));
    assert_eq!(lines.next(), Some("plan executed and verified"));
    Ok(())
}
