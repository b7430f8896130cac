/*!
 * Integration tests for the audit trail left behind by pipeline runs
 */

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use docwarden::assertions::AssertionConfig;
use docwarden::audit::{AuditSink, STATUS_FILE, WARNINGS_FILE};
use docwarden::engine::MemoryEngine;
use docwarden::pipeline::{Orchestrator, PipelineOptions, RunReport};
use docwarden::planner::ScriptedPlanner;
use docwarden::recovery::{ProcessingStatus, RollbackPolicy};
use crate::common;

async fn run_plan(
    dir: &PathBuf,
    doc_name: &str,
    plan: serde_json::Value,
) -> Result<(Arc<AuditSink>, RunReport)> {
    let doc = common::write_json(dir, doc_name, &common::thesis_bundle())?;
    let sink = Arc::new(AuditSink::create(dir.join("audit"))?);
    let pipeline: Orchestrator<MemoryEngine, ScriptedPlanner> = Orchestrator::new(
        MemoryEngine::new(),
        ScriptedPlanner::from_value(plan),
        Arc::clone(&sink),
        PipelineOptions {
            assertions: AssertionConfig::default(),
            ..PipelineOptions::new(RollbackPolicy::Rollback)
        },
    )?;
    let report = pipeline.run(&doc).await;
    Ok((sink, report))
}

/// Test that the report and the on-disk trail agree on identity and status
#[tokio::test]
async fn test_auditTrail_afterRun_shouldMatchReportIdentity() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let plan = common::plan_with_ops(json!([
        { "operation_type": "delete_section_by_heading", "heading_text": "摘要", "level": 1, "match": "EXACT" }
    ]));

    let (sink, report) = run_plan(&dir, "thesis.json", plan).await?;

    // 1. The report points at the run's own directory
    assert_eq!(report.audit_dir, sink.dir());
    let dir_name = report.audit_dir.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(dir_name, format!("run-{}", report.run_id));

    // 2. The status artifact mirrors the report
    let status = fs::read_to_string(sink.artifact_path(STATUS_FILE))?;
    let mut lines = status.lines();
    assert_eq!(lines.next(), Some(report.status.as_str()));
    assert_eq!(lines.next(), Some(report.message.as_str()));
    Ok(())
}

/// Test that two runs under the same audit root never share a directory
#[tokio::test]
async fn test_auditTrail_acrossTwoRuns_shouldIsolateDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let plan = common::plan_with_ops(json!([ { "operation_type": "update_toc" } ]));

    let (first_sink, first) = run_plan(&dir, "one.json", plan.clone()).await?;
    let (second_sink, second) = run_plan(&dir, "two.json", plan).await?;

    assert_ne!(first.run_id, second.run_id);
    assert_ne!(first_sink.dir(), second_sink.dir());
    assert!(first_sink.artifact_path(STATUS_FILE).is_file());
    assert!(second_sink.artifact_path(STATUS_FILE).is_file());
    Ok(())
}

/// Test that a hostile run leaves typed violation records an operator can
/// read back and clear
#[tokio::test]
async fn test_auditTrail_afterHostileRun_shouldExposeTypedViolations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let plan = common::plan_with_ops(json!([
        { "operation_type": "replace_text", "find": "摘要", "replace": "" }
    ]));

    let (sink, report) = run_plan(&dir, "thesis.json", plan).await?;
    assert_eq!(report.status, ProcessingStatus::SecurityViolation);

    // 1. Records come back typed, in append order
    let records = sink.read_violations()?;
    assert!(!records.is_empty(), "Hostile run should leave violation records");
    assert!(
        records.iter().any(|r| r.violation_type == "whitelist_bypass"),
        "Should record the whitelist violation: {:?}",
        records
    );
    assert!(records[0].context.contains("ops[0]"), "Context should locate the operation");

    // 2. Clearing is an operator action; the terminal status survives it
    sink.clear_violations()?;
    assert!(sink.read_violations()?.is_empty());
    let status = fs::read_to_string(sink.artifact_path(STATUS_FILE))?;
    assert!(status.starts_with("SECURITY_VIOLATION\n"));
    Ok(())
}

/// Test that report warnings are persisted as timestamped log lines
#[tokio::test]
async fn test_auditTrail_warningsLog_shouldCarryTimestampedReportWarnings() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let plan = common::plan_with_ops(json!([]));

    let (sink, report) = run_plan(&dir, "thesis.json", plan).await?;
    assert_eq!(report.status, ProcessingStatus::Success);
    assert!(report.warnings.iter().any(|w| w.contains("plan contains no operations")));

    let warnings = fs::read_to_string(sink.artifact_path(WARNINGS_FILE))?;
    let line = warnings
        .lines()
        .find(|l| l.contains("plan contains no operations"))
        .expect("Warning should be persisted to the log");
    assert!(line.starts_with('['), "Log lines should carry a timestamp prefix: {}", line);
    Ok(())
}
