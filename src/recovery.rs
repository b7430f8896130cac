/*!
 * Failure classification and recovery.
 *
 * The error handler is the single place where failures from any pipeline
 * stage become a terminal `ProcessingStatus`. Nothing below it decides
 * whether to roll back; nothing above it sees an unclassified failure.
 * Every terminal path writes the status artifact and flushes the warnings
 * artifact before returning, and a rollback that could not complete is
 * always escalated in the message, never swallowed.
 */

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::assertions::rollback::{rollback, RollbackReceipt};
use crate::audit::AuditSink;
use crate::errors::{PipelineError, SecurityViolationKind};
use crate::plan::OperationKind;
use crate::report::ValidationResult;

/// Terminal outcome of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Success,
    InvalidPlan,
    SecurityViolation,
    ExecutionError,
    Rollback,
    FailedValidation,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::InvalidPlan => "INVALID_PLAN",
            Self::SecurityViolation => "SECURITY_VIOLATION",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::Rollback => "ROLLBACK",
            Self::FailedValidation => "FAILED_VALIDATION",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How tracked revisions in the source document are handled before editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionStrategy {
    /// Leave revisions untouched
    Bypass,
    /// Accept all revisions before executing the plan
    AcceptAll,
    /// Reject all revisions before executing the plan
    RejectAll,
}

impl RevisionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bypass => "BYPASS",
            Self::AcceptAll => "ACCEPT_ALL",
            Self::RejectAll => "REJECT_ALL",
        }
    }
}

impl std::fmt::Display for RevisionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a failed verification restores the document or keeps it.
/// Deliberately has no default: the operator must choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Restore the pristine copy on assertion failure
    Rollback,
    /// Keep the mutated document and demote violations to warnings
    KeepAndWarn,
}

/// Which stage of the pipeline a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Extract,
    Plan,
    Enforce,
    Execute,
    Validate,
    Audit,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Extract => "extract",
            Self::Plan => "plan",
            Self::Enforce => "enforce",
            Self::Execute => "execute",
            Self::Validate => "validate",
            Self::Audit => "audit",
        };
        f.write_str(name)
    }
}

/// Everything the handler needs to know about where a failure happened
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub stage: PipelineStage,
    pub operation: Option<OperationKind>,
    /// The live document being mutated
    pub current_doc: PathBuf,
    /// The pristine pre-execution copy
    pub original_doc: PathBuf,
}

impl ErrorContext {
    pub fn new(stage: PipelineStage, current_doc: PathBuf, original_doc: PathBuf) -> Self {
        Self {
            stage,
            operation: None,
            current_doc,
            original_doc,
        }
    }

    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = Some(operation);
        self
    }
}

/// Terminal result of classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub status: ProcessingStatus,
    pub rollback_performed: bool,
    pub warnings: Vec<String>,
    pub message: String,
}

/// Classifies failures into terminal statuses and drives rollback
pub struct ErrorHandler {
    sink: Arc<AuditSink>,
    strategy: RevisionStrategy,
    policy: RollbackPolicy,
}

impl ErrorHandler {
    pub fn new(sink: Arc<AuditSink>, strategy: RevisionStrategy, policy: RollbackPolicy) -> Self {
        debug!(
            "error handler ready (revision strategy {}, rollback policy {:?})",
            strategy, policy
        );
        Self {
            sink,
            strategy,
            policy,
        }
    }

    pub fn revision_strategy(&self) -> RevisionStrategy {
        self.strategy
    }

    /// Clean terminal path
    pub fn handle_success(&self, warnings: Vec<String>) -> RecoveryResult {
        self.finish(
            ProcessingStatus::Success,
            "plan executed and verified".to_string(),
            false,
            warnings,
        )
    }

    /// Schema or semantic rejection of the plan. Nothing was executed, so
    /// nothing is rolled back.
    pub fn handle_invalid_plan(&self, result: &ValidationResult) -> RecoveryResult {
        let message = match result.error_messages().first() {
            Some(first) => format!("plan rejected: {} ({})", first, result.summary()),
            None => "plan rejected".to_string(),
        };
        self.finish(
            ProcessingStatus::InvalidPlan,
            message,
            false,
            result.warning_messages(),
        )
    }

    /// Constraint enforcement failed. The document is restored
    /// unconditionally, even when nothing has executed yet.
    pub fn handle_security_violation(
        &self,
        context: &ErrorContext,
        kind: Option<SecurityViolationKind>,
        result: &ValidationResult,
    ) -> RecoveryResult {
        let kind_name = kind.map(|k| k.as_str()).unwrap_or("unspecified");
        let detail = result
            .error_messages()
            .first()
            .cloned()
            .unwrap_or_else(|| "constraint enforcement failed".to_string());
        let mut warnings = result.warning_messages();

        let (rolled_back, rollback_note) = match self.perform_rollback(context) {
            Ok(receipt) => (true, restored_note(&receipt)),
            Err(e) => {
                warnings.push(format!("rollback failed: {}", e));
                (false, format!("rollback could not complete: {}", e))
            }
        };
        self.finish(
            ProcessingStatus::SecurityViolation,
            format!("security violation ({}): {}; {}", kind_name, detail, rollback_note),
            rolled_back,
            warnings,
        )
    }

    /// A dispatched operation failed mid-plan. Rollback is mandatory; a
    /// rollback failure turns the outcome fatal.
    pub fn handle_execution_error(&self, context: &ErrorContext, detail: &str) -> RecoveryResult {
        let prefix = match context.operation {
            Some(op) => format!("{} failed", op.tag()),
            None => "execution failed".to_string(),
        };
        match self.perform_rollback(context) {
            Ok(receipt) => self.finish(
                ProcessingStatus::Rollback,
                format!("{}: {}; {}", prefix, detail, restored_note(&receipt)),
                true,
                Vec::new(),
            ),
            Err(e) => self.finish(
                ProcessingStatus::ExecutionError,
                format!("{}: {}; rollback could not complete: {}", prefix, detail, e),
                false,
                Vec::new(),
            ),
        }
    }

    /// Extraction or planning broke before anything was mutated; there is
    /// nothing to roll back.
    pub fn handle_preparation_failure(
        &self,
        context: &ErrorContext,
        error: &PipelineError,
    ) -> RecoveryResult {
        self.finish(
            ProcessingStatus::ExecutionError,
            format!("{} stage failed: {}", context.stage, error),
            false,
            Vec::new(),
        )
    }

    /// Post-execution assertions found violations; the rollback policy
    /// decides between restoring and keeping with warnings.
    pub fn handle_assertion_failure(
        &self,
        context: &ErrorContext,
        result: &ValidationResult,
    ) -> RecoveryResult {
        let violations = result.errors.len();
        match self.policy {
            RollbackPolicy::Rollback => match self.perform_rollback(context) {
                Ok(receipt) => self.finish(
                    ProcessingStatus::Rollback,
                    format!(
                        "document verification failed ({} violation(s)); {}",
                        violations,
                        restored_note(&receipt)
                    ),
                    true,
                    result.warning_messages(),
                ),
                Err(e) => self.finish(
                    ProcessingStatus::FailedValidation,
                    format!(
                        "document verification failed ({} violation(s)); rollback could not complete: {}",
                        violations, e
                    ),
                    false,
                    result.warning_messages(),
                ),
            },
            RollbackPolicy::KeepAndWarn => {
                let mut warnings = result.error_messages();
                warnings.extend(result.warning_messages());
                self.finish(
                    ProcessingStatus::Success,
                    format!(
                        "document verification failed ({} violation(s)); document kept per rollback policy",
                        violations
                    ),
                    false,
                    warnings,
                )
            }
        }
    }

    /// The after-snapshot could not be produced, so verification is
    /// impossible. The document is restored when it can be.
    pub fn handle_verification_breakdown(
        &self,
        context: &ErrorContext,
        detail: &str,
    ) -> RecoveryResult {
        let (rolled_back, rollback_note) = match self.perform_rollback(context) {
            Ok(receipt) => (true, restored_note(&receipt)),
            Err(e) => (false, format!("rollback could not complete: {}", e)),
        };
        self.finish(
            ProcessingStatus::FailedValidation,
            format!("post-execution verification impossible: {}; {}", detail, rollback_note),
            rolled_back,
            Vec::new(),
        )
    }

    /// An operation matched nothing. Informational, never an error, and
    /// the run's status is unaffected.
    pub fn record_noop(&self, detail: &str) {
        info!("NOOP: {}", detail);
        if let Err(e) = self.sink.record_noop(detail) {
            warn!("Failed to record NOOP: {}", e);
        }
    }

    fn perform_rollback(&self, context: &ErrorContext) -> Result<RollbackReceipt, PipelineError> {
        let receipt = rollback(&context.original_doc, &context.current_doc)?;
        let note = format!(
            "rollback: restored {} bytes into {}, sha256 {}",
            receipt.bytes,
            context.current_doc.display(),
            receipt.digest
        );
        if let Err(e) = self.sink.record_warning(&note) {
            warn!("Failed to append rollback note: {}", e);
        }
        Ok(receipt)
    }

    /// Write the status + warnings artifacts, log, and produce the
    /// terminal result. Audit IO failures degrade the trail but never the
    /// terminal result itself.
    fn finish(
        &self,
        status: ProcessingStatus,
        message: String,
        rollback_performed: bool,
        warnings: Vec<String>,
    ) -> RecoveryResult {
        for warning in &warnings {
            if let Err(e) = self.sink.record_warning(warning) {
                warn!("Failed to append warning artifact: {}", e);
            }
        }
        if let Err(e) = self.sink.write_status(status.as_str(), &message) {
            warn!("Failed to write status artifact: {}", e);
        }
        match status {
            ProcessingStatus::Success => info!("run finished: {} - {}", status, message),
            _ => error!("run finished: {} - {}", status, message),
        }
        RecoveryResult {
            status,
            rollback_performed,
            warnings,
            message,
        }
    }
}

fn restored_note(receipt: &RollbackReceipt) -> String {
    match &receipt.backup {
        Some(backup) => format!(
            "document restored from pristine copy (pre-rollback bytes at {})",
            backup.display()
        ),
        None => "document restored from pristine copy".to_string(),
    }
}
