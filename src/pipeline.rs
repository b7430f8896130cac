/*!
 * Run orchestration.
 *
 * One run walks a fixed sequence: stage a pristine copy, extract and
 * validate the before snapshots, obtain a plan, gate it through schema
 * validation and constraint enforcement, execute the sanitized operations
 * one at a time, save, then re-extract and assert. Every exit goes
 * through the error handler, so a run always ends with a terminal status
 * and a written audit trail, whatever went wrong.
 *
 * The gate runs both the schema validator and the enforcer on the raw
 * plan before looking at either verdict: a plan that is simultaneously
 * malformed and malicious is reported as a security violation, not as a
 * schema nit.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::assertions::{AssertionConfig, DocumentValidator};
use crate::audit::{AuditSink, PRISTINE_FILE};
use crate::enforcer::{ConstraintEnforcer, EnforcementLimits};
use crate::engine::DocumentEngine;
use crate::errors::{EngineError, PipelineError};
use crate::plan::Plan;
use crate::planner::Planner;
use crate::recovery::{
    ErrorContext, ErrorHandler, PipelineStage, ProcessingStatus, RecoveryResult, RevisionStrategy,
    RollbackPolicy,
};
use crate::report::ValidationResult;
use crate::schema::{DocumentKind, SchemaValidator};
use crate::snapshot::StructureSnapshot;

/// Tuning for one orchestrator instance. The rollback policy is the one
/// knob without a default; everything else can be left alone.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub strategy: RevisionStrategy,
    pub policy: RollbackPolicy,
    pub limits: EnforcementLimits,
    pub assertions: AssertionConfig,
}

impl PipelineOptions {
    pub fn new(policy: RollbackPolicy) -> Self {
        Self {
            strategy: RevisionStrategy::AcceptAll,
            policy,
            limits: EnforcementLimits::default(),
            assertions: AssertionConfig::default(),
        }
    }
}

/// What one dispatched operation did, as shown to the operator
#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    pub operation: String,
    pub changed: bool,
    pub detail: String,
}

/// Terminal report of one run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub audit_dir: PathBuf,
    pub status: ProcessingStatus,
    pub message: String,
    pub rollback_performed: bool,
    pub warnings: Vec<String>,
    pub operations: Vec<OperationRecord>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.status == ProcessingStatus::Success
    }
}

/// Drives one document through the whole pipeline
pub struct Orchestrator<E: DocumentEngine, P: Planner> {
    engine: E,
    planner: P,
    validator: SchemaValidator,
    enforcer: ConstraintEnforcer,
    assertions: DocumentValidator,
    handler: ErrorHandler,
    sink: Arc<AuditSink>,
}

impl<E: DocumentEngine, P: Planner> Orchestrator<E, P> {
    pub fn new(
        engine: E,
        planner: P,
        sink: Arc<AuditSink>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            validator: SchemaValidator::new()?,
            enforcer: ConstraintEnforcer::new(Arc::clone(&sink), options.limits),
            assertions: DocumentValidator::new(options.assertions),
            handler: ErrorHandler::new(Arc::clone(&sink), options.strategy, options.policy),
            engine,
            planner,
            sink,
        })
    }

    /// Run the pipeline against one document. Never fails: every outcome,
    /// expected or not, lands in a terminal report with audit artifacts
    /// behind it.
    pub async fn run(&self, doc_path: &Path) -> RunReport {
        let started = Instant::now();
        let mut operations = Vec::new();
        let recovery = self.drive(doc_path, &mut operations).await;
        RunReport {
            run_id: self.sink.run_id().to_string(),
            audit_dir: self.sink.dir().to_path_buf(),
            status: recovery.status,
            message: recovery.message,
            rollback_performed: recovery.rollback_performed,
            warnings: recovery.warnings,
            operations,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn drive(
        &self,
        doc_path: &Path,
        operations: &mut Vec<OperationRecord>,
    ) -> RecoveryResult {
        info!("Run {} starting for {}", self.sink.run_id(), doc_path.display());
        let mut advisories = ValidationResult::passed();

        let mut doc = match self.engine.open(doc_path, self.handler.revision_strategy()) {
            Ok(doc) => doc,
            Err(source) => {
                let error = PipelineError::Extraction {
                    path: doc_path.to_path_buf(),
                    source,
                };
                let context = ErrorContext::new(
                    PipelineStage::Extract,
                    doc_path.to_path_buf(),
                    doc_path.to_path_buf(),
                );
                return self.handler.handle_preparation_failure(&context, &error);
            }
        };

        // stage the pristine copy before any operation can run, so every
        // later stage has a rollback source
        let original = match self.stage_pristine_copy(doc_path) {
            Ok(path) => path,
            Err(error) => {
                let context = ErrorContext::new(
                    PipelineStage::Extract,
                    doc_path.to_path_buf(),
                    doc_path.to_path_buf(),
                );
                return self.handler.handle_preparation_failure(&context, &error);
            }
        };
        let context = |stage: PipelineStage| {
            ErrorContext::new(stage, doc_path.to_path_buf(), original.clone())
        };

        let before = match self.extract_before_snapshots(&doc, doc_path, &mut advisories) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                return self
                    .handler
                    .handle_preparation_failure(&context(PipelineStage::Extract), &error)
            }
        };

        let raw_plan = match self.planner.plan(&before).await {
            Ok(value) => value,
            Err(source) => {
                let error = PipelineError::Planning { source };
                return self
                    .handler
                    .handle_preparation_failure(&context(PipelineStage::Plan), &error);
            }
        };
        self.store_artifact("plan.json", &raw_plan);
        debug!("Planner {} produced a plan", self.planner.name());

        // both gates see the raw plan; a malicious plan is reported as
        // such even when it is also malformed
        let plan_result = self.validator.validate(&raw_plan, DocumentKind::Plan);
        let enforcement = self.enforcer.enforce(&raw_plan);
        if !enforcement.is_allowed() {
            let violation = enforcement.primary_violation();
            let mut result = enforcement.result;
            result.warnings.extend(plan_result.warnings);
            result.merge(advisories);
            return self.handler.handle_security_violation(
                &context(PipelineStage::Enforce),
                violation,
                &result,
            );
        }
        if !plan_result.is_valid() {
            let mut result = plan_result;
            result.merge(enforcement.result);
            result.merge(advisories);
            return self.handler.handle_invalid_plan(&result);
        }
        advisories.merge(plan_result);
        advisories.merge(enforcement.result);

        let Some(sanitized) = enforcement.sanitized_plan else {
            let result =
                ValidationResult::failed("sanitize", "sanitized plan missing after enforcement");
            return self.handler.handle_invalid_plan(&result);
        };
        self.store_artifact("plan.sanitized.json", &sanitized);
        let plan = match Plan::from_value(&sanitized) {
            Ok(plan) => plan,
            Err(e) => {
                let result = ValidationResult::failed(
                    "decode",
                    format!("sanitized plan does not decode: {}", e),
                );
                return self.handler.handle_invalid_plan(&result);
            }
        };
        if plan.is_empty() {
            advisories.push_warning("plan", "plan contains no operations");
        }

        info!("Executing {} operation(s)", plan.len());
        debug!(
            "Operation sequence: [{}]",
            plan.kinds()
                .iter()
                .map(|k| k.tag())
                .collect::<Vec<_>>()
                .join(", ")
        );
        for op in &plan.ops {
            match self.engine.dispatch(&mut doc, op) {
                Ok(outcome) => {
                    if !outcome.changed {
                        self.handler
                            .record_noop(&format!("{}: {}", op.kind().tag(), outcome.detail));
                    }
                    operations.push(OperationRecord {
                        operation: op.describe(),
                        changed: outcome.changed,
                        detail: outcome.detail,
                    });
                }
                Err(source) => {
                    let reason = match &source {
                        EngineError::DispatchFailed { reason, .. } => reason.clone(),
                        other => other.to_string(),
                    };
                    operations.push(OperationRecord {
                        operation: op.describe(),
                        changed: false,
                        detail: reason.clone(),
                    });
                    return self.handler.handle_execution_error(
                        &context(PipelineStage::Execute).with_operation(op.kind()),
                        &reason,
                    );
                }
            }
        }

        if let Err(e) = self.engine.save(&mut doc) {
            return self
                .handler
                .handle_execution_error(&context(PipelineStage::Execute), &e.to_string());
        }

        // judge the saved bytes, not the in-memory state
        let after = match self.reload_structure(doc_path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return self
                    .handler
                    .handle_verification_breakdown(&context(PipelineStage::Validate), &e.to_string())
            }
        };
        let verdict = self.assertions.validate(&before, &after);
        if !verdict.is_valid() {
            let mut result = verdict;
            result.merge(advisories);
            return self
                .handler
                .handle_assertion_failure(&context(PipelineStage::Validate), &result);
        }
        advisories.merge(verdict);
        self.handler.handle_success(advisories.warning_messages())
    }

    fn stage_pristine_copy(&self, doc_path: &Path) -> Result<PathBuf, PipelineError> {
        let pristine = self.sink.artifact_path(PRISTINE_FILE);
        fs::copy(doc_path, &pristine).map_err(|e| {
            PipelineError::Configuration(format!(
                "cannot stage pristine copy of {}: {}",
                doc_path.display(),
                e
            ))
        })?;
        debug!("Staged pristine copy at {}", pristine.display());
        Ok(pristine)
    }

    /// Extract, persist and validate the before snapshots, returning the
    /// typed structure
    fn extract_before_snapshots(
        &self,
        doc: &E::Doc,
        doc_path: &Path,
        advisories: &mut ValidationResult,
    ) -> Result<StructureSnapshot, PipelineError> {
        let raw = self.engine.extract_structure(doc).map_err(|source| {
            PipelineError::Extraction {
                path: doc_path.to_path_buf(),
                source,
            }
        })?;
        self.store_artifact("structure.json", &raw);
        let result = self.validator.validate(&raw, DocumentKind::Structure);
        if !result.is_valid() {
            return Err(PipelineError::Validation {
                detail: format!(
                    "structure snapshot failed validation: {}",
                    first_error(&result)
                ),
            });
        }
        advisories.merge(result);
        let snapshot: StructureSnapshot = serde_json::from_value(raw).map_err(|e| {
            PipelineError::Validation {
                detail: format!("structure snapshot does not decode: {}", e),
            }
        })?;

        let inventory = self.engine.extract_inventory(doc).map_err(|source| {
            PipelineError::Extraction {
                path: doc_path.to_path_buf(),
                source,
            }
        })?;
        self.store_artifact("inventory.json", &inventory);
        let result = self.validator.validate(&inventory, DocumentKind::Inventory);
        if !result.is_valid() {
            return Err(PipelineError::Validation {
                detail: format!(
                    "inventory snapshot failed validation: {}",
                    first_error(&result)
                ),
            });
        }
        advisories.merge(result);
        Ok(snapshot)
    }

    /// Reopen the document from disk and extract the after snapshot.
    /// Revisions were already handled on the first open, so the verify
    /// pass must not touch them.
    fn reload_structure(&self, doc_path: &Path) -> Result<StructureSnapshot, PipelineError> {
        let reopened = self
            .engine
            .open(doc_path, RevisionStrategy::Bypass)
            .map_err(|source| PipelineError::Extraction {
                path: doc_path.to_path_buf(),
                source,
            })?;
        let raw = self
            .engine
            .extract_structure(&reopened)
            .map_err(|source| PipelineError::Extraction {
                path: doc_path.to_path_buf(),
                source,
            })?;
        self.store_artifact("structure.after.json", &raw);
        let result = self.validator.validate(&raw, DocumentKind::Structure);
        if !result.is_valid() {
            return Err(PipelineError::Validation {
                detail: format!(
                    "post-execution structure failed validation: {}",
                    first_error(&result)
                ),
            });
        }
        serde_json::from_value(raw).map_err(|e| PipelineError::Validation {
            detail: format!("post-execution structure does not decode: {}", e),
        })
    }

    fn store_artifact(&self, name: &str, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(body) => {
                if let Err(e) = self.sink.write_artifact(name, &body) {
                    warn!("Failed to write audit artifact {}: {}", name, e);
                }
            }
            Err(e) => warn!("Failed to serialize audit artifact {}: {}", name, e),
        }
    }
}

fn first_error(result: &ValidationResult) -> String {
    result
        .error_messages()
        .first()
        .cloned()
        .unwrap_or_else(|| "unspecified".to_string())
}
