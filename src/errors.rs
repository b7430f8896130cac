/*!
 * Error types for the docwarden pipeline.
 *
 * The taxonomy follows the failure stages of a run: extraction, planning,
 * security enforcement, execution, post-execution validation, rollback and
 * configuration. Ordinary bad input (an invalid plan, a failed assertion) is
 * never an error here - those are returned as `ValidationResult` values. The
 * variants below are reserved for conditions that abort a stage.
 */

use std::path::PathBuf;

use thiserror::Error;

use crate::plan::OperationKind;

/// Errors raised by a `DocumentEngine` implementation
#[derive(Error, Debug)]
pub enum EngineError {
    /// The document could not be opened
    #[error("failed to open document {path}: {reason}")]
    OpenFailed {
        /// Path of the document
        path: PathBuf,
        /// Engine-supplied reason
        reason: String,
    },

    /// Structure or inventory extraction failed
    #[error("snapshot extraction failed: {0}")]
    ExtractionFailed(String),

    /// An operation could not be dispatched
    #[error("dispatch of {operation} failed: {reason}")]
    DispatchFailed {
        /// Operation that was being executed
        operation: OperationKind,
        /// Engine-supplied reason
        reason: String,
    },

    /// Saving or closing the document failed
    #[error("failed to persist document: {0}")]
    PersistFailed(String),
}

/// Errors raised by a `Planner` implementation
#[derive(Error, Debug)]
pub enum PlannerError {
    /// The planner produced no output at all
    #[error("planner returned no plan: {0}")]
    Empty(String),

    /// The planner backend failed
    #[error("plan generation failed: {0}")]
    GenerationFailed(String),
}

/// Kind tag for a security violation, used in audit records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityViolationKind {
    /// Operation tag outside the fixed whitelist
    WhitelistBypass,
    /// Script/eval/event-handler signature in a parameter
    Injection,
    /// Raw markup, archive paths or encoded blobs smuggled around the
    /// operation vocabulary
    ProtocolEscape,
    /// Formatting-clear without explicit authorization
    MissingAuthorization,
}

impl SecurityViolationKind {
    /// Stable name written into violation records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhitelistBypass => "whitelist_bypass",
            Self::Injection => "injection",
            Self::ProtocolEscape => "protocol_escape",
            Self::MissingAuthorization => "missing_authorization",
        }
    }
}

impl std::fmt::Display for SecurityViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline-level error, one closed kind per failure stage.
///
/// The `ErrorHandler` is the only place these are classified into a terminal
/// `ProcessingStatus`; no variant escapes a run unclassified.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Snapshot extraction failed before anything was mutated
    #[error("extraction failed for {path}: {source}")]
    Extraction {
        /// Document being extracted
        path: PathBuf,
        /// Underlying engine error
        source: EngineError,
    },

    /// The planner failed to produce any plan
    #[error("planning failed: {source}")]
    Planning {
        /// Underlying planner error
        source: PlannerError,
    },

    /// The constraint enforcer detected a violation
    #[error("security violation ({kind}): {detail}")]
    Security {
        /// Violation category
        kind: SecurityViolationKind,
        /// Human-readable detail
        detail: String,
    },

    /// A whitelisted operation failed while executing
    #[error("execution of {operation} failed: {source}")]
    Execution {
        /// Operation that failed
        operation: OperationKind,
        /// Underlying engine error
        source: EngineError,
    },

    /// The post-execution validation stage could not run to completion
    #[error("validation stage failed: {detail}")]
    Validation {
        /// Reason the before/after comparison could not be made
        detail: String,
    },

    /// Rollback itself failed; always escalated, never swallowed
    #[error("rollback failed: {reason}")]
    Rollback {
        /// Why the document could not be restored
        reason: String,
        /// Backup of the pre-rollback bytes, when one was written
        backup: Option<PathBuf>,
    },

    /// Invalid setup detected at startup (corrupt schema definition,
    /// unusable audit directory); fails fast, never per-request
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    /// True for conditions where retrying the same run cannot succeed
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Rollback { .. } | Self::Configuration(_))
    }
}
