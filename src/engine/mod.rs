/*!
 * Document engine abstraction.
 *
 * An engine owns the actual document: it opens it, produces the raw
 * structure and inventory snapshots the validators consume, executes one
 * whitelisted operation at a time and persists the result. Everything
 * above the engine works on snapshots and plans only; nothing above it
 * touches document internals.
 */

pub mod memory;

use std::path::Path;

use serde_json::Value;

use crate::errors::EngineError;
use crate::plan::AtomicOperation;
use crate::recovery::RevisionStrategy;

pub use memory::{MemoryDoc, MemoryEngine};

/// What a single dispatched operation did to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    /// False when the operation matched nothing
    pub changed: bool,
    /// Engine-supplied description of what happened
    pub detail: String,
}

impl OperationOutcome {
    /// The operation mutated the document
    pub fn applied(detail: impl Into<String>) -> Self {
        Self {
            changed: true,
            detail: detail.into(),
        }
    }

    /// The operation matched nothing and left the document untouched
    pub fn noop(detail: impl Into<String>) -> Self {
        Self {
            changed: false,
            detail: detail.into(),
        }
    }
}

/// Backend that executes whitelisted operations against a real document.
///
/// Snapshots are returned as raw JSON so the schema validator sees them
/// exactly as an untrusted boundary would; typed decoding happens only
/// after validation passed.
pub trait DocumentEngine {
    /// Handle to one open document
    type Doc;

    /// Open the document, applying the revision strategy before any
    /// snapshot is taken
    fn open(&self, path: &Path, strategy: RevisionStrategy) -> Result<Self::Doc, EngineError>;

    /// Produce the raw structure snapshot
    fn extract_structure(&self, doc: &Self::Doc) -> Result<Value, EngineError>;

    /// Produce the raw inventory snapshot
    fn extract_inventory(&self, doc: &Self::Doc) -> Result<Value, EngineError>;

    /// Execute one operation. Matching nothing is a NOOP outcome, not an
    /// error.
    fn dispatch(
        &self,
        doc: &mut Self::Doc,
        operation: &AtomicOperation,
    ) -> Result<OperationOutcome, EngineError>;

    /// Persist the document. Always advances the modification timestamp,
    /// even for an all-NOOP run.
    fn save(&self, doc: &mut Self::Doc) -> Result<(), EngineError>;
}
