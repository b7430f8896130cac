/*!
 * Mock document engine for pipeline tests
 *
 * Wraps the in-memory engine and records every trait call in order, so
 * tests can assert what the orchestrator asked of the engine without
 * touching anything beyond the bundle fixture. Failures can be injected
 * per call kind to drive the recovery paths.
 */

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use docwarden::engine::{DocumentEngine, MemoryDoc, MemoryEngine, OperationOutcome};
use docwarden::errors::EngineError;
use docwarden::plan::AtomicOperation;
use docwarden::recovery::RevisionStrategy;

/// Tracks engine calls in the order the orchestrator makes them
#[derive(Debug, Default)]
pub struct EngineCallTracker {
    /// Call labels such as "open:ACCEPT_ALL" or "dispatch:update_toc"
    pub calls: Vec<String>,
    /// Should the next dispatch fail
    pub fail_dispatch: bool,
    /// Should the next save fail
    pub fail_save: bool,
}

/// Mock engine delegating to the in-memory engine while recording calls
pub struct RecordingEngine {
    inner: MemoryEngine,
    tracker: Arc<Mutex<EngineCallTracker>>,
}

impl RecordingEngine {
    /// Create a recording engine over a fresh in-memory engine
    pub fn new() -> Self {
        RecordingEngine {
            inner: MemoryEngine::new(),
            tracker: Arc::new(Mutex::new(EngineCallTracker::default())),
        }
    }

    /// Get the call tracker
    pub fn tracker(&self) -> Arc<Mutex<EngineCallTracker>> {
        self.tracker.clone()
    }

    /// Configure the mock to fail the next dispatch call
    pub fn fail_next_dispatch(&self) {
        self.tracker.lock().unwrap().fail_dispatch = true;
    }

    /// Configure the mock to fail the next save call
    pub fn fail_next_save(&self) {
        self.tracker.lock().unwrap().fail_save = true;
    }
}

impl DocumentEngine for RecordingEngine {
    type Doc = MemoryDoc;

    fn open(&self, path: &Path, strategy: RevisionStrategy) -> Result<Self::Doc, EngineError> {
        let mut tracker = self.tracker.lock().unwrap();
        tracker.calls.push(format!("open:{}", strategy.as_str()));
        drop(tracker);
        self.inner.open(path, strategy)
    }

    fn extract_structure(&self, doc: &Self::Doc) -> Result<Value, EngineError> {
        let mut tracker = self.tracker.lock().unwrap();
        tracker.calls.push("extract_structure".to_string());
        drop(tracker);
        self.inner.extract_structure(doc)
    }

    fn extract_inventory(&self, doc: &Self::Doc) -> Result<Value, EngineError> {
        let mut tracker = self.tracker.lock().unwrap();
        tracker.calls.push("extract_inventory".to_string());
        drop(tracker);
        self.inner.extract_inventory(doc)
    }

    fn dispatch(
        &self,
        doc: &mut Self::Doc,
        operation: &AtomicOperation,
    ) -> Result<OperationOutcome, EngineError> {
        let mut tracker = self.tracker.lock().unwrap();
        tracker.calls.push(format!("dispatch:{}", operation.kind().tag()));
        if tracker.fail_dispatch {
            tracker.fail_dispatch = false; // Reset for next call
            return Err(EngineError::DispatchFailed {
                operation: operation.kind(),
                reason: "simulated dispatch failure".to_string(),
            });
        }
        drop(tracker);
        self.inner.dispatch(doc, operation)
    }

    fn save(&self, doc: &mut Self::Doc) -> Result<(), EngineError> {
        let mut tracker = self.tracker.lock().unwrap();
        tracker.calls.push("save".to_string());
        if tracker.fail_save {
            tracker.fail_save = false; // Reset for next call
            return Err(EngineError::PersistFailed(
                "simulated disk failure".to_string(),
            ));
        }
        drop(tracker);
        self.inner.save(doc)
    }
}
