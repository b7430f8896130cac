/*!
 * Per-run audit sink.
 *
 * Each pipeline run owns one audit directory exclusively and writes four
 * artifacts into it: a terminal status file, a newline-delimited warnings
 * log (NOOPs included), an append-only violation log in JSON-lines form,
 * and a NOOP log. The violation log is operator-readable and clearable;
 * nothing else in the crate keeps cross-call state. Sinks are injected by
 * constructor into the components that write to them, never reached through
 * globals.
 */

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal status artifact name
pub const STATUS_FILE: &str = "result.status.txt";

/// Warnings artifact name
pub const WARNINGS_FILE: &str = "warnings.log";

/// Append-only violation log name
pub const VIOLATIONS_FILE: &str = "violations.log";

/// NOOP log name
pub const NOOP_FILE: &str = "noop.log";

/// Pristine pre-execution copy of the document, staged so rollback always
/// has a source
pub const PRISTINE_FILE: &str = "pristine.bak";

/// One appended violation record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityViolationRecord {
    pub timestamp: DateTime<Utc>,
    pub violation_type: String,
    pub context: String,
}

/// Owns one run's audit directory and serializes appends to it
pub struct AuditSink {
    run_id: String,
    dir: PathBuf,
    // Enforcer and handler appends may interleave within one run
    write_lock: Mutex<()>,
}

impl AuditSink {
    /// Create a fresh run directory under `root`, named by a new run id
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let run_id = Uuid::new_v4().to_string();
        let dir = root.as_ref().join(format!("run-{}", run_id));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create audit directory: {:?}", dir))?;
        Ok(Self {
            run_id,
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a named artifact inside this run's directory
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Append one violation record as a JSON line
    pub fn record_violation(&self, violation_type: &str, context: &str) -> Result<()> {
        let record = SecurityViolationRecord {
            timestamp: Utc::now(),
            violation_type: violation_type.to_string(),
            context: context.to_string(),
        };
        let line = serde_json::to_string(&record)
            .context("Failed to serialize violation record")?;
        self.append_line(VIOLATIONS_FILE, &line)
    }

    /// Append one timestamped warning line
    pub fn record_warning(&self, message: &str) -> Result<()> {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        self.append_line(WARNINGS_FILE, &format!("[{}] {}", timestamp, message))
    }

    /// Record a NOOP outcome. NOOPs land in both the NOOP log and the
    /// warnings log so that a warnings-only reader still sees them.
    pub fn record_noop(&self, message: &str) -> Result<()> {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        self.append_line(NOOP_FILE, &format!("[{}] {}", timestamp, message))?;
        self.record_warning(&format!("NOOP: {}", message))
    }

    /// Write the terminal status artifact: status line, summary line, then
    /// the run id and finish timestamp. Later writes replace earlier ones,
    /// so the file always holds the final status.
    pub fn write_status(&self, status: &str, summary: &str) -> Result<()> {
        let path = self.artifact_path(STATUS_FILE);
        let body = format!(
            "{}\n{}\nrun: {}\nfinished: {}\n",
            status,
            summary,
            self.run_id,
            Utc::now().to_rfc3339()
        );
        fs::write(&path, body)
            .with_context(|| format!("Failed to write status artifact: {:?}", path))
    }

    /// Write an optional named artifact (snapshots, diffs)
    pub fn write_artifact(&self, name: &str, content: &str) -> Result<()> {
        let path = self.artifact_path(name);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write audit artifact: {:?}", path))
    }

    /// Read back all violation records in append order
    pub fn read_violations(&self) -> Result<Vec<SecurityViolationRecord>> {
        let path = self.artifact_path(VIOLATIONS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read violation log: {:?}", path))?;
        let mut records = Vec::new();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            let record = serde_json::from_str(line)
                .with_context(|| format!("Corrupt violation record: {}", line))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Truncate the violation log. Operator action; the run itself never
    /// clears it.
    pub fn clear_violations(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let path = self.artifact_path(VIOLATIONS_FILE);
        fs::write(&path, "")
            .with_context(|| format!("Failed to clear violation log: {:?}", path))
    }

    fn append_line(&self, file_name: &str, line: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let path = self.artifact_path(file_name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to append to log file: {:?}", path))
    }
}
