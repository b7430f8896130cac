/*!
 * The universal validation report types.
 *
 * Every check in the system - schema validation, constraint enforcement,
 * post-execution assertions - returns a `ValidationResult`. Errors block the
 * run; warnings are advisory and end up in the audit warnings log. Checks
 * never throw for ordinary bad input.
 */

use std::fmt;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Advisory only; the run may continue
    Warning,
    /// Blocks the run
    Error,
}

/// A single finding from one check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Name of the check that produced the issue (e.g. "whitelist",
    /// "authorization", "pagination")
    pub check: String,
    /// Severity of the issue
    pub severity: IssueSeverity,
    /// Description of the issue
    pub message: String,
}

impl ValidationIssue {
    /// Create a warning issue
    pub fn warning(check: &str, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    /// Create an error issue
    pub fn error(check: &str, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            severity: IssueSeverity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            IssueSeverity::Warning => "WARN",
            IssueSeverity::Error => "ERROR",
        };
        write!(f, "[{}] {}: {}", tag, self.check, self.message)
    }
}

/// Outcome of a validation pass: blocking errors plus advisory warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Blocking findings
    pub errors: Vec<ValidationIssue>,
    /// Advisory findings
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// An empty, passing result
    pub fn passed() -> Self {
        Self::default()
    }

    /// A result carrying one blocking error
    pub fn failed(check: &str, message: impl Into<String>) -> Self {
        let mut result = Self::default();
        result.push_error(check, message);
        result
    }

    /// Whether the input may proceed (no blocking errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add a blocking error
    pub fn push_error(&mut self, check: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue::error(check, message));
    }

    /// Add an advisory warning
    pub fn push_warning(&mut self, check: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::warning(check, message));
    }

    /// Fold another result into this one, keeping severities
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// All issues, errors first
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// One-line summary for logs and the status artifact
    pub fn summary(&self) -> String {
        if self.is_valid() && self.warnings.is_empty() {
            "passed".to_string()
        } else {
            format!(
                "{} error(s), {} warning(s)",
                self.errors.len(),
                self.warnings.len()
            )
        }
    }

    /// Error messages only, for terse reporting
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|i| i.message.clone()).collect()
    }

    /// Warning messages only
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|i| i.message.clone()).collect()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation {}", self.summary())
    }
}
