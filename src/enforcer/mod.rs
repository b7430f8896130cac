/*!
 * Defense-in-depth constraint enforcement for untrusted plans.
 *
 * The enforcer re-validates a plan from scratch, trusting neither the
 * planner nor the schema validator that already ran. It is stateless apart
 * from the injected audit sink: every failing check appends one timestamped
 * violation record there, and nothing else is remembered across calls.
 *
 * A plan only passes when every check passes; the sanitized plan is
 * withheld whenever any error was found, so downstream stages cannot
 * execute a partially-cleaned plan by mistake.
 */

pub mod checks;
pub mod sanitize;
pub mod suspicious;

pub use sanitize::{detect_injection, sanitize_input, Sanitized};

use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::audit::AuditSink;
use crate::errors::{PipelineError, SecurityViolationKind};
use crate::plan::{AtomicOperation, MatchMode, Plan};
use crate::report::ValidationResult;

static SUSPICIOUS_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\<>:*?|"]|\.\."#).expect("name pattern must compile"));

/// Run the sink-free gates over one plan: whitelist, idiom scans,
/// authorization, protocol escape and injection detection. Nothing is
/// recorded anywhere, which makes this usable for offline file checking;
/// [`ConstraintEnforcer::enforce`] runs the same gates plus sanitization,
/// per-operation preflight and the audit trail.
pub fn check_plan(raw_plan: &Value) -> ValidationResult {
    let mut result = ValidationResult::passed();
    let serialized = raw_plan.to_string();
    result.merge(checks::validate_whitelist(raw_plan));
    result.merge(checks::validate_no_string_replacement(&serialized));
    result.merge(checks::validate_object_layer_only(&serialized));
    result.merge(checks::validate_authorization(raw_plan));
    result.merge(suspicious::scan_for_protocol_escape(raw_plan));
    match sanitize::sanitize_input(raw_plan, usize::MAX) {
        Ok(_) => {}
        Err(PipelineError::Security { detail, .. }) => result.push_error("injection", detail),
        Err(other) => result.push_error("injection", other.to_string()),
    }
    result
}

/// Tunable limits for enforcement; everything else about the checks is
/// fixed on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementLimits {
    /// Strings longer than this are truncated during sanitization
    pub max_string_length: usize,
}

impl Default for EnforcementLimits {
    fn default() -> Self {
        Self {
            max_string_length: 1000,
        }
    }
}

/// What enforcement concluded about one plan
#[derive(Debug, Clone, PartialEq)]
pub struct EnforcementOutcome {
    /// Aggregated findings of every check
    pub result: ValidationResult,

    /// Sanitized plan, present only when no check failed
    pub sanitized_plan: Option<Value>,
}

impl EnforcementOutcome {
    /// Whether the plan may proceed to execution
    pub fn is_allowed(&self) -> bool {
        self.result.is_valid()
    }

    /// Most severe violation class among the findings, for status mapping
    pub fn primary_violation(&self) -> Option<SecurityViolationKind> {
        let has = |check: &str| self.result.errors.iter().any(|e| e.check == check);
        if has("injection") {
            Some(SecurityViolationKind::Injection)
        } else if has("protocol_escape") {
            Some(SecurityViolationKind::ProtocolEscape)
        } else if has("whitelist") || has("string_replacement") || has("object_layer") {
            Some(SecurityViolationKind::WhitelistBypass)
        } else if has("authorization") {
            Some(SecurityViolationKind::MissingAuthorization)
        } else {
            None
        }
    }
}

/// Runs the full constraint pipeline over raw plans
pub struct ConstraintEnforcer {
    sink: Arc<AuditSink>,
    limits: EnforcementLimits,
}

impl ConstraintEnforcer {
    pub fn new(sink: Arc<AuditSink>, limits: EnforcementLimits) -> Self {
        Self { sink, limits }
    }

    /// Run every check over one untrusted plan. Checks never short-circuit
    /// each other, so the outcome carries the complete picture for the
    /// operator.
    pub fn enforce(&self, raw_plan: &Value) -> EnforcementOutcome {
        let mut result = ValidationResult::passed();
        let serialized = raw_plan.to_string();

        let whitelist = checks::validate_whitelist(raw_plan);
        self.record_if_failed(SecurityViolationKind::WhitelistBypass, &whitelist);
        result.merge(whitelist);

        let replacement = checks::validate_no_string_replacement(&serialized);
        self.record_if_failed(SecurityViolationKind::WhitelistBypass, &replacement);
        result.merge(replacement);

        let object_layer = checks::validate_object_layer_only(&serialized);
        self.record_if_failed(SecurityViolationKind::WhitelistBypass, &object_layer);
        result.merge(object_layer);

        let authorization = checks::validate_authorization(raw_plan);
        self.record_if_failed(SecurityViolationKind::MissingAuthorization, &authorization);
        result.merge(authorization);

        let sanitized_plan = match sanitize::sanitize_input(raw_plan, self.limits.max_string_length)
        {
            Ok(sanitized) => {
                for warning in sanitized.warnings {
                    result.push_warning("sanitize", warning);
                }
                Some(sanitized.value)
            }
            Err(PipelineError::Security { kind, detail }) => {
                self.record(kind, &detail);
                result.push_error("injection", detail);
                None
            }
            Err(other) => {
                result.push_error("injection", other.to_string());
                None
            }
        };

        let escape = suspicious::scan_for_protocol_escape(raw_plan);
        self.record_if_failed(SecurityViolationKind::ProtocolEscape, &escape);
        result.merge(escape);

        if let Ok(plan) = Plan::from_value(raw_plan) {
            self.preflight(&plan, &mut result);
        }

        debug!(
            "enforcement finished: {} ({} violation record(s) possible)",
            result.summary(),
            result.errors.len()
        );
        EnforcementOutcome {
            sanitized_plan: if result.is_valid() { sanitized_plan } else { None },
            result,
        }
    }

    /// Per-operation advisory pass over the typed plan. Tag membership and
    /// clear-formatting authorization are already hard-checked above; this
    /// layer flags heading matchers and names that deserve an operator's
    /// eye without blocking the run.
    fn preflight(&self, plan: &Plan, result: &mut ValidationResult) {
        for (i, op) in plan.ops.iter().enumerate() {
            match op {
                AtomicOperation::DeleteSectionByHeading {
                    heading_text,
                    match_mode,
                    ..
                } => {
                    if *match_mode == MatchMode::Regex {
                        warn_complex_regex(i, heading_text, result);
                    }
                    warn_suspicious_name(i, "heading_text", heading_text, result);
                }
                AtomicOperation::SetStyleRule { style_name, .. } => {
                    warn_suspicious_name(i, "style_name", style_name, result);
                }
                AtomicOperation::ReassignParagraphsToStyle {
                    from_style,
                    to_style,
                } => {
                    warn_suspicious_name(i, "from_style", from_style, result);
                    warn_suspicious_name(i, "to_style", to_style, result);
                }
                _ => {}
            }
        }
    }

    fn record_if_failed(&self, kind: SecurityViolationKind, sub_result: &ValidationResult) {
        if sub_result.is_valid() {
            return;
        }
        let context = sub_result.error_messages().join("; ");
        self.record(kind, &context);
    }

    fn record(&self, kind: SecurityViolationKind, context: &str) {
        if let Err(e) = self.sink.record_violation(kind.as_str(), context) {
            // The check itself still fails the plan; only the audit trail
            // is degraded.
            warn!("Failed to append violation record: {}", e);
        }
    }
}

fn warn_complex_regex(i: usize, pattern: &str, result: &mut ValidationResult) {
    match Regex::new(pattern) {
        Err(e) => {
            result.push_warning(
                "preflight",
                format!("ops[{}]: heading pattern does not compile: {}", i, e),
            );
        }
        Ok(_) => {
            if pattern.contains(".*") || pattern.contains(".+") {
                result.push_warning(
                    "preflight",
                    format!(
                        "ops[{}]: heading pattern \"{}\" contains a greedy wildcard",
                        i, pattern
                    ),
                );
            }
            if pattern.chars().count() > 100 {
                result.push_warning(
                    "preflight",
                    format!("ops[{}]: heading pattern is unusually long", i),
                );
            }
        }
    }
}

fn warn_suspicious_name(i: usize, field: &str, value: &str, result: &mut ValidationResult) {
    if SUSPICIOUS_NAME_CHARS.is_match(value) || value.trim() != value {
        result.push_warning(
            "preflight",
            format!(
                "ops[{}]: {} \"{}\" contains suspicious characters",
                i, field, value
            ),
        );
    }
}
