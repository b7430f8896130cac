use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::assertions::AssertionConfig;
use crate::enforcer::EnforcementLimits;
use crate::pipeline::PipelineOptions;
use crate::recovery::{RevisionStrategy, RollbackPolicy};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Root directory that receives one audit directory per run
    #[serde(default = "default_audit_root")]
    pub audit_root: PathBuf,

    /// Revision handling applied when the document is opened
    #[serde(default = "default_revision_strategy")]
    pub revision_strategy: RevisionStrategy,

    /// What happens to the document when post-execution assertions fail.
    /// Deliberately has no serde default: the config file must state the
    /// choice.
    pub rollback_policy: RollbackPolicy,

    /// Constraint enforcement tuning
    #[serde(default)]
    pub enforcement: EnforcementConfig,

    /// Post-execution assertion configuration
    #[serde(default)]
    pub assertions: AssertionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Enforcement settings exposed in the config file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnforcementConfig {
    // @field: Truncation limit applied to every string parameter
    #[serde(default = "default_max_string_length")]
    pub max_string_length: usize,
}

impl EnforcementConfig {
    // @returns: Limits in the form the enforcer consumes
    pub fn limits(&self) -> EnforcementLimits {
        EnforcementLimits {
            max_string_length: self.max_string_length,
        }
    }
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            max_string_length: default_max_string_length(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching filter for the log facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_audit_root() -> PathBuf {
    PathBuf::from("audit")
}

fn default_revision_strategy() -> RevisionStrategy {
    // tracked revisions are accepted before editing so snapshots see the
    // final text
    RevisionStrategy::AcceptAll
}

fn default_max_string_length() -> usize {
    1000
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.audit_root.as_os_str().is_empty() {
            return Err(anyhow!("audit_root must not be empty"));
        }

        if self.enforcement.max_string_length == 0 {
            return Err(anyhow!("enforcement.max_string_length must be at least 1"));
        }

        let threshold = self.assertions.match_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(anyhow!(
                "assertions.match_threshold must be in (0, 1], got {}",
                threshold
            ));
        }

        if self
            .assertions
            .forbidden_headings
            .iter()
            .any(|h| h.trim().is_empty())
        {
            return Err(anyhow!("assertions.forbidden_headings must not contain empty entries"));
        }

        if self
            .assertions
            .required_styles
            .iter()
            .any(|s| s.name.trim().is_empty())
        {
            return Err(anyhow!("assertions.required_styles entries must be named"));
        }

        Ok(())
    }

    /// Collapse the file-level settings into pipeline options
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            strategy: self.revision_strategy,
            policy: self.rollback_policy,
            limits: self.enforcement.limits(),
            assertions: self.assertions.clone(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            audit_root: default_audit_root(),
            revision_strategy: default_revision_strategy(),
            // the generated file states the choice explicitly
            rollback_policy: RollbackPolicy::Rollback,
            enforcement: EnforcementConfig::default(),
            assertions: AssertionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
