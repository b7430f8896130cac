/*!
 * Tests for application configuration functionality
 */

use std::fs;

use docwarden::app_config::{Config, LogLevel};
use docwarden::recovery::{RevisionStrategy, RollbackPolicy};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.audit_root, std::path::PathBuf::from("audit"));
    assert_eq!(config.revision_strategy, RevisionStrategy::AcceptAll);
    assert_eq!(config.rollback_policy, RollbackPolicy::Rollback);
    assert_eq!(config.enforcement.max_string_length, 1000);
    assert!(config.assertions.forbidden_headings.is_empty());
    assert_eq!(config.log_level, LogLevel::Info);

    assert!(config.validate().is_ok());
}

/// Test that a written default config can be read back unchanged
#[test]
fn test_config_roundTrip_throughFile_shouldPreserveEverySetting() -> anyhow::Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let mut config = Config::default();
    config.rollback_policy = RollbackPolicy::KeepAndWarn;
    config.assertions.forbidden_headings = vec!["Abstract".to_string(), "摘要".to_string()];
    config.enforcement.max_string_length = 500;

    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "docwarden.json",
        &serde_json::to_string_pretty(&config)?,
    )?;

    let loaded: Config = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(loaded.rollback_policy, RollbackPolicy::KeepAndWarn);
    assert_eq!(loaded.assertions.forbidden_headings, config.assertions.forbidden_headings);
    assert_eq!(loaded.enforcement.max_string_length, 500);
    Ok(())
}

/// Test that a config without an explicit rollback policy is rejected
#[test]
fn test_config_withoutRollbackPolicy_shouldNotDeserialize() {
    let raw = r#"{ "audit_root": "audit" }"#;
    let result: Result<Config, _> = serde_json::from_str(raw);
    assert!(result.is_err(), "rollback_policy must be stated explicitly");
}

/// Test that a minimal config file picks up defaults for everything else
#[test]
fn test_config_withMinimalFile_shouldApplyDefaults() {
    let raw = r#"{ "rollback_policy": "keep_and_warn" }"#;
    let config: Config = serde_json::from_str(raw).unwrap();

    assert_eq!(config.rollback_policy, RollbackPolicy::KeepAndWarn);
    assert_eq!(config.revision_strategy, RevisionStrategy::AcceptAll);
    assert_eq!(config.enforcement.max_string_length, 1000);
    assert!((config.assertions.match_threshold - 0.85).abs() < f32::EPSILON);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    // Start with a valid config
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Zero truncation limit
    config.enforcement.max_string_length = 0;
    assert!(config.validate().is_err());
    config.enforcement.max_string_length = 1000;

    // Threshold outside (0, 1]
    config.assertions.match_threshold = 1.5;
    assert!(config.validate().is_err());
    config.assertions.match_threshold = 0.85;

    // Blank forbidden heading
    config.assertions.forbidden_headings = vec!["   ".to_string()];
    assert!(config.validate().is_err());
    config.assertions.forbidden_headings = vec!["Abstract".to_string()];
    assert!(config.validate().is_ok());
}

/// Test that pipeline options mirror the file-level settings
#[test]
fn test_pipelineOptions_shouldCarryConfiguredKnobs() {
    let mut config = Config::default();
    config.revision_strategy = RevisionStrategy::Bypass;
    config.rollback_policy = RollbackPolicy::KeepAndWarn;
    config.enforcement.max_string_length = 250;

    let options = config.pipeline_options();
    assert_eq!(options.strategy, RevisionStrategy::Bypass);
    assert_eq!(options.policy, RollbackPolicy::KeepAndWarn);
    assert_eq!(options.limits.max_string_length, 250);
}

/// Test log level wire values
#[test]
fn test_logLevel_wireValues_shouldBeLowercase() {
    assert_eq!(serde_json::to_string(&LogLevel::Debug).unwrap(), "\"debug\"");
    let parsed: LogLevel = serde_json::from_str("\"trace\"").unwrap();
    assert_eq!(parsed, LogLevel::Trace);
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
}
