/*!
 * Tests for file utility functions
 */

use std::fs;
use anyhow::Result;
use docwarden::file_utils::{FileKind, FileManager};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    // Create a temporary test file
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(&temp_dir.path().to_path_buf(), "test_file_exists.tmp", "test content")?;

    // Test that file_exists works correctly
    assert!(FileManager::file_exists(test_file.to_str().unwrap()));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that dir_exists returns true for existing directories
#[test]
fn test_dir_exists_withExistingDir_shouldReturnTrue() -> Result<()> {
    // Use the current directory which definitely exists
    let current_dir = ".";

    // Test that dir_exists works correctly
    assert!(FileManager::dir_exists(current_dir));

    Ok(())
}

/// Test that dir_exists returns false for non-existent directories
#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
}

/// Test that ensure_dir creates directories as needed
#[test]
fn test_ensure_dir_withNonExistentDir_shouldCreateDirectory() -> Result<()> {
    // Create a temporary directory for testing
    let temp_dir = common::create_temp_dir()?;
    let test_subdir = temp_dir.path().join("test_subdir");

    // Ensure the subdirectory exists (should create it)
    FileManager::ensure_dir(test_subdir.to_str().unwrap())?;

    // Verify the directory was created
    assert!(test_subdir.exists());
    assert!(test_subdir.is_dir());

    Ok(())
}

/// Test that read_to_string returns file content correctly
#[test]
fn test_read_to_string_withValidFile_shouldReturnContent() -> Result<()> {
    // Create a temporary test file
    let temp_dir = common::create_temp_dir()?;
    let content = "Hello, World!";
    let test_file = common::create_test_file(&temp_dir.path().to_path_buf(), "test_read_file.tmp", content)?;

    // Test read_to_string
    let read_content = FileManager::read_to_string(test_file.to_str().unwrap())?;
    assert_eq!(read_content, content);

    Ok(())
}

/// Test that write_to_file creates file with content correctly
#[test]
fn test_write_to_file_withValidInput_shouldCreateFileWithContent() -> Result<()> {
    // Create a temporary directory for testing
    let temp_dir = common::create_temp_dir()?;
    let test_file = temp_dir.path().join("test_write_file.tmp");
    let content = "Test write content";

    // Test write_to_file
    FileManager::write_to_file(test_file.to_str().unwrap(), content)?;

    // Verify file was created with correct content
    assert!(test_file.exists());
    let read_content = fs::read_to_string(&test_file)?;
    assert_eq!(read_content, content);

    Ok(())
}

/// Test that copy_file copies file correctly
#[test]
fn test_copy_file_withValidInput_shouldCopyFileCorrectly() -> Result<()> {
    // Create a temporary directory and test file
    let temp_dir = common::create_temp_dir()?;
    let content = "Test copy content";
    let source_file = common::create_test_file(&temp_dir.path().to_path_buf(), "source.txt", content)?;
    let dest_file = temp_dir.path().join("dest.txt");

    // Test copy_file
    FileManager::copy_file(source_file.to_str().unwrap(), dest_file.to_str().unwrap())?;

    // Verify destination file was created with correct content
    assert!(dest_file.exists());
    let dest_content = fs::read_to_string(&dest_file)?;
    assert_eq!(dest_content, content);

    Ok(())
}

/// Test that detect_file_kind sniffs every boundary document kind
#[test]
fn test_detect_file_kind_withEachSchemaVersion_shouldClassifyCorrectly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();

    let structure = common::write_json(&dir, "structure.json", &common::thesis_structure())?;
    let plan = common::write_json(&dir, "plan.json", &common::plan_with_ops(serde_json::json!([])))?;
    let bundle = common::write_json(&dir, "bundle.json", &common::thesis_bundle())?;
    let other = common::create_test_file(&dir, "other.json", r#"{"hello":"world"}"#)?;

    assert_eq!(FileManager::detect_file_kind(&structure)?, FileKind::Structure);
    assert_eq!(FileManager::detect_file_kind(&plan)?, FileKind::Plan);
    assert_eq!(FileManager::detect_file_kind(&bundle)?, FileKind::Bundle);
    assert_eq!(FileManager::detect_file_kind(&other)?, FileKind::Unknown);

    Ok(())
}

/// Test that find_files locates JSON files recursively
#[test]
fn test_find_files_withNestedDirectories_shouldFindAllJsonFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let nested = dir.join("nested");
    FileManager::ensure_dir(&nested)?;

    common::create_test_file(&dir, "a.json", "{}")?;
    common::create_test_file(&nested, "b.json", "{}")?;
    common::create_test_file(&dir, "ignored.txt", "not json")?;

    let found = FileManager::find_files(&dir, "json")?;
    assert_eq!(found.len(), 2, "Should find JSON files in nested directories");

    Ok(())
}
