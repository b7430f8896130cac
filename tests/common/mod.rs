/*!
 * Common test utilities for the docwarden test suite
 */

use std::path::PathBuf;
use std::fs;
use anyhow::Result;
use serde_json::{json, Value};
use tempfile::TempDir;

// Re-export the mock engine module
pub mod mock_engine;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A thesis-shaped structure snapshot: front matter, two chapters, one
/// sub-section, a stale TOC field and the usual styles
pub fn thesis_structure() -> Value {
    json!({
        "schema_version": "structure.v1",
        "metadata": {
            "title": "測試論文",
            "modified_time": "2026-01-10T09:00:00Z",
            "page_count": 1,
            "word_count": 42
        },
        "styles": [
            { "name": "Normal" },
            { "name": "Body Text", "based_on": "Normal" },
            { "name": "Heading 1", "based_on": "Normal", "size_pt": 16.0, "bold": true },
            { "name": "Heading 2", "based_on": "Heading 1", "size_pt": 14.0 }
        ],
        "paragraphs": [
            { "index": 0, "style": "Heading 1", "preview": "摘要", "is_heading": true, "heading_level": 1 },
            { "index": 1, "style": "Body Text", "preview": "abstract body" },
            { "index": 2, "style": "Heading 1", "preview": "第一章 引言", "is_heading": true, "heading_level": 1 },
            { "index": 3, "style": "Body Text", "preview": "introduction body" },
            { "index": 4, "style": "Heading 2", "preview": "1.1 背景", "is_heading": true, "heading_level": 2 },
            { "index": 5, "style": "Body Text", "preview": "background body" },
            { "index": 6, "style": "Heading 1", "preview": "第二章 方法", "is_heading": true, "heading_level": 1 },
            { "index": 7, "style": "Body Text", "preview": "method body" },
            { "index": 8, "style": "Normal", "preview": "table of contents" }
        ],
        "headings": [
            { "text": "摘要", "level": 1, "paragraph_index": 0 },
            { "text": "第一章 引言", "level": 1, "paragraph_index": 2 },
            { "text": "1.1 背景", "level": 2, "paragraph_index": 4 },
            { "text": "第二章 方法", "level": 1, "paragraph_index": 6 }
        ],
        "fields": [
            { "field_type": "TOC", "paragraph_index": 8, "result_text": "stale entries" }
        ],
        "tables": []
    })
}

/// A bundle wrapping the thesis structure, the way the memory engine
/// persists documents
pub fn thesis_bundle() -> Value {
    json!({
        "structure": thesis_structure(),
        "inventory": { "schema_version": "inventory.full.v1" },
        "direct_formatting": [1, 3]
    })
}

/// Writes a JSON value to a file in the given directory
pub fn write_json(dir: &PathBuf, filename: &str, value: &Value) -> Result<PathBuf> {
    create_test_file(dir, filename, &serde_json::to_string_pretty(value)?)
}

/// Wraps a list of operations into a plan.v1 document
pub fn plan_with_ops(ops: Value) -> Value {
    json!({
        "schema_version": "plan.v1",
        "ops": ops
    })
}
