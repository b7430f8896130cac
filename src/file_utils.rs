use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::plan::PLAN_SCHEMA_VERSION;
use crate::snapshot::{INVENTORY_SCHEMA_VERSION, STRUCTURE_SCHEMA_VERSION};

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{}", extension)
        };

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(&normalized_ext[1..]) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Copy a file from one location to another, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow::anyhow!("Source file does not exist: {:?}", from));
        }

        // Ensure the target directory exists
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to)?;

        Ok(())
    }

    /// Detect what kind of JSON document a file holds, by schema_version
    /// first and shape second
    pub fn detect_file_kind<P: AsRef<Path>>(path: P) -> Result<FileKind> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        let content = Self::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("File is not valid JSON: {:?}", path))?;

        if let Some(version) = value.get("schema_version").and_then(Value::as_str) {
            if version == STRUCTURE_SCHEMA_VERSION {
                return Ok(FileKind::Structure);
            }
            if version == PLAN_SCHEMA_VERSION {
                return Ok(FileKind::Plan);
            }
            if version == INVENTORY_SCHEMA_VERSION {
                return Ok(FileKind::Inventory);
            }
        }

        // Engine bundles carry the structure snapshot under a "structure" key
        if value.get("structure").map(|s| s.is_object()).unwrap_or(false) {
            return Ok(FileKind::Bundle);
        }

        Ok(FileKind::Unknown)
    }
}

/// Enum representing the JSON document kinds the tool works with
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FileKind {
    /// Structure snapshot (structure.v1)
    Structure,
    /// Edit plan (plan.v1)
    Plan,
    /// Item inventory (inventory.full.v1)
    Inventory,
    /// Engine bundle wrapping structure and inventory
    Bundle,
    /// Unknown JSON document
    Unknown,
}
