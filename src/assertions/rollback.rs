/*!
 * File rollback.
 *
 * Restores a pristine copy over a mutated document after first preserving
 * the mutated bytes at a predictable backup path, so a rollback never
 * destroys evidence. The restore goes through a temporary file in the
 * target directory and a rename, and the result is digest-verified against
 * the original before the rollback is reported as complete.
 */

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::errors::PipelineError;

/// Suffix appended to the mutated file's name for the pre-rollback backup
pub const BACKUP_SUFFIX: &str = "pre-rollback.bak";

/// Proof of a completed rollback
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackReceipt {
    /// Where the pre-rollback bytes of the mutated file were kept; `None`
    /// when the mutated file never existed
    pub backup: Option<PathBuf>,

    /// Hex SHA-256 of the restored bytes
    pub digest: String,

    /// Restored size in bytes
    pub bytes: u64,
}

/// The backup path used for a given document path
pub fn backup_path(current: &Path) -> PathBuf {
    let file_name = current
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    current.with_file_name(format!("{}.{}", file_name, BACKUP_SUFFIX))
}

/// Restore `original`'s bytes into `current`'s location.
///
/// A missing `original` is fatal and non-retryable: there is nothing to
/// restore from, which is a different situation from an assertion merely
/// failing. All failures surface as `PipelineError::Rollback` so callers
/// can escalate them; they are never folded into ordinary validation
/// results.
pub fn rollback(original: &Path, current: &Path) -> Result<RollbackReceipt, PipelineError> {
    if !original.is_file() {
        return Err(PipelineError::Rollback {
            reason: format!("original snapshot missing: {}", original.display()),
            backup: None,
        });
    }

    let backup = if current.is_file() {
        let backup = backup_path(current);
        fs::copy(current, &backup).map_err(|e| PipelineError::Rollback {
            reason: format!("could not back up {}: {}", current.display(), e),
            backup: None,
        })?;
        Some(backup)
    } else {
        None
    };

    let original_bytes = fs::read(original).map_err(|e| PipelineError::Rollback {
        reason: format!("could not read original {}: {}", original.display(), e),
        backup: backup.clone(),
    })?;

    let target_dir = current.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(target_dir).map_err(|e| PipelineError::Rollback {
        reason: format!("could not stage restore in {}: {}", target_dir.display(), e),
        backup: backup.clone(),
    })?;
    staged
        .write_all(&original_bytes)
        .and_then(|_| staged.flush())
        .map_err(|e| PipelineError::Rollback {
            reason: format!("could not write staged restore: {}", e),
            backup: backup.clone(),
        })?;
    staged
        .persist(current)
        .map_err(|e| PipelineError::Rollback {
            reason: format!("could not move staged restore into place: {}", e),
            backup: backup.clone(),
        })?;

    let restored_bytes = fs::read(current).map_err(|e| PipelineError::Rollback {
        reason: format!("could not verify restored file: {}", e),
        backup: backup.clone(),
    })?;
    if restored_bytes != original_bytes {
        return Err(PipelineError::Rollback {
            reason: format!(
                "restored file does not match original ({} vs {} bytes)",
                restored_bytes.len(),
                original_bytes.len()
            ),
            backup,
        });
    }

    let digest = hex_digest(&restored_bytes);
    info!(
        "rolled back {} from {} ({} bytes, sha256 {})",
        current.display(),
        original.display(),
        restored_bytes.len(),
        &digest[..12]
    );
    Ok(RollbackReceipt {
        backup,
        digest,
        bytes: restored_bytes.len() as u64,
    })
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
