//! Per-file deletion with pre-delete verification.
//!
//! # Overview
//!
//! This module removes single files on behalf of a [`DeletionPlan`]:
//! - Permanent deletion (default)
//! - Move to system trash (recoverable)
//! - Dry run, which inspects but never mutates
//! - Size verification to detect files changed since the scan
//!
//! # Safety
//!
//! Every target is re-inspected right before removal. A path that has
//! become a directory or a symlink is refused, and a size different from the
//! scanned size is reported as [`DeleteError::Modified`].
//!
//! [`DeletionPlan`]: super::DeletionPlan

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path is no longer a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// File size changed since scan.
    #[error("file modified since scan: {path} (size {expected} → {actual})")]
    Modified {
        /// Path of the changed file
        path: PathBuf,
        /// Size recorded by the scan
        expected: u64,
        /// Size found now
        actual: u64,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// Path that could not be trashed
        path: PathBuf,
        /// Message from the trash backend
        message: String,
    },

    /// No retained copy of the group exists any more, so nothing was deleted.
    #[error("no surviving copy left for the group of {0}, refusing to delete")]
    NoSurvivor(PathBuf),

    /// Attempted to delete all copies (at least one must be preserved).
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotAFile(p)
            | Self::Modified { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::NoSurvivor(p)
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// How files are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// `std::fs::remove_file`
    #[default]
    Permanent,
    /// Move to the platform trash
    Trash,
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Inspect targets and report, but never remove anything.
    pub dry_run: bool,
    /// Removal method.
    pub mode: DeleteMode,
    /// Refuse to delete files whose size changed since the scan.
    pub verify_size: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            mode: DeleteMode::Permanent,
            verify_size: true,
        }
    }
}

impl DeleteConfig {
    /// Config for a dry run.
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    /// Enable/disable dry run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the removal method.
    #[must_use]
    pub fn with_mode(mut self, mode: DeleteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable/disable size verification.
    #[must_use]
    pub fn with_verify_size(mut self, verify: bool) -> Self {
        self.verify_size = verify;
        self
    }
}

/// Current state of a path about to be deleted.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

impl FileSnapshot {
    /// Inspect `path` without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns error if the path is missing, inaccessible, or not a regular file.
    pub fn capture(path: &Path) -> Result<Self, DeleteError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(DeleteError::NotAFile(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }

    /// Check the size against what the scan recorded.
    ///
    /// # Errors
    ///
    /// Returns [`DeleteError::Modified`] on mismatch.
    pub fn verify_size(&self, expected: u64) -> Result<(), DeleteError> {
        if self.size != expected {
            log::warn!(
                "File modified since scan: {} (size changed from {} to {})",
                self.path.display(),
                expected,
                self.size
            );
            return Err(DeleteError::Modified {
                path: self.path.clone(),
                expected,
                actual: self.size,
            });
        }
        Ok(())
    }
}

/// Whether `path` currently exists as a regular file.
#[must_use]
pub fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_file())
}

/// Delete (or, in a dry run, vet) one file.
///
/// Returns the number of bytes freed, or that would be freed.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `NotAFile` if the path is now a directory or symlink
/// - `Modified` if `expected_size` is given, verification is on, and it differs
/// - `PermissionDenied`, `TrashFailed` or `Io` if removal fails
pub fn delete_path(
    path: &Path,
    expected_size: Option<u64>,
    config: &DeleteConfig,
) -> Result<u64, DeleteError> {
    let snapshot = FileSnapshot::capture(path)?;
    if config.verify_size {
        if let Some(expected) = expected_size {
            snapshot.verify_size(expected)?;
        }
    }

    if config.dry_run {
        log::debug!("Would delete: {} ({} bytes)", path.display(), snapshot.size);
        return Ok(snapshot.size);
    }

    match config.mode {
        DeleteMode::Permanent => {
            fs::remove_file(path).map_err(|e| {
                log::error!("Permanent delete failed for {}: {}", path.display(), e);
                DeleteError::from_io(path, e)
            })?;
            log::info!("Permanently deleted: {} ({} bytes)", path.display(), snapshot.size);
        }
        DeleteMode::Trash => {
            trash::delete(path).map_err(|e| {
                log::error!("Trash operation failed for {}: {}", path.display(), e);
                DeleteError::TrashFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?;
            log::info!("Moved to trash: {} ({} bytes)", path.display(), snapshot.size);
        }
    }

    Ok(snapshot.size)
}

/// Validate that a selection doesn't delete all copies.
///
/// At least one copy of each duplicate group must be preserved.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if all copies would be deleted.
///
/// # Example
///
/// ```
/// use dupsweep::actions::delete::validate_preserves_copy;
/// use std::path::PathBuf;
///
/// let group = vec![
///     PathBuf::from("/original.txt"),
///     PathBuf::from("/copy1.txt"),
///     PathBuf::from("/copy2.txt"),
/// ];
///
/// let selected = vec![PathBuf::from("/copy1.txt"), PathBuf::from("/copy2.txt")];
/// assert!(validate_preserves_copy(&selected, &group).is_ok());
///
/// assert!(validate_preserves_copy(&group, &group).is_err());
/// ```
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), DeleteError> {
    use std::collections::HashSet;

    let selected_set: HashSet<&PathBuf> = selected_paths.iter().collect();
    let preserved_count = group_paths
        .iter()
        .filter(|p| !selected_set.contains(p))
        .count();

    if preserved_count == 0 {
        log::error!(
            "Attempted to delete all {} copies of a duplicate group",
            group_paths.len()
        );
        Err(DeleteError::AllCopiesWouldBeDeleted)
    } else {
        log::debug!(
            "Deletion validated: {} files selected, {} preserved",
            selected_paths.len(),
            preserved_count
        );
        Ok(())
    }
}
