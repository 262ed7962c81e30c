//! Scanner module for directory normalization, traversal and file hashing.
//!
//! This module provides functionality for:
//! - Validating and de-overlapping input directories ([`DirectorySet`])
//! - Parallel directory walking using jwalk
//! - Streaming content hashing with BLAKE3
//! - Unicode path normalization for stable keys
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`pathset`]: Input directory validation and overlap removal
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (chunked streaming)
//! - [`path_utils`]: NFC normalization helpers
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{DirectorySet, Walker};
//!
//! let dirs = DirectorySet::new(["."]).unwrap();
//! for root in dirs.iter() {
//!     for entry in Walker::new(root).walk() {
//!         match entry {
//!             Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!             Err(e) => eprintln!("Warning: {}", e),
//!         }
//!     }
//! }
//! ```

pub mod hasher;
pub mod path_utils;
pub mod pathset;
pub mod walker;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Hash, Hasher, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use pathset::{DirectorySet, PathSetError};
pub use walker::{MultiWalker, Walker};

/// Metadata for a discovered file.
///
/// An immutable snapshot taken at scan time: the absolute path and the
/// byte size observed when the file was listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }

    /// Whether this is a zero-byte file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Errors that can occur during directory scanning.
///
/// None of these abort a scan; they are collected as warnings.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file vanished between being listed and being inspected.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while inspecting `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io {
                path,
                source: Arc::new(error),
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Interrupted(p)
            | Self::Io { path: p, .. } => p,
        }
    }
}
