//! JSON output formatter for scan results and deletion reports.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "directories": ["/data/a", "/data/b"],
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "files": ["/data/a/file1.txt", "/data/b/file1.txt"]
//!     }
//!   ],
//!   "empty_files": ["/data/a/empty.txt"],
//!   "warnings": [{ "path": "/data/a/gone.txt", "message": "file not found: ..." }],
//!   "summary": {
//!     "total_files": 100,
//!     "duplicate_groups": 5,
//!     "reclaimable_space": 51200,
//!     "scan_duration_ms": 1234
//!   }
//! }
//! ```
//!
//! `summary` is `null` when the index came from the cache.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::actions::DeletionReport;
use crate::duplicates::{DuplicateGroup, IndexView, ScanSummary, ScanWarning};
use crate::error::ExitCode;
use crate::scanner::DirectorySet;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Paths of all members
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Create a JSON duplicate group from a DuplicateGroup.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            files: group.paths.iter().map(|p| path_string(p)).collect(),
        }
    }
}

/// A skipped file.
#[derive(Debug, Clone, Serialize)]
pub struct JsonWarning {
    /// Path that was skipped
    pub path: String,
    /// Why it was skipped
    pub message: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files scanned
    pub total_files: usize,
    /// Total size of all scanned files in bytes
    pub total_size: u64,
    /// Number of zero-byte files
    pub empty_files: usize,
    /// Files ruled out because their size was unique
    pub eliminated_by_size: usize,
    /// Number of files hashed
    pub hashed_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one copy per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates (bytes)
    pub reclaimable_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
}

impl From<&ScanSummary> for JsonSummary {
    fn from(summary: &ScanSummary) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            empty_files: summary.empty_files,
            eliminated_by_size: summary.eliminated_by_size,
            hashed_files: summary.hashed_files,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
        }
    }
}

/// Complete JSON document for a scan result.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Directories the result covers
    pub directories: Vec<String>,
    /// Duplicate groups, in display order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Zero-byte files
    pub empty_files: Vec<String>,
    /// Files skipped during the scan
    pub warnings: Vec<JsonWarning>,
    /// Scan statistics, absent for cached results
    pub summary: Option<JsonSummary>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonOutput {
    /// Build the document from an ordered view.
    ///
    /// # Example
    ///
    /// ```
    /// use dupsweep::duplicates::{DuplicateGroup, DuplicateIndex, ViewOrder};
    /// use dupsweep::error::ExitCode;
    /// use dupsweep::output::json::JsonOutput;
    /// use dupsweep::scanner::DirectorySet;
    /// use std::path::PathBuf;
    ///
    /// let mut index = DuplicateIndex::new(DirectorySet::from_canonical(vec!["/d".into()]));
    /// index.push_group(DuplicateGroup::new(
    ///     [0u8; 32],
    ///     1024,
    ///     vec![PathBuf::from("/d/file1.txt"), PathBuf::from("/d/file2.txt")],
    /// ));
    ///
    /// let view = index.ordered(ViewOrder::default());
    /// let output = JsonOutput::new(index.dirs(), &view, None, &[], ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// ```
    #[must_use]
    pub fn new(
        dirs: &DirectorySet,
        view: &IndexView,
        summary: Option<&ScanSummary>,
        warnings: &[ScanWarning],
        exit_code: ExitCode,
    ) -> Self {
        Self {
            directories: dirs.iter().map(path_string).collect(),
            duplicates: view
                .groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            empty_files: view.empty_files.iter().map(|p| path_string(p)).collect(),
            warnings: warnings
                .iter()
                .map(|w| JsonWarning {
                    path: path_string(w.path()),
                    message: w.to_string(),
                })
                .collect(),
            summary: summary.map(JsonSummary::from),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        write_json(writer, self)
    }
}

/// A path that could not be deleted.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// Path that was not deleted
    pub path: String,
    /// Why
    pub error: String,
}

/// JSON document for a deletion run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeletionReport {
    /// Whether nothing was actually removed
    pub dry_run: bool,
    /// Paths deleted (or that would be)
    pub deleted: Vec<String>,
    /// Paths not deleted
    pub failed: Vec<JsonFailure>,
    /// Bytes freed (or that would be)
    pub bytes_freed: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

impl JsonDeletionReport {
    /// Build the document from a deletion report.
    #[must_use]
    pub fn new(report: &DeletionReport, exit_code: ExitCode) -> Self {
        Self {
            dry_run: report.dry_run,
            deleted: report.deleted.iter().map(|p| path_string(p)).collect(),
            failed: report
                .failed
                .iter()
                .map(|(path, error)| JsonFailure {
                    path: path_string(path),
                    error: error.to_string(),
                })
                .collect(),
            bytes_freed: report.bytes_freed,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        write_json(writer, self)
    }
}

fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), JsonOutputError> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
