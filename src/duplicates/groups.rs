//! Duplicate grouping and size-based file organization.
//!
//! # Overview
//!
//! Size grouping is the first phase of duplicate detection. Files with
//! different sizes cannot be duplicates, so [`group_by_size`] buckets every
//! discovered file by exact byte size and drops buckets with a single member
//! before any content is read. Zero-byte files are set aside as the empty
//! file set and never hashed.
//!
//! # Example
//!
//! ```
//! use dupsweep::scanner::FileEntry;
//! use dupsweep::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//!     FileEntry::new(PathBuf::from("/empty.txt"), 0),
//! ];
//!
//! let grouping = group_by_size(files);
//!
//! assert_eq!(grouping.stats.total_files, 4);
//! assert_eq!(grouping.stats.potential_duplicates, 2);
//! assert_eq!(grouping.groups.len(), 1);
//! assert_eq!(grouping.empty_files, vec![PathBuf::from("/empty.txt")]);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// Confirmed duplicate group: files sharing both size and content hash.
///
/// A group always holds at least two distinct paths, kept in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// BLAKE3 hash of the file content
    #[serde(with = "hex_hash")]
    pub hash: Hash,
    /// File size in bytes (shared by all files)
    pub size: u64,
    /// Paths of the identical files
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(hash: Hash, size: u64, paths: Vec<PathBuf>) -> Self {
        Self { hash, size, paths }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size.saturating_mul(self.paths.len() as u64)
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size.saturating_mul(self.duplicate_count() as u64)
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Whether `path` is a member of this group.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

/// Serialize hashes as hex strings so cache records and JSON output stay readable.
mod hex_hash {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::scanner::{hash_to_hex, hex_to_hash, Hash};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hash_to_hex(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex_to_hash(&hex).ok_or_else(|| D::Error::custom(format!("invalid hash: {hex}")))
    }
}

/// Statistics from size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique non-zero file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of empty files encountered (size 0, handled separately)
    pub empty_files: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Result of [`group_by_size`].
#[derive(Debug, Clone, Default)]
pub struct SizeGrouping {
    /// Non-zero sizes with 2+ files, paths in discovery order
    pub groups: BTreeMap<u64, Vec<PathBuf>>,
    /// Zero-byte files in discovery order
    pub empty_files: Vec<PathBuf>,
    /// Counters for the grouping pass
    pub stats: GroupingStats,
}

impl SizeGrouping {
    /// Number of files that still need hashing.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Group files by size.
///
/// Returns the size buckets with 2+ files, the zero-byte files, and
/// statistics. No file I/O is performed.
#[must_use]
pub fn group_by_size(files: impl IntoIterator<Item = FileEntry>) -> SizeGrouping {
    let mut all_groups: BTreeMap<u64, Vec<PathBuf>> = BTreeMap::new();
    let mut empty_files = Vec::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;

        if file.is_empty() {
            log::trace!("Empty file encountered: {}", file.path.display());
            empty_files.push(file.path);
            continue;
        }

        all_groups.entry(file.size).or_default().push(file.path);
    }

    stats.empty_files = empty_files.len();
    stats.unique_sizes = all_groups.len();

    all_groups.retain(|size, paths| {
        if paths.len() == 1 {
            stats.eliminated_unique += 1;
            log::trace!("Eliminated unique size {}: {}", size, paths[0].display());
            false
        } else {
            stats.potential_duplicates += paths.len();
            stats.duplicate_groups += 1;
            log::debug!("Size group {} bytes: {} potential duplicates", size, paths.len());
            true
        }
    });

    log::info!(
        "Size grouping complete: {} files → {} potential duplicates ({:.1}% eliminated), {} empty",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate(),
        stats.empty_files
    );

    SizeGrouping {
        groups: all_groups,
        empty_files,
        stats,
    }
}
