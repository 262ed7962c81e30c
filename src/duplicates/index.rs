//! The aggregate result of a scan.
//!
//! A [`DuplicateIndex`] maps each file size to the duplicate groups of that
//! size, keeps the zero-byte files apart, and remembers which
//! [`DirectorySet`] it was computed for. It is never sorted in place:
//! display ordering goes through [`DuplicateIndex::ordered`], which returns a
//! fresh [`IndexView`].

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::DuplicateGroup;
use crate::scanner::DirectorySet;

/// Broken structural invariants found by [`DuplicateIndex::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// A group has fewer than two members.
    #[error("group of size {size} has {members} member(s), expected at least 2")]
    UndersizedGroup {
        /// Size key of the group
        size: u64,
        /// Number of members found
        members: usize,
    },

    /// A group is stored under a key different from its own size.
    #[error("group of size {group_size} stored under size key {key}")]
    SizeMismatch {
        /// Map key the group was found under
        key: u64,
        /// Size recorded in the group
        group_size: u64,
    },

    /// A size key maps to no groups at all.
    #[error("size key {0} has no groups")]
    EmptyBucket(u64),

    /// A zero-byte group was stored; empty files belong in the empty set.
    #[error("zero-byte files stored as a duplicate group")]
    ZeroSizeGroup,

    /// A path appears more than once across groups and the empty set.
    #[error("path listed more than once: {0}")]
    DuplicatePath(PathBuf),
}

/// Size ordering for [`DuplicateIndex::ordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeOrder {
    /// Largest files first
    #[default]
    Descending,
    /// Smallest files first
    Ascending,
}

/// Display ordering preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewOrder {
    /// Order of size buckets
    pub size: SizeOrder,
    /// Sort paths inside each group (and the empty set) lexicographically
    pub alphabetical: bool,
}

impl ViewOrder {
    /// Paths sorted, buckets in the given size order.
    #[must_use]
    pub fn sorted(size: SizeOrder) -> Self {
        Self {
            size,
            alphabetical: true,
        }
    }
}

/// An ordered, owned snapshot of an index for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexView {
    /// Groups in display order
    pub groups: Vec<DuplicateGroup>,
    /// Empty files in display order
    pub empty_files: Vec<PathBuf>,
}

/// Mapping from size to duplicate groups, plus the empty-file set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateIndex {
    dirs: DirectorySet,
    groups: BTreeMap<u64, Vec<DuplicateGroup>>,
    empty_files: Vec<PathBuf>,
}

impl DuplicateIndex {
    /// Create an empty index for `dirs`.
    #[must_use]
    pub fn new(dirs: DirectorySet) -> Self {
        Self {
            dirs,
            groups: BTreeMap::new(),
            empty_files: Vec::new(),
        }
    }

    /// Append a group to its size bucket, after any groups already there.
    ///
    /// Groups with fewer than two members are dissolved, not stored.
    pub fn push_group(&mut self, group: DuplicateGroup) {
        if group.len() < 2 {
            log::trace!("Dissolving single-member group of size {}", group.size);
            return;
        }
        self.groups.entry(group.size).or_default().push(group);
    }

    /// Replace the empty-file set.
    pub fn set_empty_files(&mut self, empty_files: Vec<PathBuf>) {
        self.empty_files = empty_files;
    }

    /// Directories this index was computed for.
    #[must_use]
    pub fn dirs(&self) -> &DirectorySet {
        &self.dirs
    }

    /// Groups keyed by size, ascending.
    #[must_use]
    pub fn by_size(&self) -> &BTreeMap<u64, Vec<DuplicateGroup>> {
        &self.groups
    }

    /// All groups, smallest size first, discovery order within a size.
    pub fn groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.values().flatten()
    }

    /// Zero-byte files.
    #[must_use]
    pub fn empty_files(&self) -> &[PathBuf] {
        &self.empty_files
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Number of files in duplicate groups.
    #[must_use]
    pub fn duplicate_file_count(&self) -> usize {
        self.groups().map(DuplicateGroup::len).sum()
    }

    /// Bytes reclaimable by keeping one copy per group.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.groups()
            .map(DuplicateGroup::wasted_space)
            .fold(0, u64::saturating_add)
    }

    /// Whether any duplicate group exists.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.groups.values().any(|bucket| !bucket.is_empty())
    }

    /// Find the group containing `path`.
    #[must_use]
    pub fn group_of(&self, path: &Path) -> Option<&DuplicateGroup> {
        self.groups().find(|g| g.contains(path))
    }

    /// Produce a freshly ordered view of the index.
    ///
    /// Size buckets follow `order.size`. Groups within a bucket keep
    /// discovery order unless `order.alphabetical` is set, in which case
    /// paths are sorted and groups follow their smallest path.
    #[must_use]
    pub fn ordered(&self, order: ViewOrder) -> IndexView {
        let buckets: Vec<&Vec<DuplicateGroup>> = match order.size {
            SizeOrder::Ascending => self.groups.values().collect(),
            SizeOrder::Descending => self.groups.values().rev().collect(),
        };

        let mut groups = Vec::with_capacity(self.group_count());
        for bucket in buckets {
            let mut bucket = bucket.clone();
            if order.alphabetical {
                for group in &mut bucket {
                    group.paths.sort();
                }
                bucket.sort_by(|a, b| a.paths.first().cmp(&b.paths.first()));
            }
            groups.extend(bucket);
        }

        let mut empty_files = self.empty_files.clone();
        if order.alphabetical {
            empty_files.sort();
        }

        IndexView {
            groups,
            empty_files,
        }
    }

    /// A copy with every path list and bucket sorted.
    ///
    /// Two scans of the same tree are equal after normalization no matter
    /// how the filesystem ordered its entries.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        for bucket in normalized.groups.values_mut() {
            for group in bucket.iter_mut() {
                group.paths.sort();
            }
            bucket.sort_by(|a, b| a.paths.cmp(&b.paths));
        }
        normalized.empty_files.sort();
        normalized
    }

    /// Check the structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first broken invariant found.
    pub fn validate(&self) -> Result<(), IndexError> {
        let mut seen: HashSet<&Path> = HashSet::new();

        for (&key, bucket) in &self.groups {
            if bucket.is_empty() {
                return Err(IndexError::EmptyBucket(key));
            }
            for group in bucket {
                if group.size != key {
                    return Err(IndexError::SizeMismatch {
                        key,
                        group_size: group.size,
                    });
                }
                if group.size == 0 {
                    return Err(IndexError::ZeroSizeGroup);
                }
                if group.len() < 2 {
                    return Err(IndexError::UndersizedGroup {
                        size: key,
                        members: group.len(),
                    });
                }
                for path in &group.paths {
                    if !seen.insert(path.as_path()) {
                        return Err(IndexError::DuplicatePath(path.clone()));
                    }
                }
            }
        }

        for path in &self.empty_files {
            if !seen.insert(path.as_path()) {
                return Err(IndexError::DuplicatePath(path.clone()));
            }
        }

        Ok(())
    }
}
