//! Input directory validation and overlap removal.
//!
//! A [`DirectorySet`] is the canonical form of the directories a user asked
//! for: every member exists, is a directory, is canonicalized, and no member
//! is nested inside another. The set is kept sorted so that the same
//! directories given in any order produce an identical set. It is used both
//! as the walk input and as the cache key.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::path_utils::is_within;

/// Errors raised while validating input directories.
///
/// These are the only errors that abort an operation before it starts.
#[derive(thiserror::Error, Debug)]
pub enum PathSetError {
    /// No directories were supplied.
    #[error("at least one directory is required")]
    Empty,

    /// The path does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The path could not be resolved for another reason.
    #[error("Cannot resolve {path}: {source}")]
    Io {
        /// Path as supplied by the caller
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// A validated, canonical, non-overlapping, sorted set of directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectorySet {
    dirs: Vec<PathBuf>,
}

impl DirectorySet {
    /// Validate and normalize a collection of directory paths.
    ///
    /// # Errors
    ///
    /// Returns [`PathSetError`] if the collection is empty or any entry is
    /// missing or not a directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupsweep::scanner::DirectorySet;
    ///
    /// // "/data/photos" is nested in "/data" and is dropped
    /// let dirs = DirectorySet::new(["/data/photos", "/data"]).unwrap();
    /// assert_eq!(dirs.len(), 1);
    /// ```
    pub fn new<I, P>(paths: I) -> Result<Self, PathSetError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut resolved = Vec::new();
        for path in paths {
            resolved.push(Self::resolve(path.as_ref())?);
        }

        if resolved.is_empty() {
            return Err(PathSetError::Empty);
        }

        Ok(Self::from_canonical(resolved))
    }

    /// Build a set from already-canonical paths without touching the filesystem.
    ///
    /// Duplicates and nested entries are still collapsed. Used when reading
    /// persisted directory sets back.
    #[must_use]
    pub fn from_canonical(mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        paths.dedup();

        // After sorting, an ancestor always precedes its descendants.
        let mut dirs: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(parent) = dirs.iter().find(|kept| is_within(&path, kept)) {
                log::debug!(
                    "Dropping nested directory {} (inside {})",
                    path.display(),
                    parent.display()
                );
                continue;
            }
            dirs.push(path);
        }

        Self { dirs }
    }

    fn resolve(path: &Path) -> Result<PathBuf, PathSetError> {
        let canonical = path.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PathSetError::NotFound(path.to_path_buf()),
            _ => PathSetError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if !canonical.is_dir() {
            return Err(PathSetError::NotADirectory(path.to_path_buf()));
        }

        Ok(canonical)
    }

    /// Iterate over the member directories in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    /// Member directories as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Number of member directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Whether the set has no members. Never true for a set built by [`DirectorySet::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Whether `path` lies inside any member directory.
    #[must_use]
    pub fn contains_path(&self, path: &Path) -> bool {
        self.dirs.iter().any(|dir| is_within(path, dir))
    }
}

impl fmt::Display for DirectorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.dirs.iter().map(|d| d.display().to_string()).collect();
        write!(f, "{}", joined.join(", "))
    }
}
