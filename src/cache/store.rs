//! File-per-directory-set cache store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use super::record::CacheRecord;
use crate::duplicates::{DuplicateIndex, IndexError};
use crate::scanner::path_utils::path_key;
use crate::scanner::DirectorySet;

const RECORD_SUFFIX: &str = ".json";
const TEMP_PREFIX: &str = ".tmp-";
const KEY_LEN: usize = 16;

/// Errors that can occur while reading or writing cache records.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// No platform cache directory could be determined.
    #[error("could not determine a cache directory for this platform")]
    NoCacheDir,

    /// Filesystem access failed.
    #[error("cache I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The record could not be serialized.
    #[error("failed to serialize cache record: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The stored data is not a valid record.
    #[error("failed to parse cache record: {0}")]
    Parse(#[source] serde_json::Error),

    /// The stored checksum does not match the record.
    #[error("cache integrity check failed: checksum mismatch")]
    ChecksumMismatch,

    /// The record was written by an incompatible version.
    #[error("unsupported cache format version: {0}")]
    UnsupportedVersion(u32),

    /// The stored index breaks its invariants.
    #[error("corrupt cache record: {0}")]
    Corrupt(#[from] IndexError),

    /// The index belongs to a different directory set than requested.
    #[error("index was computed for {actual}, not {expected}")]
    DirectoryMismatch {
        /// Directory set the caller asked for
        expected: String,
        /// Directory set recorded in the index
        actual: String,
    },
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of [`PersistentCache::clear`].
#[derive(Debug, Default)]
pub struct ClearReport {
    /// Files removed (or that would be removed in a dry run)
    pub removed: Vec<PathBuf>,
    /// Files that could not be removed
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

impl ClearReport {
    /// Whether every removal succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Durable store of scan results, one record per directory set.
///
/// # Example
///
/// ```no_run
/// use dupsweep::cache::PersistentCache;
/// use dupsweep::scanner::DirectorySet;
///
/// let cache = PersistentCache::open_default().unwrap();
/// let dirs = DirectorySet::new(["/data"]).unwrap();
/// match cache.retrieve(&dirs, 60) {
///     Some(index) => println!("{} cached groups", index.group_count()),
///     None => println!("cache miss"),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PersistentCache {
    root: PathBuf,
}

impl PersistentCache {
    /// Use `root` as the cache directory. It is created on first store.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use the platform cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NoCacheDir`] if no home directory is known.
    pub fn open_default() -> Result<Self, CacheError> {
        Self::default_root().map(Self::new).ok_or(CacheError::NoCacheDir)
    }

    /// Platform cache directory, if one can be determined.
    #[must_use]
    pub fn default_root() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupsweep", "dupsweep").map(|d| d.cache_dir().to_path_buf())
    }

    /// Cache directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stable key for a directory set: independent of input order and of
    /// NFC/NFD spelling.
    #[must_use]
    pub fn key(dirs: &DirectorySet) -> String {
        let mut names: Vec<String> = dirs.iter().map(path_key).collect();
        names.sort();

        let mut hasher = Sha256::new();
        hasher.update(names.join("\n").as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..KEY_LEN].to_string()
    }

    /// Location of the record for `dirs`.
    #[must_use]
    pub fn record_path(&self, dirs: &DirectorySet) -> PathBuf {
        self.root.join(format!("{}{}", Self::key(dirs), RECORD_SUFFIX))
    }

    /// Store `index` as the current result for `dirs`, replacing any previous record.
    ///
    /// The record is written to a temporary file in the cache directory and
    /// renamed into place, so readers never see a partial record.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the index belongs to other directories or
    /// the record cannot be written.
    pub fn store(&self, dirs: &DirectorySet, index: &DuplicateIndex) -> Result<PathBuf, CacheError> {
        if index.dirs() != dirs {
            return Err(CacheError::DirectoryMismatch {
                expected: dirs.to_string(),
                actual: index.dirs().to_string(),
            });
        }
        self.write_record(&CacheRecord::new(index.clone()))
    }

    /// Write a prepared record atomically.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if serialization or any filesystem step fails.
    pub fn write_record(&self, record: &CacheRecord) -> Result<PathBuf, CacheError> {
        let json = record.to_json()?;
        self.ensure_root()?;

        let target = self.record_path(record.dirs());
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(RECORD_SUFFIX)
            .tempfile_in(&self.root)
            .map_err(|e| CacheError::io(&self.root, e))?;

        write_synced(&mut temp, json.as_bytes()).map_err(|e| CacheError::io(temp.path(), e))?;

        temp.persist(&target)
            .map_err(|e| CacheError::io(&target, e.error))?;

        log::debug!("Stored cache record {} for {}", target.display(), record.dirs());
        Ok(target)
    }

    fn ensure_root(&self) -> Result<(), CacheError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.root)
            .map_err(|e| CacheError::io(&self.root, e))
    }

    /// Fetch the stored index for `dirs` if it is at most `max_age_minutes` old.
    ///
    /// Every failure is a miss: a missing, stale, corrupt or mismatched
    /// record all return `None`.
    #[must_use]
    pub fn retrieve(&self, dirs: &DirectorySet, max_age_minutes: u64) -> Option<DuplicateIndex> {
        let record = match self.load(dirs) {
            Ok(Some(record)) => record,
            Ok(None) => {
                log::debug!("Cache miss for {}: no record", dirs);
                return None;
            }
            Err(e) => {
                log::warn!("Ignoring unreadable cache record for {}: {}", dirs, e);
                return None;
            }
        };

        if record.dirs() != dirs {
            log::warn!(
                "Cache record {} belongs to {}, not {}",
                self.record_path(dirs).display(),
                record.dirs(),
                dirs
            );
            return None;
        }

        if !record.is_fresh_at(max_age_minutes, Utc::now()) {
            log::debug!(
                "Cache miss for {}: record from {} is older than {} minute(s)",
                dirs,
                record.created_at,
                max_age_minutes
            );
            return None;
        }

        log::info!("Using cached scan from {} for {}", record.created_at, dirs);
        Some(record.index)
    }

    /// Read and verify the record for `dirs` without any freshness check.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the record exists but cannot be read or verified.
    pub fn load(&self, dirs: &DirectorySet) -> Result<Option<CacheRecord>, CacheError> {
        let path = self.record_path(dirs);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };
        CacheRecord::from_json(&content).map(Some)
    }

    /// Remove the record for `dirs`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the record exists but cannot be removed.
    pub fn invalidate(&self, dirs: &DirectorySet) -> Result<bool, CacheError> {
        let path = self.record_path(dirs);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Invalidated cache record {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// Remove every record and leftover temporary file.
    ///
    /// A missing cache directory is an empty success.
    pub fn clear(&self) -> ClearReport {
        self.clear_with(false)
    }

    /// Like [`PersistentCache::clear`], optionally only listing what would go.
    ///
    /// Only files named like cache records or temporary record files are
    /// touched; anything else in the directory is left alone.
    pub fn clear_with(&self, dry_run: bool) -> ClearReport {
        let mut report = ClearReport::default();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
            Err(e) => {
                log::warn!("Cannot read cache directory {}: {}", self.root.display(), e);
                report.failed.push((self.root.clone(), e));
                return report;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .map(|entry| entry.path())
            .filter(|path| is_cache_file(path))
            .collect();
        paths.sort();

        for path in paths {
            if dry_run {
                report.removed.push(path);
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("Removed cache file {}", path.display());
                    report.removed.push(path);
                }
                Err(e) => {
                    log::warn!("Failed to remove cache file {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }

        report
    }
}

fn write_synced(temp: &mut NamedTempFile, data: &[u8]) -> std::io::Result<()> {
    temp.write_all(data)?;
    temp.flush()?;
    temp.as_file().sync_all()
}

fn is_cache_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with(TEMP_PREFIX) {
        return true;
    }
    name.strip_suffix(RECORD_SUFFIX)
        .is_some_and(|stem| stem.len() == KEY_LEN && stem.bytes().all(|b| b.is_ascii_hexdigit()))
}
