//! Duplicate finder pipeline.
//!
//! # Overview
//!
//! [`DuplicateFinder`] turns a [`DirectorySet`] into a [`DuplicateIndex`]:
//!
//! 1. **Walk** every member directory ([`MultiWalker`])
//! 2. **Group by size**, setting zero-byte files aside ([`group_by_size`])
//! 3. **Hash** every candidate file on a bounded rayon pool
//! 4. **Aggregate** by `(size, hash)` in discovery order
//!
//! Per-file failures never abort a scan; they are returned as
//! [`ScanWarning`]s next to the index. Only input validation and
//! interruption are fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;
use serde::Serialize;

use super::{group_by_size, DuplicateGroup, DuplicateIndex, SizeGrouping};
use crate::progress::ProgressCallback;
use crate::scanner::{
    DirectorySet, FileEntry, Hash, HashError, Hasher, MultiWalker, PathSetError, ScanError,
    DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE,
};

/// Files above this size get a debug line when hashing starts.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Default number of hashing threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Read chunk size in bytes, in `1..=MAX_CHUNK_SIZE`.
    pub chunk_size: usize,
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing; 0 lets rayon decide.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("chunk_size", &self.chunk_size)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            io_threads: DEFAULT_IO_THREADS,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the read chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the number of hashing threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Reject settings that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidChunkSize`] for a zero chunk size and
    /// [`FinderError::ChunkSizeTooLarge`] above [`MAX_CHUNK_SIZE`].
    pub fn validate(&self) -> Result<(), FinderError> {
        if self.chunk_size == 0 {
            return Err(FinderError::InvalidChunkSize);
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(FinderError::ChunkSizeTooLarge(self.chunk_size));
        }
        Ok(())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A non-fatal problem met during a scan.
#[derive(thiserror::Error, Debug)]
pub enum ScanWarning {
    /// A file could not be listed or inspected.
    #[error(transparent)]
    Walk(#[from] ScanError),

    /// A file could not be hashed and was left out of the index.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanWarning {
    /// Path the warning refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Walk(e) => e.path(),
            Self::Hash(e) => e.path(),
        }
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Total number of files discovered
    pub total_files: usize,
    /// Total size of all discovered files in bytes
    pub total_size: u64,
    /// Number of zero-byte files
    pub empty_files: usize,
    /// Number of files eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one original per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Number of warnings collected
    pub warnings: usize,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_size).to_string()
    }
}

/// Everything a successful scan produces.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The duplicate index
    pub index: DuplicateIndex,
    /// Files skipped along the way
    pub warnings: Vec<ScanWarning>,
    /// Counters for reporting
    pub summary: ScanSummary,
}

impl ScanOutcome {
    /// Whether some files were skipped.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// A zero chunk size was configured.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    /// The chunk size exceeds [`MAX_CHUNK_SIZE`].
    #[error("chunk size {0} exceeds the maximum of {max} bytes", max = MAX_CHUNK_SIZE)]
    ChunkSizeTooLarge(usize),

    /// The input directories were invalid.
    #[error(transparent)]
    PathSet(#[from] PathSetError),

    /// The hashing thread pool could not be built.
    #[error("failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder that orchestrates the walk, group and hash pipeline.
///
/// # Example
///
/// ```no_run
/// use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
///
/// let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4)).unwrap();
/// let outcome = finder.find_duplicates_in_paths(["/some/path"]).unwrap();
///
/// println!("Found {} duplicate groups", outcome.summary.duplicate_groups);
/// println!("Reclaimable space: {}", outcome.summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidChunkSize`] or
    /// [`FinderError::ChunkSizeTooLarge`] if the chunk size is out of range.
    pub fn new(config: FinderConfig) -> Result<Self, FinderError> {
        config.validate()?;
        let mut hasher = Hasher::new(config.chunk_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Ok(Self {
            config,
            hasher: Arc::new(hasher),
        })
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            config: FinderConfig::default(),
            hasher: Arc::new(Hasher::default()),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Validate `paths` into a [`DirectorySet`] and scan it.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::PathSet`] for invalid input, otherwise the
    /// same errors as [`DuplicateFinder::find_duplicates`].
    pub fn find_duplicates_in_paths<I, P>(&self, paths: I) -> Result<ScanOutcome, FinderError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let dirs = DirectorySet::new(paths)?;
        self.find_duplicates(&dirs)
    }

    /// Find all duplicate files in the given directories.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if the shutdown flag is raised
    /// at any point. No partial index is returned in that case.
    pub fn find_duplicates(&self, dirs: &DirectorySet) -> Result<ScanOutcome, FinderError> {
        let start_time = Instant::now();
        log::info!("Starting duplicate scan of {}", dirs);

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
            callback.on_message(&format!("Walking {}", dirs));
        }

        let mut walker = MultiWalker::new(dirs);
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        let mut warnings = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(files.len() + 1, &file.path.to_string_lossy());
                    }
                    files.push(file);
                }
                Err(e) => warnings.push(ScanWarning::Walk(e)),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut outcome = self.find_duplicates_from_files(dirs.clone(), files)?;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        outcome.summary.warnings = outcome.warnings.len();
        outcome.summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} groups, {} duplicates, {} reclaimable, {} warning(s)",
            outcome.summary.duplicate_groups,
            outcome.summary.duplicate_files,
            outcome.summary.reclaimable_display(),
            outcome.summary.warnings
        );

        Ok(outcome)
    }

    /// Build an index from an already collected file list.
    ///
    /// `files` are taken in discovery order; `dirs` is recorded in the index.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] or [`FinderError::ThreadPool`].
    pub fn find_duplicates_from_files(
        &self,
        dirs: DirectorySet,
        files: Vec<FileEntry>,
    ) -> Result<ScanOutcome, FinderError> {
        let start_time = Instant::now();
        let SizeGrouping {
            groups,
            empty_files,
            stats,
        } = group_by_size(files);

        let mut summary = ScanSummary {
            total_files: stats.total_files,
            total_size: stats.total_size,
            empty_files: stats.empty_files,
            eliminated_by_size: stats.eliminated_unique,
            ..Default::default()
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let candidates: Vec<(u64, PathBuf)> = groups
            .into_iter()
            .flat_map(|(size, paths)| paths.into_iter().map(move |p| (size, p)))
            .collect();

        let hashed = self.hash_files(candidates)?;

        let mut warnings = Vec::new();
        let mut index = DuplicateIndex::new(dirs);

        // Aggregate by (size, hash) in first-seen order
        let mut current_size = None;
        let mut buckets: Vec<(Hash, Vec<PathBuf>)> = Vec::new();
        let mut slots: HashMap<Hash, usize> = HashMap::new();

        for (size, path, result) in hashed {
            if current_size != Some(size) {
                flush_bucket(&mut index, current_size, &mut buckets, &mut slots);
                current_size = Some(size);
            }
            match result {
                Ok(hash) => {
                    summary.hashed_files += 1;
                    summary.bytes_hashed += size;
                    match slots.get(&hash) {
                        Some(&slot) => buckets[slot].1.push(path),
                        None => {
                            slots.insert(hash, buckets.len());
                            buckets.push((hash, vec![path]));
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Failed to hash {}: {}", path.display(), e);
                    warnings.push(ScanWarning::Hash(e));
                }
            }
        }
        flush_bucket(&mut index, current_size, &mut buckets, &mut slots);

        index.set_empty_files(empty_files);

        summary.duplicate_groups = index.group_count();
        summary.duplicate_files = index.groups().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = index.wasted_space();
        summary.warnings = warnings.len();
        summary.scan_duration = start_time.elapsed();

        Ok(ScanOutcome {
            index,
            warnings,
            summary,
        })
    }

    /// Hash candidates on the bounded pool, keeping input order.
    fn hash_files(
        &self,
        candidates: Vec<(u64, PathBuf)>,
    ) -> Result<Vec<(u64, PathBuf, Result<Hash, HashError>)>, FinderError> {
        if candidates.is_empty() {
            log::debug!("No files to hash");
            return Ok(Vec::new());
        }

        let total = candidates.len();
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("hashing", total);
        }
        log::info!("Hashing {} candidate files", total);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()?;

        let completed = AtomicUsize::new(0);
        let results: Vec<(u64, PathBuf, Result<Hash, HashError>)> = pool.install(|| {
            candidates
                .into_par_iter()
                .map(|(size, path)| {
                    if self.config.is_shutdown_requested() {
                        return (size, path.clone(), Err(HashError::Interrupted(path)));
                    }

                    if size > LARGE_FILE_THRESHOLD {
                        log::debug!(
                            "Hashing large file ({} MB): {}",
                            size / (1024 * 1024),
                            path.display()
                        );
                    }

                    let result = self.hasher.full_hash(&path);
                    if let Some(ref callback) = self.config.progress_callback {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(done, &path.to_string_lossy());
                        if result.is_ok() {
                            callback.on_item_completed(size);
                        }
                    }
                    (size, path, result)
                })
                .collect()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("hashing");
        }

        if self.config.is_shutdown_requested()
            || results
                .iter()
                .any(|(_, _, r)| matches!(r, Err(HashError::Interrupted(_))))
        {
            log::info!("Hashing interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        Ok(results)
    }
}

/// Move the finished hash buckets of one size into the index.
fn flush_bucket(
    index: &mut DuplicateIndex,
    size: Option<u64>,
    buckets: &mut Vec<(Hash, Vec<PathBuf>)>,
    slots: &mut HashMap<Hash, usize>,
) {
    let Some(size) = size else {
        return;
    };
    for (hash, paths) in buckets.drain(..) {
        if paths.len() > 1 {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                crate::scanner::hash_to_hex(&hash),
                paths.len(),
                size
            );
        }
        index.push_group(DuplicateGroup::new(hash, size, paths));
    }
    slots.clear();
}
