//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] traverses one directory tree and yields a [`FileEntry`] for
//! every regular file, zero-byte files included. [`MultiWalker`] chains one
//! walker per member of a [`DirectorySet`].
//!
//! # Features
//!
//! - Parallel directory reading via jwalk's rayon pool
//! - Children sorted by file name, so the yielded order is deterministic
//! - Symlinks, devices, sockets and directories are skipped silently
//! - Per-file failures are yielded as [`ScanError`] values, never a panic
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"));
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{DirectorySet, FileEntry, ScanError};

/// Directory walker for parallel file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root directory of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Hidden files are included.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }
                    let path = entry.path();
                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }
                    self.inspect_file(path)
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(self.handle_jwalk_error(path, &e)))
                }
            }
        })
    }

    /// Read the size of a listed path, skipping anything that is not a regular file.
    fn inspect_file(&self, path: PathBuf) -> Option<Result<FileEntry, ScanError>> {
        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_io_error(path, e))),
        };

        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", path.display());
            return None;
        }

        Some(Ok(FileEntry::new(path, metadata.len())))
    }

    fn handle_io_error(&self, path: PathBuf, error: std::io::Error) -> ScanError {
        let err = ScanError::from_io(path, error);
        match &err {
            ScanError::NotFound(p) => {
                log::debug!("File not found (may have been deleted): {}", p.display());
            }
            other => log::warn!("{}", other),
        }
        err
    }

    fn handle_jwalk_error(&self, path: PathBuf, error: &jwalk::Error) -> ScanError {
        log::warn!("Walker error for {}: {}", path.display(), error);
        let kind = error
            .io_error()
            .map_or(std::io::ErrorKind::Other, std::io::Error::kind);
        ScanError::from_io(path, std::io::Error::new(kind, error.to_string()))
    }
}

/// Walks every member of a [`DirectorySet`] in order.
///
/// Members never overlap, so no file is yielded twice.
#[derive(Debug)]
pub struct MultiWalker {
    walkers: Vec<Walker>,
}

impl MultiWalker {
    /// Create a walker per member directory.
    #[must_use]
    pub fn new(dirs: &DirectorySet) -> Self {
        Self {
            walkers: dirs.iter().map(Walker::new).collect(),
        }
    }

    /// Share one shutdown flag between every underlying walker.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.walkers = self
            .walkers
            .into_iter()
            .map(|w| w.with_shutdown_flag(Arc::clone(&flag)))
            .collect();
        self
    }

    /// Walk all member directories one after another.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        self.walkers.iter().flat_map(|w| {
            log::debug!("Walking {}", w.root().display());
            w.walk()
        })
    }
}
