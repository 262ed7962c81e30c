//! BLAKE3 file hasher with chunked streaming.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in fixed-size chunks and folds every chunk into a
//! running BLAKE3 state. Peak memory is one chunk buffer regardless of file
//! size. Two files with the same hash are treated as having the same content.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// A 32-byte BLAKE3 content hash.
pub type Hash = [u8; 32];

/// Default read chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Largest accepted read chunk size in bytes (64 MiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl Hasher {
    /// Create a hasher that reads `chunk_size` bytes at a time.
    ///
    /// Out-of-range sizes are rejected earlier by
    /// [`FinderConfig::validate`](crate::duplicates::FinderConfig::validate);
    /// here they are clamped to `1..=MAX_CHUNK_SIZE`.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag checked between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Configured chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read fails
    /// part-way, or [`HashError::Interrupted`] if shutdown was requested.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        let len = file
            .metadata()
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?
            .len();
        self.hash_with_buffer(path, file, self.buffer_len(len))
    }

    /// Hash everything readable from `reader`, attributing errors to `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Hasher::full_hash`].
    pub fn hash_reader<R: Read>(&self, path: &Path, reader: R) -> Result<Hash, HashError> {
        self.hash_with_buffer(path, reader, self.chunk_size)
    }

    /// Buffer size for a file of `len` bytes: never more than the file needs.
    fn buffer_len(&self, len: u64) -> usize {
        usize::try_from(len).map_or(self.chunk_size, |len| len.clamp(1, self.chunk_size))
    }

    fn hash_with_buffer<R: Read>(
        &self,
        path: &Path,
        mut reader: R,
        buffer_len: usize,
    ) -> Result<Hash, HashError> {
        let mut state = blake3::Hasher::new();
        let mut buffer = vec![0u8; buffer_len];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    state.update(&buffer[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path.to_path_buf(), e)),
            }
        }

        Ok(*state.finalize().as_bytes())
    }
}

/// Render a hash as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a 64-character hexadecimal string back into a hash.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut hash = [0u8; 32];
    for (i, byte) in hash.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(hash)
}
