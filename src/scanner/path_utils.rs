//! Unicode path normalization utilities.
//!
//! macOS stores file names in NFD (decomposed) form while Linux and Windows
//! usually use NFC, so the same visible directory can be spelled with
//! different bytes. Cache keys are built from NFC text so that both
//! spellings of a directory set map to the same record.
//!
//! # Example
//!
//! ```
//! use dupsweep::scanner::path_utils::{path_key, paths_equal};
//! use std::path::Path;
//!
//! let nfc = "café";
//! let nfd = "cafe\u{0301}";
//! assert!(paths_equal(nfc, nfd));
//! assert_eq!(path_key(Path::new(nfc)), path_key(Path::new(nfd)));
//! ```

use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Check if two path strings are equal after NFC normalization.
#[must_use]
pub fn paths_equal(a: &str, b: &str) -> bool {
    normalize_path_str(a) == normalize_path_str(b)
}

/// Create a normalized comparison key for a path.
///
/// Invalid UTF-8 is replaced lossily before normalization, so the key is
/// only meant for hashing and comparison, never for reopening the path.
#[must_use]
pub fn path_key(path: &Path) -> String {
    normalize_path_str(&path.to_string_lossy())
}

/// Check whether `path` lies inside `dir` (or is `dir` itself).
///
/// Comparison is component-wise, so `/data/a` is not inside `/data/ab`.
/// Windows paths compare case-insensitively.
#[must_use]
pub fn is_within(path: &Path, dir: &Path) -> bool {
    if cfg!(windows) {
        let p = std::path::PathBuf::from(path.to_string_lossy().to_lowercase());
        let d = std::path::PathBuf::from(dir.to_string_lossy().to_lowercase());
        p.starts_with(d)
    } else {
        path.starts_with(dir)
    }
}
