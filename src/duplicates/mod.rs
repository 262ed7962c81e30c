//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping
//! - Full content hashing of same-size candidates
//! - The [`DuplicateIndex`] aggregate with ordered views and validation

pub mod finder;
pub mod groups;
pub mod index;

pub use finder::{
    DuplicateFinder, FinderConfig, FinderError, ScanOutcome, ScanSummary, ScanWarning,
    DEFAULT_IO_THREADS,
};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats, SizeGrouping};
pub use index::{DuplicateIndex, IndexError, IndexView, SizeOrder, ViewOrder};
