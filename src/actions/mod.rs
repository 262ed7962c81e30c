//! File actions module.
//!
//! This module provides functionality for:
//! - Planning which duplicates to remove for a set of target directories or patterns
//! - Permanent deletion (default) or moving to the system trash
//! - Dry runs that report the plan without touching the filesystem
//!
//! # Deletion
//!
//! ```no_run
//! use dupsweep::actions::{DeleteConfig, DeletionPlanner, DeletionTarget};
//! use dupsweep::duplicates::DuplicateFinder;
//! use dupsweep::scanner::DirectorySet;
//!
//! let dirs = DirectorySet::new(["/data/d1", "/data/d2"]).unwrap();
//! let outcome = DuplicateFinder::with_defaults().find_duplicates(&dirs).unwrap();
//!
//! let targets = DeletionTarget::Directories(DirectorySet::new(["/data/d1"]).unwrap());
//! let plan = DeletionPlanner::new(targets).plan(&outcome.index);
//! let report = plan.apply(&DeleteConfig::dry_run());
//! println!("would delete {} files", report.deleted.len());
//! ```

pub mod delete;
pub mod plan;

// Re-export commonly used types
pub use delete::{
    delete_path, validate_preserves_copy, DeleteConfig, DeleteError, DeleteMode, FileSnapshot,
};
pub use plan::{
    DeletionPlan, DeletionPlanner, DeletionReport, DeletionTarget, GroupPlan, PlanError,
};
