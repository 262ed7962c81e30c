//! Output formatters for scan results and deletion reports.
//!
//! This module provides two output formats:
//! - Text for people, with human-readable sizes
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{DuplicateFinder, ViewOrder};
//! use dupsweep::error::ExitCode;
//! use dupsweep::output::json::JsonOutput;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let outcome = finder.find_duplicates_in_paths(["."]).unwrap();
//! let view = outcome.index.ordered(ViewOrder::default());
//!
//! let output = JsonOutput::new(
//!     outcome.index.dirs(),
//!     &view,
//!     Some(&outcome.summary),
//!     &outcome.warnings,
//!     ExitCode::Success,
//! );
//! output.write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonDeletionReport, JsonOutput, JsonOutputError};
pub use text::TextOutput;
