//! dupsweep - duplicate file finder with a persisted scan cache
//!
//! Files are grouped by size and then by BLAKE3 content hash. Results are
//! cached per directory set, and duplicates lying in chosen target
//! directories can be deleted while always keeping one copy per group.

pub mod actions;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

pub use app::run_app;
