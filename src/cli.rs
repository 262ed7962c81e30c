//! Command-line interface definitions.
//!
//! Global options (verbosity, cache location, error format) apply to every
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan two trees and cache the result
//! dupsweep find ~/Photos /mnt/backup/Photos
//!
//! # Show the cached result if it is less than 10 minutes old
//! dupsweep show ~/Photos /mnt/backup/Photos --threshold 10
//!
//! # Preview deleting the copies that live in the backup
//! dupsweep delete ~/Photos /mnt/backup/Photos --delete-dirs /mnt/backup/Photos --dry-run
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Find duplicate files and delete redundant copies safely.
///
/// Files are compared by size and then by BLAKE3 content hash. Scan results
/// are cached per directory set, and deletion always keeps at least one copy
/// of every duplicate group.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Cache directory (overrides the config file and platform default)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Configuration file (default: config.toml in the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files and cache the result
    Find(FindArgs),
    /// Print the cached result for a set of directories
    Show(ShowArgs),
    /// Delete duplicates that lie in target directories or match patterns
    Delete(DeleteArgs),
    /// Remove all cached scan results
    ClearCache(ClearCacheArgs),
}

/// Arguments for the find subcommand.
#[derive(Debug, Args)]
pub struct FindArgs {
    /// Directories to scan
    #[arg(value_name = "DIR", required = true)]
    pub dirs: Vec<PathBuf>,

    /// Read buffer size for hashing (e.g., 8192, 64KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Number of I/O threads for hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Do not store the result in the cache
    #[arg(long)]
    pub no_cache: bool,

    /// List groups smallest first
    #[arg(long)]
    pub ascending: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the show subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Directories the result was computed for
    #[arg(value_name = "DIR", required = true)]
    pub dirs: Vec<PathBuf>,

    /// Maximum age of the cached result in minutes [default: 1440, or from config]
    #[arg(long, value_name = "MINUTES")]
    pub threshold: Option<u64>,

    /// List groups smallest first
    #[arg(long)]
    pub ascending: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the delete subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Directories to scan (or whose cached result to use)
    #[arg(value_name = "DIR", required = true)]
    pub dirs: Vec<PathBuf>,

    /// Delete duplicates lying under these directories
    #[arg(long, value_name = "DIR", num_args = 1.., required_unless_present = "delete_patterns", conflicts_with = "delete_patterns")]
    pub delete_dirs: Vec<PathBuf>,

    /// Delete duplicates whose path matches these glob patterns
    ///
    /// Relative patterns match the trailing path components, e.g. "*.bak".
    #[arg(long, value_name = "PATTERN", num_args = 1..)]
    pub delete_patterns: Vec<String>,

    /// Show what would be deleted without deleting anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Also delete empty files inside the targets
    #[arg(long)]
    pub include_empty: bool,

    /// Move files to the system trash instead of deleting them permanently
    #[arg(long)]
    pub trash: bool,

    /// Maximum age of a cached result to reuse, in minutes [default: 60, or from config]
    #[arg(long, value_name = "MINUTES")]
    pub threshold: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the clear-cache subcommand.
#[derive(Debug, Args)]
pub struct ClearCacheArgs {
    /// List the records that would be removed without removing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupsweep::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
