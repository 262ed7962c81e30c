//! Human-readable listings.
//!
//! Colors come from yansi and are switched off globally with
//! `yansi::disable()` when `--no-color` or `NO_COLOR` is given.

use std::io::{self, Write};
use std::path::PathBuf;

use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::DeletionReport;
use crate::cache::ClearReport;
use crate::duplicates::{DuplicateGroup, IndexView, ScanSummary, ScanWarning};

/// Text rendering of a scan result.
#[derive(Debug)]
pub struct TextOutput<'a> {
    view: &'a IndexView,
    summary: Option<&'a ScanSummary>,
    warnings: &'a [ScanWarning],
}

impl<'a> TextOutput<'a> {
    /// Render `view`. `summary` is absent for cached results.
    #[must_use]
    pub fn new(
        view: &'a IndexView,
        summary: Option<&'a ScanSummary>,
        warnings: &'a [ScanWarning],
    ) -> Self {
        Self {
            view,
            summary,
            warnings,
        }
    }

    /// Write the listing.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.view.groups.is_empty() {
            writeln!(w, "{}", "No duplicate files found.".green())?;
        }

        for (i, group) in self.view.groups.iter().enumerate() {
            writeln!(
                w,
                "{} {} x {} ({} reclaimable)",
                format!("Group {}:", i + 1).bold(),
                ByteSize(group.size),
                group.len(),
                ByteSize(group.wasted_space()).yellow()
            )?;
            writeln!(w, "  {}", group.hash_hex().dim())?;
            for path in &group.paths {
                writeln!(w, "    {}", path.display())?;
            }
        }

        if !self.view.empty_files.is_empty() {
            writeln!(
                w,
                "{}",
                format!("Empty files ({}):", self.view.empty_files.len()).bold()
            )?;
            for path in &self.view.empty_files {
                writeln!(w, "    {}", path.display())?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(
                w,
                "{}",
                format!("Skipped {} files:", self.warnings.len()).yellow()
            )?;
            for warning in self.warnings {
                writeln!(w, "    {warning}")?;
            }
        }

        match self.summary {
            Some(summary) => write_summary(w, summary),
            None => writeln!(
                w,
                "{} groups from cache, {} reclaimable",
                self.view.groups.len(),
                ByteSize(
                    self.view
                        .groups
                        .iter()
                        .map(DuplicateGroup::wasted_space)
                        .fold(0, u64::saturating_add)
                )
            ),
        }
    }
}

fn write_summary<W: Write>(w: &mut W, summary: &ScanSummary) -> io::Result<()> {
    writeln!(
        w,
        "Scanned {} files ({}) in {:.2}s: {} groups, {} duplicate files, {} reclaimable ({:.1}%)",
        summary.total_files,
        summary.total_size_display(),
        summary.scan_duration.as_secs_f64(),
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display().bold(),
        summary.wasted_percentage()
    )
}

/// Write the outcome of a deletion run.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_deletion_report<W: Write>(w: &mut W, report: &DeletionReport) -> io::Result<()> {
    let verb = if report.dry_run { "Would delete" } else { "Deleted" };
    for path in &report.deleted {
        writeln!(w, "{} {}", verb.red(), path.display())?;
    }
    for (path, error) in &report.failed {
        writeln!(w, "{} {}: {}", "Failed".yellow().bold(), path.display(), error)?;
    }
    writeln!(
        w,
        "{} {} files ({}), {} failed{}",
        verb,
        report.deleted.len(),
        ByteSize(report.bytes_freed),
        report.failed.len(),
        if report.dry_run { " (dry run)" } else { "" }
    )
}

/// Write the outcome of a cache clear.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_clear_report<W: Write>(
    w: &mut W,
    report: &ClearReport,
    dry_run: bool,
) -> io::Result<()> {
    let verb = if dry_run { "Would remove" } else { "Removed" };
    for path in &report.removed {
        writeln!(w, "{verb} {}", path.display())?;
    }
    for (path, error) in &report.failed {
        writeln!(w, "{} {}: {}", "Failed".yellow().bold(), path.display(), error)?;
    }
    writeln!(w, "{verb} {} cache records", report.removed.len())
}

/// Write the message for a cache miss on `show`.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_cache_miss<W: Write>(w: &mut W, dirs: &[PathBuf]) -> io::Result<()> {
    let dirs: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
    writeln!(
        w,
        "{} for {}. Run `dupsweep find` first.",
        "No fresh cached result".yellow(),
        dirs.join(", ")
    )
}
