//! Command dispatch.
//!
//! Thin glue between the CLI, the configuration layers and the library:
//! every command resolves its settings, calls into the core, prints the
//! result and picks an exit code.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{DeleteConfig, DeleteMode, DeletionPlanner, DeletionTarget};
use crate::cache::PersistentCache;
use crate::cli::{ClearCacheArgs, Cli, Commands, DeleteArgs, FindArgs, OutputFormat, ShowArgs};
use crate::config::Config;
use crate::duplicates::{
    DuplicateFinder, DuplicateIndex, FinderConfig, ScanOutcome, SizeOrder, ViewOrder,
};
use crate::error::ExitCode;
use crate::logging;
use crate::output::{text, JsonDeletionReport, JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::scanner::DirectorySet;
use crate::signal;

/// Run the parsed command line.
///
/// # Errors
///
/// Returns an error for invalid input, an unusable cache directory, an
/// interrupted scan, or a failure writing to stdout.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!(
        "dupsweep {} (log level {}), config: {:?}",
        env!("CARGO_PKG_VERSION"),
        logging::current_level_name(),
        config
    );

    let cache = open_cache(cli.cache_dir.or_else(|| config.cache_dir.clone()))?;
    let app = App {
        config,
        cache,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Find(args) => app.find(&args),
        Commands::Show(args) => app.show(&args),
        Commands::Delete(args) => app.delete(&args),
        Commands::ClearCache(args) => app.clear_cache(&args),
    }
}

fn open_cache(dir: Option<PathBuf>) -> Result<PersistentCache> {
    match dir {
        Some(dir) => Ok(PersistentCache::new(dir)),
        None => PersistentCache::open_default().context("Failed to locate the cache directory"),
    }
}

struct App {
    config: Config,
    cache: PersistentCache,
    quiet: bool,
}

impl App {
    fn find(&self, args: &FindArgs) -> Result<ExitCode> {
        let dirs = DirectorySet::new(&args.dirs).context("Invalid input directories")?;
        let chunk_size = match args.chunk_size {
            Some(size) => usize::try_from(size).context("Chunk size is too large")?,
            None => self.config.chunk_size,
        };
        let io_threads = args.io_threads.unwrap_or(self.config.io_threads);

        let outcome = self.scan(&dirs, chunk_size, io_threads)?;
        if !args.no_cache {
            self.store(&dirs, &outcome.index);
        }

        let code = scan_exit_code(&outcome);
        print_index(
            &outcome.index,
            Some(&outcome),
            order(args.ascending),
            args.output,
            code,
        )?;
        Ok(code)
    }

    fn show(&self, args: &ShowArgs) -> Result<ExitCode> {
        let dirs = DirectorySet::new(&args.dirs).context("Invalid input directories")?;
        let threshold = args.threshold.unwrap_or(self.config.show_threshold_minutes);

        let Some(index) = self.cache.retrieve(&dirs, threshold) else {
            text::write_cache_miss(&mut io::stderr(), dirs.as_slice())?;
            return Ok(ExitCode::GeneralError);
        };

        let code = if index.has_duplicates() {
            ExitCode::Success
        } else {
            ExitCode::NoDuplicates
        };
        print_index(&index, None, order(args.ascending), args.output, code)?;
        Ok(code)
    }

    fn delete(&self, args: &DeleteArgs) -> Result<ExitCode> {
        let dirs = DirectorySet::new(&args.dirs).context("Invalid input directories")?;
        let target = if args.delete_patterns.is_empty() {
            DeletionTarget::Directories(
                DirectorySet::new(&args.delete_dirs).context("Invalid deletion directories")?,
            )
        } else {
            DeletionTarget::patterns(&args.delete_patterns)?
        };
        let threshold = args.threshold.unwrap_or(self.config.delete_threshold_minutes);

        let (index, partial_scan) = match self.cache.retrieve(&dirs, threshold) {
            Some(index) => {
                log::info!("Using cached scan result");
                (index, false)
            }
            None => {
                let outcome =
                    self.scan(&dirs, self.config.chunk_size, self.config.io_threads)?;
                self.store(&dirs, &outcome.index);
                for warning in &outcome.warnings {
                    log::warn!("Skipped: {}", warning);
                }
                let partial = outcome.is_partial();
                (outcome.index, partial)
            }
        };

        let plan = DeletionPlanner::new(target)
            .include_empty(args.include_empty)
            .plan(&index);

        let mode = if args.trash || self.config.trash {
            DeleteMode::Trash
        } else {
            DeleteMode::Permanent
        };
        let delete_config = DeleteConfig::default()
            .with_dry_run(args.dry_run)
            .with_mode(mode);
        let report = plan.apply(&delete_config);

        if !args.dry_run && !report.deleted.is_empty() {
            if let Err(e) = self.cache.invalidate(&dirs) {
                log::warn!("Failed to invalidate cached result: {}", e);
            }
        }

        let code = if !report.is_success() || partial_scan {
            ExitCode::PartialSuccess
        } else if report.deleted.is_empty() {
            ExitCode::NoDuplicates
        } else {
            ExitCode::Success
        };

        let mut stdout = io::stdout().lock();
        match args.output {
            OutputFormat::Text => text::write_deletion_report(&mut stdout, &report)?,
            OutputFormat::Json => JsonDeletionReport::new(&report, code).write_to(&mut stdout)?,
        }
        stdout.flush()?;
        Ok(code)
    }

    fn clear_cache(&self, args: &ClearCacheArgs) -> Result<ExitCode> {
        let report = self.cache.clear_with(args.dry_run);
        let mut stdout = io::stdout().lock();
        text::write_clear_report(&mut stdout, &report, args.dry_run)?;
        stdout.flush()?;

        Ok(if report.is_success() {
            ExitCode::Success
        } else {
            ExitCode::PartialSuccess
        })
    }

    fn scan(&self, dirs: &DirectorySet, chunk_size: usize, io_threads: usize) -> Result<ScanOutcome> {
        let handler = signal::install_handler();
        let finder_config = FinderConfig::default()
            .with_chunk_size(chunk_size)
            .with_io_threads(io_threads)
            .with_shutdown_flag(handler.get_flag())
            .with_progress_callback(Arc::new(Progress::new(self.quiet)));

        let finder = DuplicateFinder::new(finder_config).context("Invalid scan settings")?;
        let outcome = finder
            .find_duplicates(dirs)
            .with_context(|| format!("Scan of {dirs} failed"))?;
        Ok(outcome)
    }

    fn store(&self, dirs: &DirectorySet, index: &DuplicateIndex) {
        match self.cache.store(dirs, index) {
            Ok(path) => log::debug!("Stored scan result at {}", path.display()),
            Err(e) => log::warn!("Failed to cache scan result: {}", e),
        }
    }
}

fn order(ascending: bool) -> ViewOrder {
    ViewOrder::sorted(if ascending {
        SizeOrder::Ascending
    } else {
        SizeOrder::Descending
    })
}

fn scan_exit_code(outcome: &ScanOutcome) -> ExitCode {
    if outcome.is_partial() {
        ExitCode::PartialSuccess
    } else if outcome.index.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    }
}

fn print_index(
    index: &DuplicateIndex,
    outcome: Option<&ScanOutcome>,
    order: ViewOrder,
    format: OutputFormat,
    code: ExitCode,
) -> Result<()> {
    let view = index.ordered(order);
    let summary = outcome.map(|o| &o.summary);
    let warnings = outcome.map_or(&[][..], |o| o.warnings.as_slice());

    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Text => TextOutput::new(&view, summary, warnings).write_to(&mut stdout)?,
        OutputFormat::Json => {
            JsonOutput::new(index.dirs(), &view, summary, warnings, code).write_to(&mut stdout)?;
        }
    }
    stdout.flush()?;
    Ok(())
}
