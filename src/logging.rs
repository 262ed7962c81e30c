//! Logging setup for the `log` facade with an `env_logger` backend.
//!
//! The filter is chosen in this order:
//!
//! 1. `DUPSWEEP_LOG`, then `RUST_LOG`, as a full `env_logger` filter string
//! 2. `--quiet` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. info
//!
//! The CLI flags only raise the level of dupsweep's own modules. Dependencies
//! stay at warn so that `-vv` shows the scan, not jwalk or trash internals.
//!
//! ```rust,no_run
//! use dupsweep::logging::init_logging;
//!
//! init_logging(1, false); // -v
//! log::debug!("visible");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "DUPSWEEP_LOG";

/// Level applied to crates other than dupsweep when no env filter is set.
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

/// Install the global logger. Later calls in the same process do nothing.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    let env_filter = env_filter();
    match &env_filter {
        Some(filter) => {
            builder.parse_filters(filter);
        }
        None => {
            let level = determine_level(verbose, quiet);
            builder
                .filter_level(DEPENDENCY_LEVEL.min(level))
                .filter_module(env!("CARGO_CRATE_NAME"), level);
        }
    }

    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    match env_filter {
        Some(filter) => log::debug!("Logging filter from environment: {}", filter),
        None => log::debug!(
            "Logging initialized at level {}",
            determine_level(verbose, quiet)
        ),
    }
}

fn env_filter() -> Option<String> {
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
}

/// Level for dupsweep's modules from the CLI flags. Quiet wins over verbose.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

// Debug builds stamp every line; with -v the module path is added too.
fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let timestamp = buf.timestamp_seconds();
        if verbose >= 1 {
            writeln!(
                buf,
                "{timestamp} {style}{:<5}{style:#} [{}] {}",
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{timestamp} {style}{:<5}{style:#} {}",
                record.level(),
                record.args()
            )
        }
    });

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        });
    }
}

/// Name of the current maximum log level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
