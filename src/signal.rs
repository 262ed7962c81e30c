//! Ctrl+C handling for graceful shutdown.
//!
//! A single `AtomicBool` is shared between the signal handler and the scan
//! workers. The finder polls it and returns `FinderError::Interrupted`, which
//! the binary maps to exit code 130.
//!
//! ```rust,no_run
//! use dupsweep::duplicates::FinderConfig;
//! use dupsweep::signal::install_handler;
//!
//! let handler = install_handler();
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or `request_shutdown()` was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for `FinderConfig`, `Walker` and `Hasher`.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler, or reuse the one already installed.
///
/// Reuse resets the flag, so repeated `run_app` calls in one process (tests)
/// each start uninterrupted. If the hook cannot be registered, for example
/// because another handler owns the signal, an unhooked handler is returned;
/// it still honors `request_shutdown()`.
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => GLOBAL_HANDLER.get_or_init(|| handler).clone(),
        Err(e) => {
            log::debug!("Ctrl+C handler not installed ({}), using unhooked handler", e);
            ShutdownHandler::new()
        }
    }
}
