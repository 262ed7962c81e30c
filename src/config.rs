//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. [`Config::default()`]
//! 2. `config.toml` in the platform config directory (or `--config PATH`)
//! 3. `DUPSWEEP_*` environment variables
//! 4. CLI flags, applied by the caller

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::DEFAULT_IO_THREADS;
use crate::scanner::DEFAULT_CHUNK_SIZE;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Default `show` freshness threshold: one day.
pub const DEFAULT_SHOW_THRESHOLD_MINUTES: u64 = 1440;

/// Default `delete` freshness threshold: one hour.
pub const DEFAULT_DELETE_THRESHOLD_MINUTES: u64 = 60;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read buffer size for hashing, in bytes.
    pub chunk_size: usize,
    /// Hashing worker threads.
    pub io_threads: usize,
    /// Cache freshness threshold for `show`, in minutes.
    pub show_threshold_minutes: u64,
    /// Cache freshness threshold for `delete`, in minutes. Kept short since
    /// a stale index can point at files that have changed.
    pub delete_threshold_minutes: u64,
    /// Cache directory override.
    pub cache_dir: Option<PathBuf>,
    /// Move deleted files to the trash instead of removing them.
    pub trash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            io_threads: DEFAULT_IO_THREADS,
            show_threshold_minutes: DEFAULT_SHOW_THRESHOLD_MINUTES,
            delete_threshold_minutes: DEFAULT_DELETE_THRESHOLD_MINUTES,
            cache_dir: None,
            trash: false,
        }
    }
}

impl Config {
    /// Load from the default layers, using `path` instead of the platform
    /// config file when given.
    ///
    /// A broken platform config is logged and replaced by the defaults. A
    /// file named explicitly must exist and load cleanly.
    ///
    /// # Errors
    ///
    /// Returns the figment error if `path` is given and is missing, does not
    /// parse, or holds a value of the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Self::from_figment(Self::figment(Some(path)));
        }

        let file = Self::config_path();
        match Self::from_figment(Self::figment(file.as_deref())) {
            Ok(config) => Ok(config),
            Err(e) => {
                log::warn!("Ignoring unusable configuration, using defaults: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// The layered figment: defaults, then `file` if given, then environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extract a config from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns the figment error if a layer fails to parse or a value has
    /// the wrong type.
    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    /// Default platform-specific configuration file path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupsweep", "dupsweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
