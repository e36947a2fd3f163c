//! Application settings for toolbelt
//!
//! Settings are layered from:
//! 1. Default values (embedded in structs)
//! 2. TOML settings file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use toolbelt::config::Settings;
//!
//! let settings = Settings::load().expect("Failed to load settings");
//! println!("HTTP timeout: {}", settings.http.timeout);
//! ```
//!
//! # Environment Variables
//!
//! Any setting can be overridden with `TOOLBELT__<section>__<key>`:
//! - `TOOLBELT__HTTP__TIMEOUT=5s`
//! - `TOOLBELT__DISPATCHER__QUEUE_CAPACITY=64`
//! - `TOOLBELT__TABULAR__DELIMITER=;`
//!
//! # Settings File
//!
//! Read from `config/toolbelt.toml` unless `TOOLBELT_CONFIG` names another file.
//! A missing file is not an error.

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{DispatcherConfig, HttpConfig, PrefsConfig, Settings, TabularConfig};
pub use sources::config_path;
pub use validation::{ValidationError, validate};

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Settings validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Settings {
    /// Load settings from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is malformed or a value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = sources::load()?;
        validation::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a specific file plus environment overrides
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let settings = sources::load_from_sources(path)?;
        validation::validate(&settings)?;
        Ok(settings)
    }
}
