use super::models::Settings;
use config::{ConfigError, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "TOOLBELT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/toolbelt.toml";
const ENV_PREFIX: &str = "TOOLBELT";
const ENV_SEPARATOR: &str = "__";

/// Settings file path: `TOOLBELT_CONFIG` if set, otherwise the default location
pub fn config_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load settings with priority (lowest to highest):
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Variables from a `.env` file (via dotenvy)
/// 4. Process environment
pub fn load() -> Result<Settings, ConfigError> {
    // A missing .env is the normal case
    let _ = dotenvy::dotenv();

    load_from_sources(&config_path())
}

/// Load settings from a specific file plus environment overrides
pub fn load_from_sources(config_path: &Path) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading settings from: {}", config_path.display());
        builder = builder.add_source(
            File::from(config_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    } else {
        tracing::debug!(
            "Settings file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // TOOLBELT__HTTP__TIMEOUT -> http.timeout
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
