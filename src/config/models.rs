use crate::humanize::{ByteSize, HumanDuration};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub tabular: TabularConfig,
    #[serde(default)]
    pub prefs: PrefsConfig,
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Whole-request timeout applied when a call does not pass its own
    #[serde(default = "default_timeout")]
    pub timeout: HumanDuration,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Relative request paths are joined onto this
    pub base_url: Option<String>,
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: ByteSize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
            base_url: None,
            default_headers: BTreeMap::new(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

fn default_timeout() -> HumanDuration {
    HumanDuration(Duration::from_secs(30))
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration(Duration::from_secs(10))
}

fn default_user_agent() -> String {
    format!("toolbelt/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_response_bytes() -> ByteSize {
    ByteSize(10 * 1024 * 1024) // 10 MB
}

/// Event dispatcher settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatcherConfig {
    /// Messages that may wait in the queue before `post` applies backpressure
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Upper bound on a single handler invocation; unbounded when absent
    pub handler_timeout: Option<HumanDuration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            handler_timeout: None,
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

/// Delimited text and workbook settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TabularConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Sheet to read from a workbook; the first sheet when absent
    pub sheet: Option<String>,
    /// Name given to the sheet of written workbooks
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            sheet: None,
            sheet_name: default_sheet_name(),
        }
    }
}

impl TabularConfig {
    /// Delimiter as the single byte the csv crate expects.
    ///
    /// Validation guarantees an ASCII delimiter; anything else falls back to a comma.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

/// Preference file location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrefsConfig {
    #[serde(default = "default_prefs_path")]
    pub path: PathBuf,
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
        }
    }
}

fn default_prefs_path() -> PathBuf {
    PathBuf::from("state/preferences.toml")
}
