use std::fmt::Write;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{PrefsError, Result};
use super::schema::{PrefKind, PrefValue, PreferenceSchema, PreferenceSet};
use crate::fsutil;

/// Loads and saves preference sets as sorted `key = value` TOML lines
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    schema: Arc<PreferenceSchema>,
}

impl PreferenceStore {
    pub fn new(schema: PreferenceSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &Arc<PreferenceSchema> {
        &self.schema
    }

    /// Read a preference file
    ///
    /// A missing file yields the declared defaults. Unknown keys are ignored;
    /// missing keys keep their defaults.
    pub fn load(&self, path: &Path) -> Result<PreferenceSet> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No preference file, using defaults");
                return Ok(self.schema.defaults());
            }
            Err(e) => return Err(corrupt(path, e.to_string())),
        };

        let table: toml::Table =
            toml::from_str(&text).map_err(|e| corrupt(path, e.message().to_string()))?;

        let mut set = self.schema.defaults();
        for (key, value) in table {
            let Some(spec) = self.schema.spec(&key) else {
                debug!(key, "Ignoring unrecognised preference");
                continue;
            };

            let parsed = match (spec.kind(), value) {
                (PrefKind::Integer, toml::Value::Integer(i)) => PrefValue::Int(i),
                (PrefKind::String, toml::Value::String(s)) => PrefValue::Str(s),
                (kind, other) => {
                    return Err(corrupt(
                        path,
                        format!("{key} should be {kind:?}, found {}", other.type_str()),
                    ));
                }
            };
            set.insert_unchecked(key, parsed);
        }

        debug!(path = %path.display(), "Preferences loaded");
        Ok(set)
    }

    /// Write every non-null value, keys sorted, replacing the file atomically
    ///
    /// Each value occupies exactly one line; strings are written as escaped
    /// basic strings.
    pub fn save(&self, set: &PreferenceSet, path: &Path) -> Result<()> {
        let mut text = String::new();
        let mut keys = 0;
        for (key, value) in set.iter() {
            let rendered = match value {
                PrefValue::Int(i) => i.to_string(),
                PrefValue::Str(s) => basic_string(s),
                PrefValue::Null => continue,
            };
            let _ = writeln!(text, "{} = {rendered}", render_key(key));
            keys += 1;
        }

        fsutil::write_atomic(path, text.as_bytes()).map_err(|source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), keys, "Preferences saved");
        Ok(())
    }
}

fn render_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare { key.to_string() } else { basic_string(key) }
}

fn basic_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn corrupt(path: &Path, reason: String) -> PrefsError {
    PrefsError::CorruptStore {
        path: path.to_path_buf(),
        reason,
    }
}
