use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::error::{PrefsError, Result};

/// A preference value: integer, string, or null
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PrefValue {
    Int(i64),
    Str(String),
    Null,
}

impl PrefValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PrefValue::Null)
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Int(i) => write!(f, "{i}"),
            PrefValue::Str(s) => f.write_str(s),
            PrefValue::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKind {
    Integer,
    String,
}

/// Declaration of one recognised key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefSpec {
    name: String,
    kind: PrefKind,
    default: PrefValue,
}

impl PrefSpec {
    pub fn integer(name: impl Into<String>, default: Option<i64>) -> Self {
        Self {
            name: name.into(),
            kind: PrefKind::Integer,
            default: default.map_or(PrefValue::Null, PrefValue::Int),
        }
    }

    pub fn string(name: impl Into<String>, default: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind: PrefKind::String,
            default: default.map_or(PrefValue::Null, |s| PrefValue::Str(s.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PrefKind {
        self.kind
    }

    pub fn default_value(&self) -> &PrefValue {
        &self.default
    }

    /// Only keys declared with a null default accept null.
    ///
    /// Null values are not written to disk, so a non-null default would come
    /// back in their place on the next load.
    pub fn is_nullable(&self) -> bool {
        self.default.is_null()
    }

    pub(crate) fn check(&self, value: &PrefValue) -> Result<()> {
        let ok = match (self.kind, value) {
            (_, PrefValue::Null) => self.is_nullable(),
            (PrefKind::Integer, PrefValue::Int(_)) => true,
            (PrefKind::String, PrefValue::Str(_)) => true,
            _ => false,
        };

        if ok {
            Ok(())
        } else if value.is_null() {
            Err(PrefsError::InvalidArgument(format!(
                "preference {:?} cannot be null",
                self.name
            )))
        } else {
            Err(PrefsError::InvalidArgument(format!(
                "preference {:?} expects {:?}, got {value:?}",
                self.name, self.kind
            )))
        }
    }

    /// Parse a command-line style value; the literal `null` clears the key
    pub fn parse_value(&self, raw: &str) -> Result<PrefValue> {
        let value = match (raw, self.kind) {
            ("null", _) => PrefValue::Null,
            (_, PrefKind::Integer) => raw.trim().parse::<i64>().map(PrefValue::Int).map_err(|_| {
                PrefsError::InvalidArgument(format!(
                    "preference {:?} expects an integer, got {raw:?}",
                    self.name
                ))
            })?,
            (_, PrefKind::String) => PrefValue::Str(raw.to_string()),
        };
        self.check(&value)?;
        Ok(value)
    }
}

/// The fixed set of recognised keys with their kinds and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceSchema {
    specs: BTreeMap<String, PrefSpec>,
}

impl PreferenceSchema {
    pub fn new(specs: impl IntoIterator<Item = PrefSpec>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(PrefsError::InvalidArgument(
                    "preference names must not be blank".to_string(),
                ));
            }
            if map.contains_key(&spec.name) {
                return Err(PrefsError::InvalidArgument(format!(
                    "preference {:?} declared twice",
                    spec.name
                )));
            }
            map.insert(spec.name.clone(), spec);
        }
        Ok(Self { specs: map })
    }

    /// Serial-number allocation settings: `increment`, `station`, `service`
    pub fn serial_numbering() -> Self {
        let specs = [
            PrefSpec::integer("increment", Some(1)),
            PrefSpec::integer("station", Some(0)),
            PrefSpec::string("service", None),
        ];
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (spec.name.clone(), spec))
                .collect(),
        }
    }

    pub fn spec(&self, name: &str) -> Option<&PrefSpec> {
        self.specs.get(name)
    }

    pub(crate) fn require(&self, name: &str) -> Result<&PrefSpec> {
        self.spec(name)
            .ok_or_else(|| PrefsError::InvalidArgument(format!("unknown preference {name:?}")))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// A fresh set holding every declared default
    pub fn defaults(self: &Arc<Self>) -> PreferenceSet {
        PreferenceSet {
            values: self
                .specs
                .values()
                .map(|spec| (spec.name.clone(), spec.default.clone()))
                .collect(),
            schema: Arc::clone(self),
        }
    }
}

/// Current values for every recognised key
///
/// Owned by the caller; nothing here is global.
#[derive(Debug, Clone)]
pub struct PreferenceSet {
    schema: Arc<PreferenceSchema>,
    values: BTreeMap<String, PrefValue>,
}

impl PartialEq for PreferenceSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for PreferenceSet {}

impl PreferenceSet {
    pub fn schema(&self) -> &Arc<PreferenceSchema> {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&PrefValue> {
        self.values.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(PrefValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(PrefValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Set a recognised key; the value must match the declared kind
    pub fn set(&mut self, name: &str, value: PrefValue) -> Result<()> {
        self.schema.require(name)?.check(&value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Parse `raw` according to the key's kind, then set it
    pub fn set_from_str(&mut self, name: &str, raw: &str) -> Result<()> {
        let value = self.schema.require(name)?.parse_value(raw)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Restore a key to its declared default
    pub fn reset(&mut self, name: &str) -> Result<()> {
        let default = self.schema.require(name)?.default.clone();
        self.values.insert(name.to_string(), default);
        Ok(())
    }

    /// Values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PrefValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert_unchecked(&mut self, name: String, value: PrefValue) {
        self.values.insert(name, value);
    }
}
