//! Preference store: a small set of named settings persisted to disk
//!
//! The recognised keys, their kinds and defaults are fixed by a
//! [`PreferenceSchema`]. Files are TOML documents of sorted top-level
//! `key = value` lines with nulls omitted, replaced atomically on save.
//!
//! ```rust,ignore
//! use toolbelt::prefs::{PreferenceSchema, PreferenceStore, SerialNumbering};
//!
//! let store = PreferenceStore::new(PreferenceSchema::serial_numbering());
//! let mut prefs = store.load(path)?;
//! prefs.set_from_str("station", "2")?;
//! store.save(&prefs, path)?;
//! let next = SerialNumbering::from_set(&prefs)?.next_after(latest)?;
//! ```

mod error;
mod schema;
mod serial;
mod store;

pub use error::{PrefsError, Result, SerialError};
pub use schema::{PrefKind, PrefSpec, PrefValue, PreferenceSchema, PreferenceSet};
pub use serial::SerialNumbering;
pub use store::PreferenceStore;
