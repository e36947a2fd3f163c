pub mod config;
pub mod dispatch;
pub mod error;
pub mod fsutil;
pub mod http;
pub mod humanize;
pub mod observability;
pub mod prefs;
pub mod tabular;

pub use error::{Error, ErrorKind, Result};
