use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("preference store {} is corrupt: {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to write preferences to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Serial(#[from] SerialError),
}

impl PrefsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PrefsError::CorruptStore { .. } => ErrorKind::CorruptStore,
            PrefsError::InvalidArgument(_) | PrefsError::Serial(_) => ErrorKind::InvalidArgument,
            PrefsError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Serial-number settings that cannot produce a serial
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerialError {
    #[error("serial-number increment must be at least 1, got {0}")]
    InvalidIncrement(i64),

    #[error("station id {station} must be in 0..{increment}")]
    StationOutOfRange { station: i64, increment: i64 },

    #[error("serial numbers exhausted after {latest}")]
    Exhausted { latest: u64 },
}

pub type Result<T> = std::result::Result<T, PrefsError>;
