use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("unrecognised table format: {reason}")]
    UnrecognisedFormat { reason: String },

    #[error("duplicate column name {column:?} in header")]
    AmbiguousSchema { column: String },

    #[error("row {row} has {found} cells but the header has {expected}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("record {row} does not match the table columns: {reason}")]
    FieldMismatch { row: usize, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode table: {0}")]
    Encode(String),
}

impl TabularError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TabularError::UnrecognisedFormat { .. } => ErrorKind::UnrecognisedFormat,
            TabularError::AmbiguousSchema { .. } => ErrorKind::AmbiguousSchema,
            TabularError::SchemaMismatch { .. } | TabularError::FieldMismatch { .. } => {
                ErrorKind::SchemaMismatch
            }
            TabularError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            TabularError::Io { .. } | TabularError::Encode(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn unrecognised(reason: impl Into<String>) -> Self {
        TabularError::UnrecognisedFormat {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TabularError>;
