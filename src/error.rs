//! Crate-wide error type and the error kinds reported to CLI users

use thiserror::Error;

use crate::config::ConfigError;
use crate::dispatch::DispatchError;
use crate::http::HttpError;
use crate::prefs::PrefsError;
use crate::tabular::TabularError;

/// Classification shared by every module error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A caller-supplied value violated a precondition; nothing was done
    InvalidArgument,
    Transport,
    /// Transport failure caused by an expired timeout
    Timeout,
    CorruptStore,
    UnrecognisedFormat,
    AmbiguousSchema,
    SchemaMismatch,
    HandlerFailed,
    /// Dispatcher queue full or closed
    Unavailable,
    Io,
    Config,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Transport => "TRANSPORT_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::CorruptStore => "CORRUPT_STORE",
            ErrorKind::UnrecognisedFormat => "UNRECOGNISED_FORMAT",
            ErrorKind::AmbiguousSchema => "AMBIGUOUS_SCHEMA",
            ErrorKind::SchemaMismatch => "SCHEMA_MISMATCH",
            ErrorKind::HandlerFailed => "HANDLER_FAILED",
            ErrorKind::Unavailable => "UNAVAILABLE",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Config => "CONFIG_ERROR",
        }
    }

    /// Timeouts are a sub-kind of transport failure
    pub fn is_transport(&self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::Timeout)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Prefs(#[from] PrefsError),

    #[error(transparent)]
    Tabular(#[from] TabularError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(e) => e.kind(),
            Error::Prefs(e) => e.kind(),
            Error::Tabular(e) => e.kind(),
            Error::Dispatch(e) => e.kind(),
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_transport() {
        assert!(ErrorKind::Timeout.is_transport());
        assert!(ErrorKind::Transport.is_transport());
        assert!(!ErrorKind::CorruptStore.is_transport());
    }

    #[test]
    fn test_kind_passes_through_wrapper() {
        let err: Error = TabularError::AmbiguousSchema {
            column: "a".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::AmbiguousSchema);
        assert_eq!(err.kind().code(), "AMBIGUOUS_SCHEMA");
        assert_eq!(err.to_string(), "duplicate column name \"a\" in header");
    }
}
