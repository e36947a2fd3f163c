use std::time::Duration;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::humanize::ByteSize;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("protocol error from {url}: {reason}")]
    Protocol { url: String, reason: String },

    #[error("response from {url} exceeds {limit}")]
    BodyTooLarge { url: String, limit: ByteSize },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl HttpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            HttpError::Timeout { .. } => ErrorKind::Timeout,
            HttpError::Transport { .. }
            | HttpError::Protocol { .. }
            | HttpError::BodyTooLarge { .. }
            | HttpError::Client(_) => ErrorKind::Transport,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Timeout { .. })
    }

    pub fn is_transport(&self) -> bool {
        self.kind().is_transport()
    }

    pub(crate) fn from_reqwest(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else {
            HttpError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
