use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("message queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("dispatcher has shut down")]
    Closed,

    #[error("payload of message {name:?} does not convert: {source}")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a {expected:?} message, got {found:?}")]
    UnexpectedEvent {
        expected: &'static str,
        found: String,
    },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::InvalidArgument(_)
            | DispatchError::Payload { .. }
            | DispatchError::UnexpectedEvent { .. } => ErrorKind::InvalidArgument,
            DispatchError::QueueFull { .. } | DispatchError::Closed => ErrorKind::Unavailable,
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
