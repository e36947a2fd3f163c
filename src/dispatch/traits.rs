use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use super::error::DispatchError;
use super::message::{Event, Message};
use super::queue::MessageQueue;
use crate::error::ErrorKind;

/// Outcome of a failed handler invocation
///
/// Either way the message is dropped. A fatal failure also unregisters the
/// handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("recoverable handler failure: {0}")]
    Recoverable(String),
    #[error("fatal handler failure: {0}")]
    Fatal(String),
}

impl HandlerError {
    pub fn recoverable(reason: impl fmt::Display) -> Self {
        HandlerError::Recoverable(reason.to_string())
    }

    pub fn fatal(reason: impl fmt::Display) -> Self {
        HandlerError::Fatal(reason.to_string())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, HandlerError::Fatal(_))
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::HandlerFailed
    }
}

impl From<DispatchError> for HandlerError {
    fn from(err: DispatchError) -> Self {
        HandlerError::recoverable(err)
    }
}

impl From<crate::error::Error> for HandlerError {
    fn from(err: crate::error::Error) -> Self {
        HandlerError::recoverable(err)
    }
}

/// Handle given to a handler for the message it is processing
#[derive(Clone)]
pub struct HandlerContext {
    queue: Arc<MessageQueue>,
}

impl HandlerContext {
    pub(crate) fn new(queue: Arc<MessageQueue>) -> Self {
        Self { queue }
    }

    /// Append a message to the tail of the queue
    ///
    /// Never waits: the consumer is busy running this handler, so a full
    /// queue is overdrawn and repaid as messages drain.
    pub fn post(&self, message: Message) -> Result<(), DispatchError> {
        super::validate(&message)?;
        self.queue.push_overdraft(message)
    }

    pub fn post_event<E: Event>(
        &self,
        originator: impl Into<String>,
        event: &E,
    ) -> Result<(), DispatchError> {
        self.post(Message::from_event(originator, event)?)
    }

    /// Messages waiting behind the current one
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Consumer of one message name
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Message, ctx: HandlerContext) -> Result<(), HandlerError>;
}

/// Handler backed by an async closure, see [`handler_fn`]
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: Message, ctx: HandlerContext) -> Result<(), HandlerError> {
        (self.f)(message, ctx).await
    }
}

/// Wrap an async closure as a shareable handler
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(Message, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
