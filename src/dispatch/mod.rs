//! Event dispatcher
//!
//! A bounded FIFO of [`Message`]s delivered one at a time to the single
//! [`MessageHandler`] registered for each message name.
//!
//! - Producers [`Dispatcher::post`] (or post through a [`Poster`] from
//!   another task) and wait while the queue is at capacity.
//! - [`Dispatcher::run_until_idle`] drains the queue in post order.
//! - Messages posted from inside a handler go to the tail of the queue.
//! - Handler failures are logged and never stop the run; a
//!   [`HandlerError::Fatal`] also unregisters the handler.
//! - A [`CancelFlag`] stops a run between handler invocations and leaves
//!   the rest of the queue for the next run.

mod dispatcher;
mod error;
mod message;
mod queue;
mod registry;
mod traits;

pub use dispatcher::{CancelFlag, Dispatcher, Poster, RunReport, StopReason};
pub use error::{DispatchError, Result};
pub use message::{Event, Message, new_originator};
pub use registry::{HandlerRegistry, Registration};
pub use traits::{FnHandler, HandlerContext, HandlerError, MessageHandler, handler_fn};

fn validate(message: &Message) -> Result<()> {
    if message.name.is_empty() {
        return Err(DispatchError::InvalidArgument(
            "message name must not be empty".to_string(),
        ));
    }
    Ok(())
}
