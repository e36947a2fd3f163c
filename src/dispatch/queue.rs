use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Semaphore, TryAcquireError};
use tracing::debug;

use super::error::{DispatchError, Result};
use super::message::Message;
use crate::observability::Metrics;

/// Bounded FIFO shared by the dispatcher and its posters
///
/// Free slots are semaphore permits. A producer takes a permit before
/// enqueueing and the consumer returns one per dequeued message.
/// Handler-posted messages may enqueue without a permit; each one is
/// recorded as overdraft and repaid by a later dequeue instead of a permit.
pub(crate) struct MessageQueue {
    state: Mutex<QueueState>,
    slots: Semaphore,
    capacity: usize,
    metrics: Arc<Metrics>,
}

#[derive(Default)]
struct QueueState {
    messages: VecDeque<Message>,
    overdraft: usize,
}

impl MessageQueue {
    pub(crate) fn new(capacity: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            slots: Semaphore::new(capacity),
            capacity,
            metrics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue, waiting for a free slot
    pub(crate) async fn push(&self, message: Message) -> Result<()> {
        let permit = self
            .slots
            .acquire()
            .await
            .map_err(|_| DispatchError::Closed)?;
        permit.forget();
        self.enqueue(message, false);
        Ok(())
    }

    pub(crate) fn try_push(&self, message: Message) -> Result<()> {
        match self.slots.try_acquire() {
            Ok(permit) => permit.forget(),
            Err(TryAcquireError::NoPermits) => {
                return Err(DispatchError::QueueFull {
                    capacity: self.capacity,
                });
            }
            Err(TryAcquireError::Closed) => return Err(DispatchError::Closed),
        }
        self.enqueue(message, false);
        Ok(())
    }

    /// Enqueue without waiting, overdrawing capacity when no slot is free
    pub(crate) fn push_overdraft(&self, message: Message) -> Result<()> {
        let overdraft = match self.slots.try_acquire() {
            Ok(permit) => {
                permit.forget();
                false
            }
            Err(TryAcquireError::NoPermits) => true,
            Err(TryAcquireError::Closed) => return Err(DispatchError::Closed),
        };
        self.enqueue(message, overdraft);
        Ok(())
    }

    fn enqueue(&self, message: Message, overdraft: bool) {
        debug!(
            name = %message.name,
            originator = %message.originator,
            overdraft,
            "Message enqueued"
        );
        let mut state = self.lock();
        if overdraft {
            state.overdraft += 1;
        }
        state.messages.push_back(message);
        drop(state);
        self.metrics.message_posted();
    }

    pub(crate) fn pop(&self) -> Option<Message> {
        let mut state = self.lock();
        let message = state.messages.pop_front()?;
        let repaid = if state.overdraft > 0 {
            state.overdraft -= 1;
            true
        } else {
            false
        };
        drop(state);

        if !repaid {
            self.slots.add_permits(1);
        }
        Some(message)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wake blocked producers with [`DispatchError::Closed`]
    pub(crate) fn close(&self) {
        self.slots.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn message(n: u32) -> Message {
        Message::new("m", format!("p{n}"), Value::from(n))
    }

    #[test]
    fn test_try_push_respects_capacity() {
        let queue = MessageQueue::new(2, Arc::new(Metrics::new()));
        queue.try_push(message(1)).unwrap();
        queue.try_push(message(2)).unwrap();

        assert!(matches!(
            queue.try_push(message(3)),
            Err(DispatchError::QueueFull { capacity: 2 })
        ));

        assert_eq!(queue.pop().unwrap().originator, "p1");
        queue.try_push(message(3)).unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_overdraft_is_repaid_before_slots_free() {
        let queue = MessageQueue::new(1, Arc::new(Metrics::new()));
        queue.try_push(message(1)).unwrap();
        queue.push_overdraft(message(2)).unwrap();
        queue.push_overdraft(message(3)).unwrap();
        assert_eq!(queue.len(), 3);

        queue.pop().unwrap();
        queue.pop().unwrap();
        assert!(queue.try_push(message(4)).is_err());

        queue.pop().unwrap();
        queue.try_push(message(4)).unwrap();
        assert_eq!(queue.pop().unwrap().originator, "p4");
        assert!(queue.pop().is_none());
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_producer() {
        let queue = Arc::new(MessageQueue::new(1, Arc::new(Metrics::new())));
        queue.push(message(1)).await.unwrap();

        let waiting = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.push(message(2)).await })
        };
        tokio::task::yield_now().await;
        queue.close();

        assert!(matches!(waiting.await.unwrap(), Err(DispatchError::Closed)));
        assert!(matches!(
            queue.push_overdraft(message(3)),
            Err(DispatchError::Closed)
        ));
    }
}
