use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::error::{DispatchError, Result};
use super::message::Message;
use super::queue::MessageQueue;
use super::registry::{HandlerRegistry, Registration};
use super::traits::{HandlerContext, HandlerError, MessageHandler};
use crate::config::DispatcherConfig;
use crate::error::ErrorKind;
use crate::observability::Metrics;

/// Cooperative stop signal checked between handler invocations
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag, returning whether it was set
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// The queue drained
    #[default]
    Idle,
    /// A [`CancelFlag`] fired; undelivered messages stay queued
    Cancelled,
}

/// Counts for one [`Dispatcher::run_until_idle`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Handled without error
    pub delivered: u64,
    /// No handler registered for the name
    pub dropped: u64,
    /// Handler returned an error, panicked or timed out
    pub failed: u64,
    pub stop: StopReason,
}

/// Cloneable producer handle for other tasks
#[derive(Clone)]
pub struct Poster {
    queue: Arc<MessageQueue>,
}

impl Poster {
    /// Enqueue, waiting while the queue is at capacity
    pub async fn post(&self, message: Message) -> Result<()> {
        super::validate(&message)?;
        self.queue.push(message).await
    }

    pub fn try_post(&self, message: Message) -> Result<()> {
        super::validate(&message)?;
        self.queue.try_push(message)
    }
}

/// Delivers queued messages to one handler per name, in post order
///
/// Handlers run one at a time. Each invocation is spawned and awaited so a
/// panic is contained to the message that caused it.
pub struct Dispatcher {
    queue: Arc<MessageQueue>,
    registry: HandlerRegistry,
    cancel: CancelFlag,
    handler_timeout: Option<Duration>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(config: &DispatcherConfig) -> Result<Self> {
        Self::with_metrics(config, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(config: &DispatcherConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let capacity = config.queue_capacity;
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
            return Err(DispatchError::InvalidArgument(format!(
                "queue capacity must be between 1 and {}, got {capacity}",
                Semaphore::MAX_PERMITS
            )));
        }

        let handler_timeout = config.handler_timeout.map(|t| t.as_duration());
        if handler_timeout.is_some_and(|t| t.is_zero()) {
            return Err(DispatchError::InvalidArgument(
                "handler timeout must be greater than zero".to_string(),
            ));
        }

        info!(capacity, ?handler_timeout, "Dispatcher created");

        Ok(Self {
            queue: Arc::new(MessageQueue::new(capacity, metrics.clone())),
            registry: HandlerRegistry::new(),
            cancel: CancelFlag::new(),
            handler_timeout,
            metrics,
        })
    }

    pub fn poster(&self) -> Poster {
        Poster {
            queue: self.queue.clone(),
        }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Bind `handler` to `name`, replacing any previous handler
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "message name must not be empty".to_string(),
            ));
        }

        match self.registry.register(name.clone(), handler) {
            Registration::Added => info!(name = %name, "Handler registered"),
            Registration::Replaced => info!(name = %name, "Handler replaced"),
            Registration::Unchanged => debug!(name = %name, "Handler already registered"),
        }
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.registry.unregister(name);
        if removed {
            info!(name, "Handler unregistered");
        }
        removed
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Enqueue, waiting while the queue is at capacity
    pub async fn post(&self, message: Message) -> Result<()> {
        super::validate(&message)?;
        self.queue.push(message).await
    }

    pub fn try_post(&self, message: Message) -> Result<()> {
        super::validate(&message)?;
        self.queue.try_push(message)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Deliver messages until the queue is empty or the cancel flag fires
    pub async fn run_until_idle(&mut self) -> RunReport {
        let mut report = RunReport::default();

        loop {
            if self.cancel.take() {
                report.stop = StopReason::Cancelled;
                info!(pending = self.queue.len(), "Dispatch run cancelled");
                break;
            }

            let Some(message) = self.queue.pop() else {
                break;
            };

            let Some(handler) = self.registry.get(&message.name) else {
                warn!(
                    name = %message.name,
                    originator = %message.originator,
                    "No handler registered, message dropped"
                );
                self.metrics.message_dropped();
                report.dropped += 1;
                continue;
            };

            let name = message.name.clone();
            let originator = message.originator.clone();
            match self.invoke(handler.clone(), message).await {
                Ok(()) => {
                    debug!(name = %name, originator = %originator, "Message delivered");
                    self.metrics.message_delivered();
                    report.delivered += 1;
                }
                Err(failure) => {
                    self.metrics.handler_failed();
                    report.failed += 1;
                    let code = ErrorKind::HandlerFailed.code();
                    match failure {
                        Failure::Returned(HandlerError::Recoverable(reason)) => warn!(
                            name = %name,
                            originator = %originator,
                            code,
                            reason = %reason,
                            "Handler failed, message dropped"
                        ),
                        Failure::Returned(HandlerError::Fatal(reason)) => {
                            error!(
                                name = %name,
                                originator = %originator,
                                code,
                                reason = %reason,
                                "Handler failed fatally, unregistering"
                            );
                            self.registry.unregister_if_same(&name, &handler);
                        }
                        Failure::TimedOut(limit) => warn!(
                            name = %name,
                            originator = %originator,
                            code,
                            timeout_ms = limit.as_millis() as u64,
                            "Handler timed out, message dropped"
                        ),
                        Failure::Panicked(reason) => error!(
                            name = %name,
                            originator = %originator,
                            code,
                            reason = %reason,
                            "Handler panicked, message dropped"
                        ),
                    }
                }
            }
        }

        debug!(?report, "Dispatch run finished");
        report
    }

    async fn invoke(
        &self,
        handler: Arc<dyn MessageHandler>,
        message: Message,
    ) -> std::result::Result<(), Failure> {
        let ctx = HandlerContext::new(self.queue.clone());
        let mut task = tokio::spawn(async move { handler.handle(message, ctx).await });

        let joined = match self.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    return Err(Failure::TimedOut(limit));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(outcome) => outcome.map_err(Failure::Returned),
            Err(join_error) if join_error.is_panic() => {
                Err(Failure::Panicked(panic_message(join_error.into_panic())))
            }
            Err(join_error) => Err(Failure::Returned(HandlerError::recoverable(join_error))),
        }
    }
}

/// Why one handler invocation did not succeed; logged once by the run loop
#[derive(Debug, PartialEq, Eq)]
enum Failure {
    Returned(HandlerError),
    TimedOut(Duration),
    Panicked(String),
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.queue.close();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler_fn;
    use crate::humanize::HumanDuration;
    use serde_json::json;
    use std::sync::Mutex;

    fn config(capacity: usize) -> DispatcherConfig {
        DispatcherConfig {
            queue_capacity: capacity,
            handler_timeout: None,
        }
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(matches!(
            Dispatcher::new(&config(0)),
            Err(DispatchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_register_rejects_empty_name() {
        let mut dispatcher = Dispatcher::new(&config(4)).unwrap();
        let result = dispatcher.register("", handler_fn(|_, _| async { Ok(()) }));
        assert!(matches!(result, Err(DispatchError::InvalidArgument(_))));
    }

    #[test]
    fn test_try_post_full_queue() {
        let dispatcher = Dispatcher::new(&config(1)).unwrap();
        dispatcher.try_post(Message::new("x", "a", json!(1))).unwrap();

        let err = dispatcher
            .try_post(Message::new("x", "a", json!(2)))
            .unwrap_err();
        assert!(matches!(err, DispatchError::QueueFull { capacity: 1 }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_unregistered_name_is_dropped() {
        let mut dispatcher = Dispatcher::new(&config(4)).unwrap();
        dispatcher.post(Message::new("nobody", "a", json!(null))).await.unwrap();

        let report = dispatcher.run_until_idle().await;
        assert_eq!(report.dropped, 1);
        assert_eq!(report.delivered, 0);
        assert_eq!(report.stop, StopReason::Idle);
        assert_eq!(dispatcher.metrics().snapshot().messages_dropped, 1);
    }

    #[tokio::test]
    async fn test_handler_timeout_counts_as_failure() {
        let mut dispatcher = Dispatcher::new(&DispatcherConfig {
            queue_capacity: 4,
            handler_timeout: Some(HumanDuration(Duration::from_millis(20))),
        })
        .unwrap();

        let finished = Arc::new(Mutex::new(Vec::new()));
        let log = finished.clone();
        dispatcher
            .register(
                "slow",
                handler_fn(move |message, _| {
                    let log = log.clone();
                    async move {
                        if message.payload == json!("sleep") {
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                        log.lock().unwrap().push(message.payload);
                        Ok(())
                    }
                }),
            )
            .unwrap();

        dispatcher.post(Message::new("slow", "a", json!("sleep"))).await.unwrap();
        dispatcher.post(Message::new("slow", "a", json!("fast"))).await.unwrap();

        let report = dispatcher.run_until_idle().await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 1);
        assert!(dispatcher.is_registered("slow"));
        assert_eq!(*finished.lock().unwrap(), vec![json!("fast")]);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_one_failure() {
        let mut dispatcher = Dispatcher::new(&config(4)).unwrap();
        dispatcher
            .register(
                "boom",
                handler_fn(|message, _| async move {
                    if message.payload == json!("panic") {
                        panic!("handler exploded");
                    }
                    Ok(())
                }),
            )
            .unwrap();

        let handler = dispatcher.registry.get("boom").unwrap();
        let failure = dispatcher
            .invoke(handler, Message::new("boom", "a", json!("panic")))
            .await
            .unwrap_err();
        assert_eq!(failure, Failure::Panicked("handler exploded".to_string()));

        dispatcher.post(Message::new("boom", "a", json!("panic"))).await.unwrap();
        dispatcher.post(Message::new("boom", "a", json!("calm"))).await.unwrap();

        let report = dispatcher.run_until_idle().await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 1);
        assert!(dispatcher.is_registered("boom"));
        assert_eq!(dispatcher.metrics().snapshot().handler_failures, 1);
    }

    #[tokio::test]
    async fn test_timeout_reports_the_limit() {
        let mut dispatcher = Dispatcher::new(&DispatcherConfig {
            queue_capacity: 2,
            handler_timeout: Some(HumanDuration(Duration::from_millis(10))),
        })
        .unwrap();
        dispatcher
            .register(
                "slow",
                handler_fn(|_, _| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }),
            )
            .unwrap();

        let handler = dispatcher.registry.get("slow").unwrap();
        let failure = dispatcher
            .invoke(handler, Message::new("slow", "a", json!(null)))
            .await
            .unwrap_err();
        assert_eq!(failure, Failure::TimedOut(Duration::from_millis(10)));
    }

    #[test]
    fn test_cancel_flag_take_clears() {
        let flag = CancelFlag::new();
        flag.cancel();
        assert!(flag.is_cancelled());
        assert!(flag.take());
        assert!(!flag.is_cancelled());
        assert!(!flag.take());
    }
}
