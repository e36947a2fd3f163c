//! Process-local counters shared by the HTTP client and the dispatcher

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    http_requests: AtomicU64,
    http_failures: AtomicU64,
    messages_posted: AtomicU64,
    messages_delivered: AtomicU64,
    messages_dropped: AtomicU64,
    handler_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "http_requests", "Metric incremented");
    }

    pub fn http_failure(&self) {
        self.http_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "http_failures", "Metric incremented");
    }

    pub fn message_posted(&self) {
        self.messages_posted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "messages_posted", "Metric incremented");
    }

    pub fn message_delivered(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "messages_delivered", "Metric incremented");
    }

    pub fn message_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "messages_dropped", "Metric incremented");
    }

    pub fn handler_failed(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "handler_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            http_requests: self.http_requests.load(Ordering::Relaxed),
            http_failures: self.http_failures.load(Ordering::Relaxed),
            messages_posted: self.messages_posted.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub http_requests: u64,
    pub http_failures: u64,
    pub messages_posted: u64,
    pub messages_delivered: u64,
    pub messages_dropped: u64,
    pub handler_failures: u64,
}
