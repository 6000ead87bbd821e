//! # Diagnostic events emitted by queue workers and the distributor.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Worker lifecycle**: started, stopping, stopped
//! - **Dispatch faults**: handler errors, handler panics, dropped items
//! - **Registry**: subscriber added/removed, publish faults
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases
//! monotonically, serving as a logical clock; `at` is the local wall-clock time.
//!
//! ## Example
//! ```rust
//! use fanqueue::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HandlerFailed)
//!     .with_worker("audit#3")
//!     .with_handler("audit")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::HandlerFailed);
//! assert_eq!(ev.handler.as_deref(), Some("audit"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of diagnostic events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Worker lifecycle ===
    /// Drain loop began running.
    ///
    /// Sets: `worker`
    WorkerStarted,

    /// `stop()` took effect: queue closed, no new items accepted.
    ///
    /// Sets: `worker`
    WorkerStopping,

    /// Drain loop exited after dispatching the leftovers.
    ///
    /// Sets: `worker`
    WorkerStopped,

    // === Dispatch faults ===
    /// A handler returned an error for one item.
    ///
    /// Sets: `worker`, `handler`, `reason`
    HandlerFailed,

    /// A handler panicked for one item.
    ///
    /// Sets: `worker`, `handler`, `reason` (panic message)
    HandlerPanicked,

    /// An item never reached the handler (evicted by overflow or refused when full).
    ///
    /// Sets: `worker`, `reason` (overflow policy label)
    ItemDropped,

    // === Registry ===
    /// A new subscriber was registered.
    ///
    /// Sets: `worker`, `handler`
    SubscriberAdded,

    /// A subscriber was unregistered; its worker is stopping.
    ///
    /// Sets: `worker`, `handler`
    SubscriberRemoved,

    /// Distributing one event to one worker faulted; other workers were unaffected.
    ///
    /// Sets: `worker`, `reason`
    PublishFault,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            EventKind::WorkerStarted => "worker-started",
            EventKind::WorkerStopping => "worker-stopping",
            EventKind::WorkerStopped => "worker-stopped",
            EventKind::HandlerFailed => "handler-failed",
            EventKind::HandlerPanicked => "handler-panicked",
            EventKind::ItemDropped => "item-dropped",
            EventKind::SubscriberAdded => "subscriber-added",
            EventKind::SubscriberRemoved => "subscriber-removed",
            EventKind::PublishFault => "publish-fault",
        }
    }

    /// True for kinds that report a fault.
    #[inline]
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            EventKind::HandlerFailed | EventKind::HandlerPanicked | EventKind::PublishFault
        )
    }
}

/// Diagnostic event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Worker name, if applicable.
    pub worker: Option<Arc<str>>,
    /// Handler name, if applicable.
    pub handler: Option<Arc<str>>,
    /// Human-readable reason (errors, panic info, overflow policy).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            handler: None,
            reason: None,
        }
    }

    /// Attaches a worker name.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a handler name.
    #[inline]
    pub fn with_handler(mut self, handler: impl Into<Arc<str>>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Emits the event through `tracing` at a level matching its kind.
    pub(crate) fn log(&self) {
        let worker = self.worker.as_deref().unwrap_or("-");
        let handler = self.handler.as_deref().unwrap_or("-");
        let reason = self.reason.as_deref().unwrap_or("-");
        let kind = self.kind.as_label();

        match self.kind {
            k if k.is_fault() => {
                tracing::warn!(seq = self.seq, kind, worker, handler, reason, "dispatch fault");
            }
            EventKind::ItemDropped => {
                tracing::trace!(seq = self.seq, kind, worker, reason, "item dropped");
            }
            _ => {
                tracing::debug!(seq = self.seq, kind, worker, handler, "lifecycle");
            }
        }
    }
}
