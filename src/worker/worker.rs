//! # QueueWorker: per-subscriber queue and drain loop.
//!
//! Owns one [`BoundedAsyncQueue`] and a dedicated task that turns buffered
//! items into handler invocations.
//!
//! ## Architecture
//! ```text
//! enqueue(item)
//!     │ running? ── no ──► false
//!     │ filter?  ── no ──► false (never touches capacity)
//!     ▼
//! [BoundedAsyncQueue] ──► drain loop (one task)
//!                           loop {
//!                             batch = drain_all_available(poll_interval)
//!                             ├─ parallelism == 1 → items one by one, in order
//!                             └─ parallelism  > 1 → up to N items at once,
//!                                                   dispatched in batch order,
//!                                                   batch barrier before next drain
//!                           }
//!                           each item → every handler, in registration order
//!                                       ├─ Err   → HandlerFailed
//!                                       └─ panic → HandlerPanicked
//! ```
//!
//! ## Rules
//! - **Per-worker FIFO** under `parallelism == 1`, minus overflow evictions.
//! - **No overlapping drains**: the next `drain_all_available` starts only after
//!   every item of the previous batch finished.
//! - **Fault isolation**: handler errors and panics are reported and swallowed.
//! - **Graceful stop**: `stop()` closes the queue; the loop dispatches what is
//!   left and exits. Running handlers are never cancelled.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a handler uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures::{FutureExt, StreamExt};
use tokio::sync::Notify;

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::{panic_message, ConfigError};
use crate::events::{Bus, Event, EventKind};
use crate::queue::{BoundedAsyncQueue, Offer};
use crate::sync::AtomicFlag;
use crate::worker::filter::Filter;
use crate::worker::handler::HandlerRef;
use crate::worker::options::SubscribeOptions;
use crate::worker::state::{Counters, StateCell, WorkerId, WorkerState, WorkerStats};

/// State shared between the worker handle and its drain loop.
struct Shared<T> {
    id: WorkerId,
    name: Arc<str>,
    queue: BoundedAsyncQueue<T>,
    filter: ArcSwap<Filter<T>>,
    handlers: ArcSwap<Vec<HandlerRef<T>>>,
    running: AtomicFlag,
    state: StateCell,
    stopped: Notify,
    counters: Counters,
    max_parallelism: usize,
    poll_interval: Duration,
    bus: Bus,
}

/// One subscriber's bounded queue plus the task draining it.
///
/// Dropping the worker stops it; the drain loop still dispatches leftovers.
///
/// # Example
/// ```
/// use fanqueue::{Bus, HandlerError, HandlerFn, HandlerRef, QueueWorker, SubscribeOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), fanqueue::ConfigError> {
/// let handler: HandlerRef<u32> = HandlerFn::arc("print", |n: u32| async move {
///     println!("{n}");
///     Ok::<_, HandlerError>(())
/// });
/// let worker = QueueWorker::spawn(handler, SubscribeOptions::new(), Bus::default())?;
/// assert!(worker.enqueue(1));
/// worker.stop();
/// worker.join().await;
/// assert_eq!(worker.stats().dispatched, 1);
/// # Ok(())
/// # }
/// ```
pub struct QueueWorker<T> {
    shared: Arc<Shared<T>>,
}

impl<T> QueueWorker<T>
where
    T: Send + Sync + 'static,
{
    /// Validates `options`, creates the queue and spawns the drain loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        handler: HandlerRef<T>,
        options: SubscribeOptions<T>,
        bus: Bus,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        let queue = BoundedAsyncQueue::new(options.queue_config())?;

        let id = WorkerId::next();
        let name: Arc<str> = match &options.name {
            Some(name) => format!("{name}#{id}").into(),
            None => format!("{}#{id}", handler.name()).into(),
        };

        let shared = Arc::new(Shared {
            id,
            name,
            queue,
            filter: ArcSwap::from_pointee(options.filter),
            handlers: ArcSwap::from_pointee(vec![handler]),
            running: AtomicFlag::new(true),
            state: StateCell::new(),
            stopped: Notify::new(),
            counters: Counters::default(),
            max_parallelism: options.max_parallelism,
            poll_interval: options.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            bus,
        });

        tokio::spawn(Arc::clone(&shared).drain_loop());
        Ok(Self { shared })
    }
}

impl<T> QueueWorker<T> {
    /// Front door for items.
    ///
    /// Returns `false` without enqueueing if the worker is stopped or the filter
    /// rejects the item; otherwise the queue decides (drop-oldest never refuses).
    pub fn enqueue(&self, item: T) -> bool {
        let s = &self.shared;
        if !s.running.get() {
            return false;
        }
        if !s.filter.load().matches(&item) {
            Counters::inc(&s.counters.filtered);
            return false;
        }

        match s.queue.offer(item) {
            Offer::Accepted => {
                Counters::inc(&s.counters.enqueued);
                true
            }
            Offer::Evicted(_) => {
                Counters::inc(&s.counters.enqueued);
                Counters::inc(&s.counters.dropped);
                s.publish(
                    Event::new(EventKind::ItemDropped)
                        .with_reason(s.queue.overflow_policy().as_label()),
                );
                true
            }
            Offer::Full(_) => {
                Counters::inc(&s.counters.dropped);
                s.publish(Event::new(EventKind::ItemDropped).with_reason("full"));
                false
            }
            Offer::Closed(_) => false,
        }
    }

    /// Adds a handler invoked, after the existing ones, for every item dispatched from now on.
    pub fn register_handler(&self, handler: HandlerRef<T>) {
        self.shared.handlers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&handler));
            next
        });
    }

    /// Replaces the filter. Items already buffered are unaffected.
    pub fn set_filter(&self, filter: Filter<T>) {
        self.shared.filter.store(Arc::new(filter));
    }

    /// Stops accepting items and closes the queue.
    ///
    /// Idempotent: only the first call has any effect. Does not wait for the
    /// drain loop; see [`join`](Self::join).
    pub fn stop(&self) {
        let s = &self.shared;
        if !s.running.compare_and_swap(true, false) {
            return;
        }
        s.state.advance(WorkerState::Stopping);
        s.queue.close();
        s.publish(Event::new(EventKind::WorkerStopping));
    }

    /// Waits until the drain loop has exited.
    ///
    /// Never returns for a worker that was not stopped.
    pub async fn join(&self) {
        loop {
            let notified = self.shared.stopped.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.shared.state.get() == WorkerState::Stopped {
                return;
            }
            notified.await;
        }
    }

    /// [`stop`](Self::stop) followed by [`join`](Self::join).
    pub async fn shutdown(&self) {
        self.stop();
        self.join().await;
    }

    /// Unique worker id.
    #[inline]
    pub fn id(&self) -> WorkerId {
        self.shared.id
    }

    /// Worker name (`<subscriber name>#<id>`).
    #[inline]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> WorkerState {
        self.shared.state.get()
    }

    /// True until [`stop`](Self::stop) is called.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }

    /// Snapshot of the worker's counters.
    pub fn stats(&self) -> WorkerStats {
        self.shared.counters.snapshot()
    }

    /// Number of items waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.shared.queue.len()
    }

    /// Queue capacity (`None` = unbounded).
    pub fn capacity(&self) -> Option<usize> {
        self.shared.queue.capacity()
    }

    /// Parallelism bound of the dispatch stage.
    pub fn max_parallelism(&self) -> usize {
        self.shared.max_parallelism
    }

    /// Number of handlers invoked per item.
    pub fn handler_count(&self) -> usize {
        self.shared.handlers.load().len()
    }
}

impl<T> Drop for QueueWorker<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T> std::fmt::Debug for QueueWorker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueWorker")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("queue_len", &self.queue_len())
            .field("max_parallelism", &self.max_parallelism())
            .finish()
    }
}

impl<T> Shared<T> {
    fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_worker(Arc::clone(&self.name)));
    }
}

impl<T> Shared<T>
where
    T: Send + Sync + 'static,
{
    async fn drain_loop(self: Arc<Self>) {
        self.state.advance(WorkerState::Running);
        self.publish(Event::new(EventKind::WorkerStarted));

        loop {
            let batch = self.queue.drain_all_available(self.poll_interval).await;
            if batch.is_empty() {
                // Nothing can be added once closed, so closed + empty is final.
                if self.queue.is_closed() && self.queue.is_empty() {
                    break;
                }
                continue;
            }
            self.dispatch_batch(batch).await;
        }

        self.state.advance(WorkerState::Stopped);
        self.publish(Event::new(EventKind::WorkerStopped));
        self.stopped.notify_waiters();
    }

    async fn dispatch_batch(&self, batch: Vec<T>) {
        if self.max_parallelism == 1 {
            for item in batch {
                self.dispatch_one(item).await;
            }
        } else {
            futures::stream::iter(batch)
                .for_each_concurrent(self.max_parallelism, |item| self.dispatch_one(item))
                .await;
        }
    }

    /// Runs every handler on one item, each behind its own fault boundary.
    async fn dispatch_one(&self, item: T) {
        let handlers = self.handlers.load_full();
        for handler in handlers.iter() {
            let outcome = AssertUnwindSafe(handler.handle(&item)).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    Counters::inc(&self.counters.faults);
                    self.publish(
                        Event::new(EventKind::HandlerFailed)
                            .with_handler(handler.name())
                            .with_reason(err.as_message()),
                    );
                }
                Err(panic_err) => {
                    Counters::inc(&self.counters.faults);
                    self.publish(
                        Event::new(EventKind::HandlerPanicked)
                            .with_handler(handler.name())
                            .with_reason(panic_message(&*panic_err)),
                    );
                }
            }
        }
        Counters::inc(&self.counters.dispatched);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::HandlerError;
    use crate::queue::OverflowPolicy;
    use crate::testing::{Failing, Panicking, Recorder};
    use crate::worker::{Handler, HandlerFn};

    const WAIT: Duration = Duration::from_secs(5);

    fn spawn<T: Send + Sync + 'static>(
        handler: HandlerRef<T>,
        opts: SubscribeOptions<T>,
    ) -> (QueueWorker<T>, Bus) {
        let bus = Bus::new(1024);
        let worker = QueueWorker::spawn(handler, opts, bus.clone()).unwrap();
        (worker, bus)
    }

    fn drain_kinds(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    #[tokio::test]
    async fn test_sequential_dispatch_preserves_fifo() {
        let rec = Recorder::<u32>::new("rec");
        let (worker, _bus) = spawn(rec.clone() as HandlerRef<u32>, SubscribeOptions::new());

        for i in 0..200 {
            assert!(worker.enqueue(i));
            if i % 17 == 0 {
                tokio::task::yield_now().await;
            }
        }
        assert!(rec.wait_for(200, WAIT).await);
        assert_eq!(rec.items(), (0..200).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_filter_rejects_before_capacity() {
        let rec = Recorder::<u32>::new("rec");
        let opts = SubscribeOptions::new()
            .with_capacity(2)
            .with_filter(|n: &u32| *n > 100);
        let (worker, _bus) = spawn(rec.clone() as HandlerRef<u32>, opts);

        for i in 0..50 {
            assert!(!worker.enqueue(i));
        }
        assert_eq!(worker.queue_len(), 0);
        let stats = worker.stats();
        assert_eq!(stats.filtered, 50);
        assert_eq!(stats.dropped, 0);
        assert_eq!(stats.enqueued, 0);

        assert!(worker.enqueue(101));
        assert!(rec.wait_for(1, WAIT).await);
        assert_eq!(rec.items(), vec![101]);
    }

    #[tokio::test]
    async fn test_set_filter_applies_to_later_items() {
        let rec = Recorder::<u32>::new("rec");
        let (worker, _bus) = spawn(rec.clone() as HandlerRef<u32>, SubscribeOptions::new());

        // Buffered before the loop runs (current-thread runtime).
        assert!(worker.enqueue(1));
        worker.set_filter(Filter::new(|n: &u32| n % 2 == 0));
        assert!(!worker.enqueue(3));
        assert!(worker.enqueue(4));

        assert!(rec.wait_for(2, WAIT).await);
        assert_eq!(rec.items(), vec![1, 4]);
    }

    #[tokio::test]
    async fn test_drop_oldest_while_handler_is_busy() {
        let gate = Arc::new(Notify::new());
        let started = Arc::new(Notify::new());
        let seen = Recorder::<u32>::new("seen");

        let handler: HandlerRef<u32> = {
            let gate = Arc::clone(&gate);
            let started = Arc::clone(&started);
            let seen = Arc::clone(&seen);
            HandlerFn::arc("gated", move |n: u32| {
                let gate = Arc::clone(&gate);
                let started = Arc::clone(&started);
                let seen = Arc::clone(&seen);
                async move {
                    if n == 0 {
                        started.notify_one();
                        gate.notified().await;
                    }
                    seen.handle(&n).await
                }
            })
        };
        let (worker, _bus) = spawn(handler, SubscribeOptions::new().with_capacity(3));

        assert!(worker.enqueue(0));
        tokio::time::timeout(WAIT, started.notified()).await.unwrap();

        for i in 1..=5 {
            assert!(worker.enqueue(i));
        }
        assert_eq!(worker.queue_len(), 3);
        assert_eq!(worker.stats().dropped, 2);

        gate.notify_one();
        assert!(seen.wait_for(4, WAIT).await);
        assert_eq!(seen.items(), vec![0, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_reject_policy_refuses_when_full() {
        let rec = Recorder::<u32>::new("rec");
        let opts = SubscribeOptions::new()
            .with_capacity(2)
            .with_overflow(OverflowPolicy::Reject);
        let (worker, bus) = spawn(rec.clone() as HandlerRef<u32>, opts);
        let mut rx = bus.subscribe();

        // Loop has not run yet: the queue fills up.
        assert!(worker.enqueue(1));
        assert!(worker.enqueue(2));
        assert!(!worker.enqueue(3));
        assert_eq!(worker.stats().dropped, 1);
        assert_eq!(drain_kinds(&mut rx), vec![EventKind::ItemDropped]);

        assert!(rec.wait_for(2, WAIT).await);
        assert_eq!(rec.items(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_starve_next_handler() {
        let failing = Arc::new(Failing::default());
        let rec = Recorder::<u32>::new("rec");
        let (worker, bus) = spawn(failing.clone() as HandlerRef<u32>, SubscribeOptions::new());
        worker.register_handler(rec.clone());
        assert_eq!(worker.handler_count(), 2);
        let mut rx = bus.subscribe();

        for i in 1..=5 {
            assert!(worker.enqueue(i));
        }
        assert!(rec.wait_for(5, WAIT).await);
        assert_eq!(rec.items(), vec![1, 2, 3, 4, 5]);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 5);

        let stats = worker.stats();
        assert_eq!(stats.faults, 5);
        assert_eq!(stats.dispatched, 5);
        let failures = drain_kinds(&mut rx)
            .into_iter()
            .filter(|k| *k == EventKind::HandlerFailed)
            .count();
        assert_eq!(failures, 5);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_isolated() {
        let rec = Recorder::<u32>::new("rec");
        let (worker, bus) = spawn(Arc::new(Panicking) as HandlerRef<u32>, SubscribeOptions::new());
        worker.register_handler(rec.clone());
        let mut rx = bus.subscribe();

        assert!(worker.enqueue(1));
        assert!(worker.enqueue(2));
        assert!(rec.wait_for(2, WAIT).await);

        let panics: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::HandlerPanicked)
            .collect();
        assert_eq!(panics.len(), 2);
        assert_eq!(panics[0].reason.as_deref(), Some("handler exploded"));
        assert_eq!(panics[0].handler.as_deref(), Some("panicking"));
        assert!(worker.is_running());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_drains_leftovers() {
        let rec = Recorder::<u32>::new("rec");
        let (worker, bus) = spawn(rec.clone() as HandlerRef<u32>, SubscribeOptions::new());
        let mut rx = bus.subscribe();
        assert_eq!(worker.state(), WorkerState::Created);

        for i in 0..3 {
            assert!(worker.enqueue(i));
        }
        worker.stop();
        worker.stop();
        assert!(!worker.is_running());
        assert!(!worker.enqueue(99), "stopped worker rejects items");

        tokio::time::timeout(WAIT, worker.join()).await.unwrap();
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert_eq!(rec.items(), vec![0, 1, 2]);

        worker.stop();
        let kinds = drain_kinds(&mut rx);
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::WorkerStopping).count(),
            1
        );
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::WorkerStopped).count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_loop_survives_poll_timeouts() {
        let rec = Recorder::<u32>::new("rec");
        let opts = SubscribeOptions::new().with_poll_interval(Duration::from_millis(10));
        let (worker, _bus) = spawn(rec.clone() as HandlerRef<u32>, opts);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(worker.state(), WorkerState::Running);
        assert!(worker.enqueue(7));
        assert!(rec.wait_for(1, WAIT).await);
        worker.shutdown().await;
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_parallel_dispatch_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Recorder::<u32>::new("done");

        let handler: HandlerRef<u32> = {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            let done = Arc::clone(&done);
            HandlerFn::arc("slow", move |n: u32| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                let done = Arc::clone(&done);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    done.handle(&n).await
                }
            })
        };
        let (worker, _bus) = spawn(handler, SubscribeOptions::new().with_max_parallelism(4));

        // One batch: the loop has not been polled yet.
        for i in 0..8 {
            assert!(worker.enqueue(i));
        }
        assert!(done.wait_for(8, WAIT).await);
        assert_eq!(peak.load(Ordering::SeqCst), 4);

        let mut items = done.items();
        items.sort_unstable();
        assert_eq!(items, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_parallel_batches_do_not_overlap() {
        let gate = Arc::new(Notify::new());
        let done = Recorder::<u32>::new("done");

        let handler: HandlerRef<u32> = {
            let gate = Arc::clone(&gate);
            let done = Arc::clone(&done);
            HandlerFn::arc("barrier", move |n: u32| {
                let gate = Arc::clone(&gate);
                let done = Arc::clone(&done);
                async move {
                    if n == 1 {
                        gate.notified().await;
                    }
                    done.handle(&n).await
                }
            })
        };
        let (worker, _bus) = spawn(handler, SubscribeOptions::new().with_max_parallelism(2));

        assert!(worker.enqueue(1));
        assert!(worker.enqueue(2));
        assert!(done.wait_for(1, WAIT).await);
        assert_eq!(done.items(), vec![2]);

        // Item 1 still holds the first batch open; 3 must wait for the barrier.
        assert!(worker.enqueue(3));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(done.items(), vec![2]);
        assert_eq!(worker.queue_len(), 1);

        gate.notify_one();
        assert!(done.wait_for(3, WAIT).await);
        assert_eq!(done.items(), vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn test_invalid_options_fail_fast() {
        let rec = Recorder::<u32>::new("rec");
        let err = QueueWorker::spawn(
            rec as HandlerRef<u32>,
            SubscribeOptions::new().with_max_parallelism(0),
            Bus::default(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::ZeroParallelism);
    }

    #[tokio::test]
    async fn test_handler_error_reason_is_reported() {
        let handler: HandlerRef<u32> =
            HandlerFn::arc("picky", |n: u32| async move {
                if n == 13 {
                    return Err(HandlerError::fail("unlucky"));
                }
                Ok(())
            });
        let (worker, bus) = spawn(handler, SubscribeOptions::new().with_name("picky-sub"));
        let mut rx = bus.subscribe();
        assert!(worker.name().starts_with("picky-sub#"));

        assert!(worker.enqueue(13));
        worker.shutdown().await;

        let failed = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|ev| ev.kind == EventKind::HandlerFailed)
            .expect("failure reported");
        assert_eq!(failed.reason.as_deref(), Some("error: unlucky"));
        assert_eq!(failed.handler.as_deref(), Some("picky"));
        assert_eq!(failed.worker.as_deref(), Some(worker.name()));
    }
}
