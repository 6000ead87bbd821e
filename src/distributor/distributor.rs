//! # EventDistributor: dynamic subscriber registry with per-subscriber queues.
//!
//! ## What it guarantees
//! - `publish()` never blocks, never takes a lock and never fails; it iterates
//!   an immutable snapshot of the registry.
//! - Per-subscriber FIFO (queue order), subject to each subscriber's overflow policy.
//! - A fault while handing an event to one worker (e.g. a panicking filter)
//!   is reported and does not affect the other workers.
//! - At most one worker per handler identity.
//!
//! ## What it does **not** guarantee
//! - No ordering across different subscribers.
//! - A subscriber registered concurrently with a `publish()` may or may not
//!   receive that event.
//!
//! ## Example
//! ```rust
//! use fanqueue::{EventDistributor, HandlerError, HandlerFn, HandlerRef, SubscribeOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), fanqueue::ConfigError> {
//! let dist = EventDistributor::<u32>::default();
//!
//! let evens: HandlerRef<u32> = HandlerFn::arc("evens", |n: u32| async move {
//!     println!("even {n}");
//!     Ok::<_, HandlerError>(())
//! });
//! dist.subscribe(evens.clone(), SubscribeOptions::new().with_filter(|n: &u32| n % 2 == 0))?;
//!
//! for n in 1..=4 {
//!     dist.publish(n);
//! }
//! dist.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::broadcast;

use super::registry::{Registry, Subscription};
use crate::config::DistributorConfig;
use crate::error::{panic_message, ConfigError};
use crate::events::{Bus, Event, EventKind};
use crate::worker::{HandlerKey, HandlerRef, QueueWorker, SubscribeOptions};

/// Fans out published events to every registered subscriber's worker.
pub struct EventDistributor<T> {
    cfg: DistributorConfig,
    registry: Registry<T>,
    bus: Bus,
}

impl<T> EventDistributor<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a distributor, failing fast on an invalid configuration.
    pub fn new(cfg: DistributorConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::new_unchecked(cfg))
    }

    fn new_unchecked(cfg: DistributorConfig) -> Self {
        let bus = Bus::new(cfg.diagnostics_capacity_clamped());
        Self {
            cfg,
            registry: Registry::new(),
            bus,
        }
    }

    /// Unregisters `handler` and stops its worker.
    ///
    /// The worker is stopped after the registry lock is released, so a slow
    /// drain never blocks other registrations. Returns `false` if `handler`
    /// was not registered.
    pub fn unsubscribe(&self, handler: &HandlerRef<T>) -> bool {
        let Some(sub) = self.registry.remove(HandlerKey::of(handler)) else {
            return false;
        };
        sub.worker.stop();
        self.bus.publish(
            Event::new(EventKind::SubscriberRemoved)
                .with_worker(sub.worker.name())
                .with_handler(sub.handler.name()),
        );
        true
    }

    /// The worker serving `handler`, if registered.
    ///
    /// Use it to [`set_filter`](QueueWorker::set_filter) or
    /// [`register_handler`](QueueWorker::register_handler) after subscribing.
    pub fn worker(&self, handler: &HandlerRef<T>) -> Option<Arc<QueueWorker<T>>> {
        self.registry
            .load()
            .get(&HandlerKey::of(handler))
            .map(|sub| Arc::clone(&sub.worker))
    }

    /// Workers of the current snapshot (in no particular order).
    pub fn workers(&self) -> Vec<Arc<QueueWorker<T>>> {
        self.registry
            .load()
            .values()
            .map(|sub| Arc::clone(&sub.worker))
            .collect()
    }

    /// True if `handler` is registered.
    pub fn contains(&self, handler: &HandlerRef<T>) -> bool {
        self.registry.load().contains_key(&HandlerKey::of(handler))
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.registry.load().len()
    }

    /// True if there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.registry.load().is_empty()
    }

    /// Receiver for diagnostic events (faults, drops, lifecycle) of this
    /// distributor and all its workers.
    pub fn diagnostics(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Active configuration.
    pub fn config(&self) -> &DistributorConfig {
        &self.cfg
    }

    /// Unregisters every subscriber, stops all workers and waits for their
    /// drain loops to dispatch leftovers and exit.
    pub async fn shutdown(&self) {
        let drained = self.registry.take_all();
        for sub in drained.values() {
            sub.worker.stop();
            self.bus.publish(
                Event::new(EventKind::SubscriberRemoved)
                    .with_worker(sub.worker.name())
                    .with_handler(sub.handler.name()),
            );
        }
        for sub in drained.values() {
            sub.worker.join().await;
        }
    }
}

impl<T> EventDistributor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Registers `handler` with its own worker configured from `options`.
    ///
    /// Returns `Ok(true)` when newly registered and `Ok(false)` when `handler`
    /// (by identity) already is, in which case `options` are ignored. Invalid
    /// options fail fast with [`ConfigError`]. Must be called within a Tokio runtime.
    pub fn subscribe(
        &self,
        handler: HandlerRef<T>,
        options: SubscribeOptions<T>,
    ) -> Result<bool, ConfigError> {
        let options = match options.poll_interval {
            Some(_) => options,
            None => options.with_poll_interval(self.cfg.poll_interval),
        };

        let added = self.registry.insert_with(HandlerKey::of(&handler), || {
            let worker = QueueWorker::spawn(Arc::clone(&handler), options, self.bus.clone())?;
            Ok::<_, ConfigError>(Subscription {
                handler: Arc::clone(&handler),
                worker: Arc::new(worker),
            })
        })?;

        match added {
            Some(worker) => {
                self.bus.publish(
                    Event::new(EventKind::SubscriberAdded)
                        .with_worker(worker.name())
                        .with_handler(handler.name()),
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Enqueues a clone of `event` into every currently registered worker.
    ///
    /// Returns how many workers accepted it (filtered-out, stopped or full
    /// workers do not count). Never fails and never panics.
    pub fn publish(&self, event: T) -> usize {
        let snapshot = self.registry.load();
        let mut accepted = 0;

        for sub in snapshot.values() {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| sub.worker.enqueue(event.clone())));
            match outcome {
                Ok(true) => accepted += 1,
                Ok(false) => {}
                Err(panic_err) => {
                    self.bus.publish(
                        Event::new(EventKind::PublishFault)
                            .with_worker(sub.worker.name())
                            .with_reason(panic_message(&*panic_err)),
                    );
                }
            }
        }
        accepted
    }
}

impl<T> Default for EventDistributor<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new_unchecked(DistributorConfig::default())
    }
}
