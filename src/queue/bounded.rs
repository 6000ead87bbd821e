//! # BoundedAsyncQueue: bounded FIFO with async waits and a closed state.
//!
//! An explicit `VecDeque` guarded by a `parking_lot::Mutex`, with two
//! [`Notify`] handles: `readable` (items arrived or queue closed) and
//! `writable` (space freed or queue closed).
//!
//! ## Rules
//! - **FIFO**: items leave in the order they were buffered, except for items
//!   evicted by the overflow policy.
//! - **Closed is one-way**: once [`close`](BoundedAsyncQueue::close) ran, no item
//!   is ever added; buffered items can still be drained.
//! - **Single consumer**: `dequeue_async` / `drain_all_available` assume one
//!   logical reader. Many concurrent producers are fine.
//! - **Timeouts are not errors**: every wait returns `false`/`None`/empty on timeout.
//!
//! ## Waiting
//! Waiters register on the relevant [`Notify`] *before* inspecting the buffer,
//! so a wakeup issued between the check and the `.await` is never lost.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::time::{self, Instant};

use super::policy::{Offer, OverflowPolicy, QueueConfig};
use crate::error::ConfigError;
use crate::sync::AtomicFlag;

/// Capacity-bounded asynchronous queue with a configurable overflow policy.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use fanqueue::{BoundedAsyncQueue, QueueConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), fanqueue::ConfigError> {
/// let queue = BoundedAsyncQueue::new(QueueConfig::bounded(3))?;
/// for i in 1..=5 {
///     assert!(queue.try_enqueue(i));
/// }
/// assert_eq!(queue.drain_all_available(Duration::ZERO).await, vec![3, 4, 5]);
/// # Ok(())
/// # }
/// ```
pub struct BoundedAsyncQueue<T> {
    config: QueueConfig,
    items: Mutex<VecDeque<T>>,
    closed: AtomicFlag,
    readable: Notify,
    writable: Notify,
    evicted: AtomicU64,
}

impl<T> BoundedAsyncQueue<T> {
    /// Creates a queue, failing fast on an invalid configuration.
    pub fn new(config: QueueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let items = match config.capacity {
            Some(cap) => VecDeque::with_capacity(cap.min(1024)),
            None => VecDeque::new(),
        };
        Ok(Self {
            config,
            items: Mutex::new(items),
            closed: AtomicFlag::new(false),
            readable: Notify::new(),
            writable: Notify::new(),
            evicted: AtomicU64::new(0),
        })
    }

    /// Creates an unbounded single-reader queue.
    pub fn unbounded() -> Self {
        Self {
            config: QueueConfig::unbounded(),
            items: Mutex::new(VecDeque::new()),
            closed: AtomicFlag::new(false),
            readable: Notify::new(),
            writable: Notify::new(),
            evicted: AtomicU64::new(0),
        }
    }

    /// Offers an item without waiting and reports exactly what happened.
    ///
    /// - `Accepted` / `Evicted(old)`: item buffered (the latter under a drop policy)
    /// - `Full(item)`: queue full under [`OverflowPolicy::Reject`] / [`OverflowPolicy::Wait`]
    /// - `Closed(item)`: queue closed
    pub fn offer(&self, item: T) -> Offer<T> {
        let mut items = self.items.lock();
        // Checked under the lock: `close` flips the flag under the same lock.
        if self.closed.get() {
            return Offer::Closed(item);
        }

        let outcome = match self.config.capacity {
            Some(cap) if items.len() >= cap => {
                if !self.config.overflow.evicts() {
                    return Offer::Full(item);
                }
                let victim = match self.config.overflow {
                    OverflowPolicy::DropOldest => items.pop_front(),
                    _ => items.pop_back(),
                };
                items.push_back(item);
                match victim {
                    Some(old) => Offer::Evicted(old),
                    None => Offer::Accepted,
                }
            }
            _ => {
                items.push_back(item);
                Offer::Accepted
            }
        };
        drop(items);

        if matches!(outcome, Offer::Evicted(_)) {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        self.wake_readers();
        outcome
    }

    /// Non-blocking enqueue.
    ///
    /// Returns `false` if the queue is closed, or if it is full under a policy
    /// that refuses items. Under [`OverflowPolicy::DropOldest`] it only fails
    /// when closed.
    #[inline]
    pub fn try_enqueue(&self, item: T) -> bool {
        self.offer(item).is_accepted()
    }

    /// Enqueues, suspending while the queue is full under [`OverflowPolicy::Wait`].
    ///
    /// Returns `false` on timeout, on a closed queue, or when full under
    /// [`OverflowPolicy::Reject`]. Other policies never suspend.
    pub async fn enqueue_async(&self, item: T, timeout: Duration) -> bool {
        let deadline = deadline_after(timeout);
        let mut item = item;
        loop {
            let notified = self.writable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.offer(item) {
                Offer::Accepted | Offer::Evicted(_) => return true,
                Offer::Closed(_) => return false,
                Offer::Full(back) => {
                    if self.config.overflow != OverflowPolicy::Wait {
                        return false;
                    }
                    item = back;
                }
            }

            if !wait_until(notified, deadline).await {
                return false;
            }
        }
    }

    /// Waits for one item.
    ///
    /// Returns `None` if `timeout` elapses, or if the queue is closed and empty.
    pub async fn dequeue_async(&self, timeout: Duration) -> Option<T> {
        let deadline = deadline_after(timeout);
        loop {
            let notified = self.readable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut items = self.items.lock();
                if let Some(item) = items.pop_front() {
                    drop(items);
                    self.writable.notify_waiters();
                    return Some(item);
                }
                if self.closed.get() {
                    return None;
                }
            }

            if !wait_until(notified, deadline).await {
                return None;
            }
        }
    }

    /// Waits up to `timeout` for at least one item, then takes everything buffered.
    ///
    /// The batch preserves queue order. Returns an empty batch on timeout or
    /// when the queue is closed and empty; a closed queue with leftovers hands
    /// them out immediately.
    pub async fn drain_all_available(&self, timeout: Duration) -> Vec<T> {
        let Some(first) = self.dequeue_async(timeout).await else {
            return Vec::new();
        };

        let batch = {
            let mut items = self.items.lock();
            let mut batch = Vec::with_capacity(items.len() + 1);
            batch.push(first);
            batch.extend(items.drain(..));
            batch
        };
        self.writable.notify_waiters();
        batch
    }

    /// Closes the queue: no further writes, pending waiters are released.
    ///
    /// Idempotent. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        {
            let _items = self.items.lock();
            if self.closed.compare_and_swap(false, true) {
                return false;
            }
        }
        self.readable.notify_waiters();
        self.writable.notify_waiters();
        true
    }

    /// True once [`close`](Self::close) has run.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// True if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Configured capacity (`None` = unbounded).
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.config.capacity
    }

    /// Configured overflow policy.
    #[inline]
    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.config.overflow
    }

    /// Total items evicted by the overflow policy so far.
    #[inline]
    pub fn evicted_count(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn wake_readers(&self) {
        if self.config.single_reader {
            self.readable.notify_one();
        } else {
            self.readable.notify_waiters();
        }
    }
}

impl<T> std::fmt::Debug for BoundedAsyncQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedAsyncQueue")
            .field("config", &self.config)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .field("evicted", &self.evicted_count())
            .finish()
    }
}

/// `None` means "wait forever" (timeout too large to represent).
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Waits for a registered notification; `false` if the deadline passed first.
async fn wait_until(notified: Pin<&mut Notified<'_>>, deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) => time::timeout_at(deadline, notified).await.is_ok(),
        None => {
            notified.await;
            true
        }
    }
}
