//! Copy-on-write subscriber registry.
//!
//! Readers `load` an immutable snapshot without locking. Writers serialize on
//! a mutex, build a new map from the current one and swap it in whole, so a
//! snapshot never changes while someone iterates it.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use parking_lot::Mutex;

use crate::worker::{HandlerKey, HandlerRef, QueueWorker};

/// One registered subscriber.
pub(super) struct Subscription<T> {
    /// Keeps the handler allocation (and so its identity) alive while registered.
    pub(super) handler: HandlerRef<T>,
    pub(super) worker: Arc<QueueWorker<T>>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            worker: Arc::clone(&self.worker),
        }
    }
}

pub(super) type Snapshot<T> = HashMap<HandlerKey, Subscription<T>>;

pub(super) struct Registry<T> {
    current: ArcSwap<Snapshot<T>>,
    writers: Mutex<()>,
}

impl<T> Registry<T> {
    pub(super) fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(HashMap::new()),
            writers: Mutex::new(()),
        }
    }

    /// Lock-free read of the current snapshot.
    pub(super) fn load(&self) -> Guard<Arc<Snapshot<T>>> {
        self.current.load()
    }

    /// Inserts the subscription built by `make` unless `key` is already present.
    ///
    /// `make` runs under the writer lock; returns `Ok(None)` when already registered.
    pub(super) fn insert_with<E>(
        &self,
        key: HandlerKey,
        make: impl FnOnce() -> Result<Subscription<T>, E>,
    ) -> Result<Option<Arc<QueueWorker<T>>>, E> {
        let _writers = self.writers.lock();
        let current = self.current.load_full();
        if current.contains_key(&key) {
            return Ok(None);
        }

        let sub = make()?;
        let worker = Arc::clone(&sub.worker);
        let mut next = Snapshot::clone(&current);
        next.insert(key, sub);
        self.current.store(Arc::new(next));
        Ok(Some(worker))
    }

    /// Removes `key`, returning its subscription.
    pub(super) fn remove(&self, key: HandlerKey) -> Option<Subscription<T>> {
        let _writers = self.writers.lock();
        let current = self.current.load_full();
        if !current.contains_key(&key) {
            return None;
        }

        let mut next = Snapshot::clone(&current);
        let removed = next.remove(&key);
        self.current.store(Arc::new(next));
        removed
    }

    /// Swaps in an empty snapshot, returning everything that was registered.
    pub(super) fn take_all(&self) -> Arc<Snapshot<T>> {
        let _writers = self.writers.lock();
        self.current.swap(Arc::new(HashMap::new()))
    }
}
