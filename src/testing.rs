//! Test-only handlers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::HandlerError;
use crate::worker::Handler;

/// Records every item it receives, in dispatch order.
pub(crate) struct Recorder<T> {
    name: &'static str,
    items: Mutex<Vec<T>>,
    changed: Notify,
}

impl<T: Clone> Recorder<T> {
    pub(crate) fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            items: Mutex::new(Vec::new()),
            changed: Notify::new(),
        })
    }

    pub(crate) fn items(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    /// Waits until at least `n` items arrived; `false` on timeout.
    pub(crate) async fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let waiting = async {
            loop {
                let notified = self.changed.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.items.lock().len() >= n {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, waiting).await.is_ok()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Handler<T> for Recorder<T> {
    async fn handle(&self, item: &T) -> Result<(), HandlerError> {
        self.items.lock().push(item.clone());
        self.changed.notify_waiters();
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Always returns an error and counts its invocations.
#[derive(Default)]
pub(crate) struct Failing {
    pub(crate) calls: AtomicUsize,
}

#[async_trait]
impl<T: Send + Sync + 'static> Handler<T> for Failing {
    async fn handle(&self, _item: &T) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(HandlerError::fail("always fails"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Always panics.
pub(crate) struct Panicking;

#[async_trait]
impl<T: Send + Sync + 'static> Handler<T> for Panicking {
    async fn handle(&self, _item: &T) -> Result<(), HandlerError> {
        panic!("handler exploded");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}
