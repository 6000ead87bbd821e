//! # Handler contract
//!
//! `Handler` is the extension point for plugging subscriber logic into a
//! [`QueueWorker`](crate::QueueWorker). Each handler is driven by the worker's
//! drain loop and never by the publisher.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching, retries); they do **not** block
//!   the publisher nor other subscribers.
//! - Returning an error or panicking is reported as a diagnostic event and
//!   otherwise ignored; the next item is dispatched as usual.
//! - The identity of a subscriber is the `Arc` allocation of its handler, not
//!   its value: two equal handlers in different `Arc`s are two subscribers.
//!
//! ## Example
//! ```rust
//! use fanqueue::{Handler, HandlerError};
//! use async_trait::async_trait;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Handler<String> for Audit {
//!     async fn handle(&self, line: &String) -> Result<(), HandlerError> {
//!         if line.is_empty() {
//!             return Err(HandlerError::fail("empty audit line"));
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "audit" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;

/// Shared handle to a handler; its allocation is the subscriber identity.
pub type HandlerRef<T> = Arc<dyn Handler<T>>;

/// Contract for item handlers.
///
/// Called from a worker-dedicated task. Implementations should avoid blocking
/// the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Handler<T>: Send + Sync + 'static {
    /// Handle a single item.
    ///
    /// # Parameters
    /// - `item`: Reference to the item (does not transfer ownership)
    async fn handle(&self, item: &T) -> Result<(), HandlerError>;

    /// Human-readable name (for logs/diagnostics).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Identity of a handler allocation, used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HandlerKey(usize);

impl HandlerKey {
    pub(crate) fn of<T>(handler: &HandlerRef<T>) -> Self {
        Self(Arc::as_ptr(handler) as *const () as usize)
    }
}
