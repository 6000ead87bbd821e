//! # Bounded asynchronous hand-off between producers and one consumer.
//!
//! ## Contents
//! - [`BoundedAsyncQueue`] FIFO buffer with point and batch dequeue
//! - [`QueueConfig`], [`OverflowPolicy`] construction parameters
//! - [`Offer`] detailed outcome of a non-blocking enqueue
//!
//! ## Diagram
//! ```text
//! producer ─┐                        ┌─────────────────────────┐
//! producer ─┼── try_enqueue/offer ──►│ VecDeque (cap, policy)  │── drain_all_available ──► consumer
//! producer ─┘   enqueue_async        └─────────────────────────┘   dequeue_async
//!                                           │ close()
//!                                           ▼
//!                                 no more writes, readers released
//! ```

mod bounded;
mod policy;

pub use bounded::BoundedAsyncQueue;
pub use policy::{Offer, OverflowPolicy, QueueConfig};
