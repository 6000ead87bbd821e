//! # Fan-out of published events to registered subscribers.
//!
//! [`EventDistributor`] keeps a copy-on-write registry of subscribers, each
//! backed by its own [`QueueWorker`](crate::QueueWorker).
//!
//! ## Diagram
//! ```text
//!    publish(event)
//!        │   registry snapshot (lock-free load)
//!        ├────────► worker S1.enqueue(clone) ─► [queue S1] ─► handler S1
//!        ├────────► worker S2.enqueue(clone) ─► [queue S2] ─► handler S2
//!        └────────► worker SN.enqueue(clone) ─► [queue SN] ─► handler SN
//!
//!    subscribe / unsubscribe
//!        └─► write lock ─► copy map ─► insert/remove ─► swap snapshot
//! ```

#[allow(clippy::module_inception)]
mod distributor;
mod registry;

pub use distributor::EventDistributor;
