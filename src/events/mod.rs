//! Diagnostic events: types and broadcast bus.
//!
//! Queue workers and the distributor report every observable side effect
//! (handler faults, dropped items, lifecycle transitions) as an [`Event`] on a
//! [`Bus`]. Each published event is also logged through `tracing`.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `QueueWorker` (lifecycle, faults, drops), `EventDistributor`
//!   (registration, publish faults).
//! - **Consumers**: anything holding a receiver from [`Bus::subscribe`] or
//!   [`EventDistributor::diagnostics`](crate::EventDistributor::diagnostics).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
