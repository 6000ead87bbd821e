//! # fanqueue
//!
//! **Fanqueue** is a lightweight in-process publish/subscribe engine for Rust.
//!
//! Publishers hand events to an [`EventDistributor`], which fans a clone of
//! each event out to every registered subscriber. Every subscriber owns a
//! bounded queue and a dedicated drain task, so a slow or faulty subscriber
//! never blocks the publisher or its peers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     publisher          publisher          publisher
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventDistributor                                                 │
//! │  - Registry (copy-on-write map: handler identity → worker)        │
//! │  - Bus (broadcast diagnostics)                                    │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        │ enqueue(clone)   │ enqueue(clone)   │ enqueue(clone)│
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │ QueueWorker  │   │ QueueWorker  │   │ QueueWorker  │   │
//!     │  filter      │   │  filter      │   │  filter      │   │
//!     │  [queue]     │   │  [queue]     │   │  [queue]     │   │
//!     │  drain loop  │   │  drain loop  │   │  drain loop  │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ handler.handle() │                  │                 │
//!      │ Publishes        │ Publishes        │ Publishes       │
//!      │ Events:          │ Events:          │ Events:         │
//!      │ - HandlerFailed  │ - ItemDropped    │ - WorkerStopped │
//!      │ - ...            │ - ...            │ - ...           │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │          (capacity: DistributorConfig::diagnostics_capacity)      │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       tracing + diagnostics() receivers
//! ```
//!
//! ### Worker lifecycle
//! ```text
//! Created ──► Running ──► Stopping ──► Stopped
//!
//! loop {
//!   ├─► batch = queue.drain_all_available(poll_interval)
//!   │       ├─ empty, queue open   ─► continue
//!   │       ├─ empty, queue closed ─► exit
//!   │       └─ items ─► dispatch (sequential or bounded-parallel)
//!   │                   └─ per item, per handler:
//!   │                        ├─ Ok    ─► next
//!   │                        ├─ Err   ─► publish HandlerFailed
//!   │                        └─ panic ─► publish HandlerPanicked
//!   └─ stop(): close queue; leftovers are dispatched before exit
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                              |
//! |-------------------|-------------------------------------------------------------|-------------------------------------------------|
//! | **Distribution**  | Dynamic subscriber registry with lock-free publish.         | [`EventDistributor`]                            |
//! | **Workers**       | Per-subscriber queue, filter and drain loop.                | [`QueueWorker`], [`SubscribeOptions`], [`Filter`] |
//! | **Handlers**      | Async callbacks as trait objects or closures.               | [`Handler`], [`HandlerRef`], [`HandlerFn`]      |
//! | **Queues**        | Bounded FIFO with overflow policies and batch dequeue.      | [`BoundedAsyncQueue`], [`OverflowPolicy`]       |
//! | **Primitives**    | Atomic boolean with compare-and-swap.                       | [`AtomicFlag`]                                  |
//! | **Diagnostics**   | Faults, drops and lifecycle as broadcast events.            | [`Event`], [`EventKind`], [`Bus`]               |
//! | **Errors**        | Construction errors and handler errors.                     | [`ConfigError`], [`HandlerError`]               |
//! | **Configuration** | Distributor-wide defaults.                                  | [`DistributorConfig`]                           |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use fanqueue::{
//!     DistributorConfig, EventDistributor, HandlerError, HandlerFn, HandlerRef, SubscribeOptions,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = DistributorConfig::default();
//!     cfg.poll_interval = Duration::from_millis(500);
//!     let dist = EventDistributor::<String>::new(cfg)?;
//!
//!     let audit: HandlerRef<String> = HandlerFn::arc("audit", |line: String| async move {
//!         println!("audit: {line}");
//!         Ok::<_, HandlerError>(())
//!     });
//!     let opts = SubscribeOptions::new()
//!         .with_capacity(64)
//!         .with_filter(|line: &String| !line.is_empty());
//!     dist.subscribe(audit.clone(), opts)?;
//!
//!     dist.publish("user logged in".to_string());
//!     dist.publish(String::new()); // filtered out
//!
//!     dist.shutdown().await;
//!     Ok(())
//! }
//! ```
mod config;
mod distributor;
mod error;
mod events;
mod queue;
mod sync;
mod worker;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use config::{DistributorConfig, DEFAULT_POLL_INTERVAL};
pub use distributor::EventDistributor;
pub use error::{ConfigError, HandlerError};
pub use events::{Bus, Event, EventKind};
pub use queue::{BoundedAsyncQueue, Offer, OverflowPolicy, QueueConfig};
pub use sync::AtomicFlag;
pub use worker::{
    Filter, Handler, HandlerFn, HandlerRef, QueueWorker, SubscribeOptions, WorkerId, WorkerState,
    WorkerStats,
};
