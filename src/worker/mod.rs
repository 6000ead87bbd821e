//! # Per-subscriber workers.
//!
//! A [`QueueWorker`] owns one bounded queue and one drain task and dispatches
//! each item to its [`Handler`]s.
//!
//! ## Contents
//! - [`QueueWorker`] queue + drain loop, with [`WorkerState`] and [`WorkerStats`]
//! - [`Handler`], [`HandlerRef`], [`HandlerFn`] subscriber callbacks
//! - [`Filter`], [`SubscribeOptions`] per-subscriber configuration

mod filter;
mod handler;
mod handler_fn;
mod options;
mod state;
#[allow(clippy::module_inception)]
mod worker;

pub(crate) use handler::HandlerKey;

pub use filter::Filter;
pub use handler::{Handler, HandlerRef};
pub use handler_fn::HandlerFn;
pub use options::SubscribeOptions;
pub use state::{WorkerId, WorkerState, WorkerStats};
pub use worker::QueueWorker;
