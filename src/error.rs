//! Error types used by queues, workers and handlers.
//!
//! This module defines two main error enums:
//!
//! - [`ConfigError`] misuse detected while constructing a queue, worker or distributor.
//! - [`HandlerError`] errors raised by subscriber handlers during dispatch.
//!
//! Only [`ConfigError`] ever reaches a caller. [`HandlerError`]s are caught at the
//! dispatch boundary, reported as diagnostic events and swallowed.
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::any::Any;

use thiserror::Error;

/// # Invalid construction parameters.
///
/// Returned synchronously by constructors; this is the only error class the
/// engine propagates to callers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A bounded queue was requested with zero capacity.
    #[error("queue capacity must be at least 1 (use None for unbounded)")]
    ZeroCapacity,

    /// A worker was requested with zero parallelism.
    #[error("max parallelism must be at least 1")]
    ZeroParallelism,

    /// A worker was requested with a zero poll interval.
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fanqueue::ConfigError;
    ///
    /// assert_eq!(ConfigError::ZeroCapacity.as_label(), "config_zero_capacity");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroCapacity => "config_zero_capacity",
            ConfigError::ZeroParallelism => "config_zero_parallelism",
            ConfigError::ZeroPollInterval => "config_zero_poll_interval",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced by subscriber handlers.
///
/// A handler returning an error never stops its worker; the fault is reported
/// as [`EventKind::HandlerFailed`](crate::EventKind::HandlerFailed) and the next
/// item is dispatched as usual.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Handler failed to process the item.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler failed with an underlying error value.
    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    ///
    /// # Example
    /// ```
    /// use fanqueue::HandlerError;
    ///
    /// let err = HandlerError::fail("boom");
    /// assert_eq!(err.as_message(), "error: boom");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Source(_) => "handler_source_error",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Source(err) => format!("error: {err}"),
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
