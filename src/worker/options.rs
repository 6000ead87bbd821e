//! # Per-subscriber options.
//!
//! [`SubscribeOptions`] is the configuration surface recognized at subscribe
//! time (and by [`QueueWorker::spawn`](crate::QueueWorker::spawn)).
//!
//! | Option            | Default        | Constraint          |
//! |-------------------|----------------|---------------------|
//! | `max_parallelism` | `1`            | `>= 1`              |
//! | `filter`          | accept-all     |                     |
//! | `capacity`        | unbounded      | `>= 1` when bounded |
//! | `overflow`        | drop-oldest    |                     |
//! | `poll_interval`   | distributor's  | `> 0`               |

use std::borrow::Cow;
use std::time::Duration;

use crate::error::ConfigError;
use crate::queue::{OverflowPolicy, QueueConfig};
use crate::worker::filter::Filter;

/// Options for one subscriber's worker.
///
/// # Example
/// ```
/// use fanqueue::{OverflowPolicy, SubscribeOptions};
///
/// let opts = SubscribeOptions::<u32>::new()
///     .with_name("evens")
///     .with_filter(|n| n % 2 == 0)
///     .with_capacity(128)
///     .with_overflow(OverflowPolicy::DropOldest)
///     .with_max_parallelism(4);
/// assert_eq!(opts.max_parallelism(), 4);
/// ```
#[derive(Debug)]
pub struct SubscribeOptions<T> {
    pub(crate) name: Option<Cow<'static, str>>,
    pub(crate) filter: Filter<T>,
    pub(crate) capacity: Option<usize>,
    pub(crate) overflow: OverflowPolicy,
    pub(crate) max_parallelism: usize,
    pub(crate) poll_interval: Option<Duration>,
}

impl<T> SubscribeOptions<T> {
    /// Options with every default applied.
    pub fn new() -> Self {
        Self {
            name: None,
            filter: Filter::accept_all(),
            capacity: None,
            overflow: OverflowPolicy::default(),
            max_parallelism: 1,
            poll_interval: None,
        }
    }

    /// Names the worker (defaults to the handler's name).
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Only items matching `predicate` are enqueued.
    pub fn with_filter(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Filter::new(predicate);
        self
    }

    /// Bounds the queue to `capacity` items.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Overflow policy applied when the bounded queue is full.
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Dispatches up to `n` items of a batch concurrently (`1` = sequential).
    pub fn with_max_parallelism(mut self, n: usize) -> Self {
        self.max_parallelism = n;
        self
    }

    /// How long one drain-loop iteration waits for items.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Configured parallelism bound.
    #[inline]
    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    /// Fails fast on options no worker can honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        if self.poll_interval.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroPollInterval);
        }
        self.queue_config().validate()
    }

    pub(crate) fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            capacity: self.capacity,
            overflow: self.overflow,
            single_reader: true,
        }
    }
}

impl<T> Default for SubscribeOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SubscribeOptions::<u8>::default();
        assert_eq!(opts.max_parallelism(), 1);
        assert!(opts.filter.is_accept_all());
        assert_eq!(opts.capacity, None);
        assert_eq!(opts.overflow, OverflowPolicy::DropOldest);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_invalid_bounds_fail_fast() {
        let zero_par = SubscribeOptions::<u8>::new().with_max_parallelism(0);
        assert_eq!(zero_par.validate(), Err(ConfigError::ZeroParallelism));

        let zero_cap = SubscribeOptions::<u8>::new().with_capacity(0);
        assert_eq!(zero_cap.validate(), Err(ConfigError::ZeroCapacity));

        let zero_poll = SubscribeOptions::<u8>::new().with_poll_interval(Duration::ZERO);
        assert_eq!(zero_poll.validate(), Err(ConfigError::ZeroPollInterval));
    }
}
