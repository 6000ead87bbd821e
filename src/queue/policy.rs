//! Queue construction parameters and enqueue outcomes.

use crate::error::ConfigError;

/// What a bounded queue does when an item arrives while it is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the oldest buffered item to admit the new one. Producers are never rejected.
    #[default]
    DropOldest,
    /// Evict the most recently buffered item to admit the new one.
    DropNewest,
    /// Refuse the new item; the producer sees a rejection.
    Reject,
    /// Refuse non-blocking writes; `enqueue_async` suspends until space frees.
    Wait,
}

impl OverflowPolicy {
    /// True if a full queue still admits new items by evicting an old one.
    #[inline]
    pub fn evicts(self) -> bool {
        matches!(self, OverflowPolicy::DropOldest | OverflowPolicy::DropNewest)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            OverflowPolicy::DropOldest => "drop_oldest",
            OverflowPolicy::DropNewest => "drop_newest",
            OverflowPolicy::Reject => "reject",
            OverflowPolicy::Wait => "wait",
        }
    }
}

/// Configuration of a [`BoundedAsyncQueue`](super::BoundedAsyncQueue).
///
/// ## Field semantics
/// - `capacity`: maximum buffered items (`None` = unbounded, `Some(0)` is rejected)
/// - `overflow`: behavior when full (ignored while unbounded)
/// - `single_reader`: hint that only one task ever waits to read; enables
///   single-waiter wakeups on the read side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of buffered items.
    pub capacity: Option<usize>,
    /// Policy applied when `capacity` is reached.
    pub overflow: OverflowPolicy,
    /// At most one concurrent reader.
    pub single_reader: bool,
}

impl QueueConfig {
    /// Unbounded single-reader queue.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bounded single-reader queue with drop-oldest overflow.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Replaces the overflow policy.
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Replaces the single-reader hint.
    pub fn with_single_reader(mut self, single_reader: bool) -> Self {
        self.single_reader = single_reader;
        self
    }

    /// Fails fast on parameters no queue can honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.capacity {
            Some(0) => Err(ConfigError::ZeroCapacity),
            _ => Ok(()),
        }
    }
}

impl Default for QueueConfig {
    /// Default configuration:
    ///
    /// - `capacity = None` (unbounded)
    /// - `overflow = DropOldest`
    /// - `single_reader = true`
    fn default() -> Self {
        Self {
            capacity: None,
            overflow: OverflowPolicy::DropOldest,
            single_reader: true,
        }
    }
}

/// Outcome of [`BoundedAsyncQueue::offer`](super::BoundedAsyncQueue::offer).
#[derive(Debug, PartialEq, Eq)]
pub enum Offer<T> {
    /// Item buffered; nothing was evicted.
    Accepted,
    /// Item buffered; the returned item was evicted to make room.
    Evicted(T),
    /// Queue is full and its policy refuses the item; it is handed back.
    Full(T),
    /// Queue is closed; the item is handed back.
    Closed(T),
}

impl<T> Offer<T> {
    /// True if the offered item is now buffered.
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Offer::Accepted | Offer::Evicted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert_eq!(
            QueueConfig::bounded(0).validate(),
            Err(ConfigError::ZeroCapacity)
        );
        assert!(QueueConfig::bounded(1).validate().is_ok());
        assert!(QueueConfig::unbounded().validate().is_ok());
    }

    #[test]
    fn test_only_drop_policies_evict() {
        assert!(OverflowPolicy::DropOldest.evicts());
        assert!(OverflowPolicy::DropNewest.evicts());
        assert!(!OverflowPolicy::Reject.evicts());
        assert!(!OverflowPolicy::Wait.evicts());
    }
}
