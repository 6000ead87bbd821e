//! Worker lifecycle state and counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Lifecycle of a [`QueueWorker`](crate::QueueWorker).
///
/// ```text
/// Created ──► Running ──► Stopping ──► Stopped
/// ```
/// Transitions only move forward; there is no way back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WorkerState {
    /// Constructed; drain loop not yet polled.
    Created = 0,
    /// Drain loop is dispatching.
    Running = 1,
    /// Stop requested; leftovers are being dispatched.
    Stopping = 2,
    /// Drain loop exited.
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => WorkerState::Created,
            1 => WorkerState::Running,
            2 => WorkerState::Stopping,
            _ => WorkerState::Stopped,
        }
    }
}

/// Forward-only atomic [`WorkerState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Created as u8))
    }

    pub(crate) fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `to` unless already at or past it; returns the previous state.
    pub(crate) fn advance(&self, to: WorkerState) -> WorkerState {
        WorkerState::from_u8(self.0.fetch_max(to as u8, Ordering::AcqRel))
    }
}

/// Unique worker identifier, allocated from a process-wide counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(u64);

impl WorkerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time copy of a worker's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Items admitted into the queue.
    pub enqueued: u64,
    /// Items rejected by the filter.
    pub filtered: u64,
    /// Items lost to overflow (evicted, or refused when full).
    pub dropped: u64,
    /// Items whose handlers all ran (successfully or not).
    pub dispatched: u64,
    /// Handler invocations that returned an error or panicked.
    pub faults: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) enqueued: AtomicU64,
    pub(crate) filtered: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) dispatched: AtomicU64,
    pub(crate) faults: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_only_moves_forward() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), WorkerState::Created);
        assert_eq!(cell.advance(WorkerState::Stopping), WorkerState::Created);
        assert_eq!(cell.advance(WorkerState::Running), WorkerState::Stopping);
        assert_eq!(cell.get(), WorkerState::Stopping);
        cell.advance(WorkerState::Stopped);
        cell.advance(WorkerState::Running);
        assert_eq!(cell.get(), WorkerState::Stopped);
    }

    #[test]
    fn test_worker_ids_are_unique() {
        let a = WorkerId::next();
        let b = WorkerId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }
}
