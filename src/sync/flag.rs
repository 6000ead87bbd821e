//! # AtomicFlag: lock-free lifecycle boolean.
//!
//! Used wherever a flag governs whether a loop keeps running or whether an
//! object still accepts input. Readers never observe a torn value.

use std::sync::atomic::{AtomicBool, Ordering};

/// Lock-free boolean for lifecycle signaling.
///
/// ### Rules
/// - `get` uses `Acquire`, writes use `Release` (or `AcqRel` for CAS).
/// - [`set`](Self::set) skips the store when the value already matches.
#[derive(Debug, Default)]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    /// Creates a flag with the given initial value.
    pub const fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    /// Stores `value` unless the flag already holds it.
    #[inline]
    pub fn set(&self, value: bool) {
        if self.value.load(Ordering::Relaxed) != value {
            self.value.store(value, Ordering::Release);
        }
    }

    /// Sets the flag to `desired` iff it currently equals `expected`.
    ///
    /// Returns the value observed **before** the attempt, so the swap
    /// succeeded exactly when the return value equals `expected`.
    ///
    /// # Example
    /// ```
    /// use fanqueue::AtomicFlag;
    ///
    /// let running = AtomicFlag::new(true);
    /// assert!(running.compare_and_swap(true, false));
    /// assert!(!running.compare_and_swap(true, false));
    /// assert!(!running.get());
    /// ```
    #[inline]
    pub fn compare_and_swap(&self, expected: bool, desired: bool) -> bool {
        match self
            .value
            .compare_exchange(expected, desired, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(prev) | Err(prev) => prev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_and_get() {
        let flag = AtomicFlag::new(false);
        assert!(!flag.get());
        flag.set(true);
        assert!(flag.get());
        flag.set(true);
        assert!(flag.get());
        flag.set(false);
        assert!(!flag.get());
    }

    #[test]
    fn test_cas_returns_previous_value() {
        let flag = AtomicFlag::new(false);
        assert!(!flag.compare_and_swap(true, false), "mismatch leaves value");
        assert!(!flag.get());
        assert!(!flag.compare_and_swap(false, true));
        assert!(flag.get());
    }

    #[test]
    fn test_cas_single_winner_across_threads() {
        let flag = Arc::new(AtomicFlag::new(true));
        let winners: usize = (0..8)
            .map(|_| {
                let f = Arc::clone(&flag);
                thread::spawn(move || f.compare_and_swap(true, false))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(winners, 1);
        assert!(!flag.get());
    }
}
