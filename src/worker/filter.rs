//! Per-worker item filter.

/// Predicate deciding whether an item enters a worker's queue.
///
/// Evaluated on the producer side before any capacity accounting, so rejected
/// items never occupy buffer space.
pub struct Filter<T> {
    predicate: Option<Box<dyn Fn(&T) -> bool + Send + Sync>>,
}

impl<T> Filter<T> {
    /// Filter that accepts every item.
    pub fn accept_all() -> Self {
        Self { predicate: None }
    }

    /// Filter backed by a predicate.
    ///
    /// # Example
    /// ```
    /// use fanqueue::Filter;
    ///
    /// let even = Filter::new(|n: &u32| n % 2 == 0);
    /// assert!(even.matches(&4));
    /// assert!(!even.matches(&3));
    /// ```
    pub fn new(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Box::new(predicate)),
        }
    }

    /// True if the item should be enqueued.
    #[inline]
    pub fn matches(&self, item: &T) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(item))
    }

    /// True for [`Filter::accept_all`].
    #[inline]
    pub fn is_accept_all(&self) -> bool {
        self.predicate.is_none()
    }
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl<T> std::fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_accept_all() {
            f.write_str("Filter(accept_all)")
        } else {
            f.write_str("Filter(predicate)")
        }
    }
}
