//! Memoized derived selectors.
//!
//! # Invariants
//! - The cache holds one entry keyed by the identity of the input `Arc`.
//! - A cached input is held by `Weak`, so its address cannot be reused while
//!   the entry exists.
//! - Projections only read their input.

use std::cell::{Cell, RefCell};
use std::sync::{Arc, Weak};

/// Cache counters, mainly for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorStats {
    pub hits: u64,
    pub misses: u64,
}

struct CacheEntry<S, T> {
    input: Weak<S>,
    output: T,
}

/// Pure projection `fn(&S) -> T` with a single-entry identity cache.
pub struct Selector<S, T> {
    project: fn(&S) -> T,
    cache: RefCell<Option<CacheEntry<S, T>>>,
    stats: Cell<SelectorStats>,
}

impl<S, T: Clone> Selector<S, T> {
    pub fn new(project: fn(&S) -> T) -> Self {
        Self {
            project,
            cache: RefCell::new(None),
            stats: Cell::new(SelectorStats::default()),
        }
    }

    /// Returns the projection of `state`, recomputing only when `state` is a
    /// different reference than the cached one.
    pub fn select(&self, state: &Arc<S>) -> T {
        let cached = self
            .cache
            .borrow()
            .as_ref()
            .filter(|entry| std::ptr::eq(entry.input.as_ptr(), Arc::as_ptr(state)))
            .map(|entry| entry.output.clone());

        let mut stats = self.stats.get();
        if let Some(output) = cached {
            stats.hits += 1;
            self.stats.set(stats);
            return output;
        }

        let output = (self.project)(&**state);
        *self.cache.borrow_mut() = Some(CacheEntry {
            input: Arc::downgrade(state),
            output: output.clone(),
        });
        stats.misses += 1;
        self.stats.set(stats);
        output
    }

    /// Computes without touching the cache.
    pub fn compute(&self, state: &S) -> T {
        (self.project)(state)
    }

    pub fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    pub fn stats(&self) -> SelectorStats {
        self.stats.get()
    }
}

#[cfg(test)]
mod tests {
    use super::Selector;
    use std::sync::Arc;

    fn doubled(values: &Vec<u32>) -> Vec<u32> {
        values.iter().map(|value| value * 2).collect()
    }

    #[test]
    fn same_reference_hits_cache() {
        let selector = Selector::new(doubled);
        let state = Arc::new(vec![1, 2]);
        assert_eq!(selector.select(&state), vec![2, 4]);
        assert_eq!(selector.select(&Arc::clone(&state)), vec![2, 4]);
        assert_eq!(selector.stats().hits, 1);
        assert_eq!(selector.stats().misses, 1);
    }

    #[test]
    fn new_reference_with_equal_content_recomputes() {
        let selector = Selector::new(doubled);
        let first = Arc::new(vec![3]);
        let second = Arc::new(vec![3]);
        assert_eq!(selector.select(&first), selector.select(&second));
        assert_eq!(selector.stats().misses, 2);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let selector = Selector::new(doubled);
        let state = Arc::new(vec![5]);
        selector.select(&state);
        selector.invalidate();
        selector.select(&state);
        assert_eq!(selector.stats().misses, 2);
        assert_eq!(selector.compute(&vec![1]), vec![2]);
    }
}
