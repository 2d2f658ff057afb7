//! Atomic counter and reference count primitives
//!
//! Both are lock-free: every read and write is a single hardware atomic
//! operation on an `AtomicI32`.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// An integer accessed only through atomic read and set
#[derive(Default)]
pub struct AtomicCounter {
    counter: AtomicI32,
}

impl AtomicCounter {
    pub const fn new(value: i32) -> Self {
        Self {
            counter: AtomicI32::new(value),
        }
    }

    /// Returns the last value stored
    pub fn read(&self) -> i32 {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn set(&self, value: i32) {
        self.counter.store(value, Ordering::SeqCst);
    }

    /// Adds one and returns the new value
    pub fn inc(&self) -> i32 {
        self.counter.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    /// Subtracts one and returns the new value
    pub fn dec(&self) -> i32 {
        self.counter.fetch_sub(1, Ordering::SeqCst).wrapping_sub(1)
    }

    fn compare_exchange(&self, current: i32, new: i32) -> Result<i32, i32> {
        self.counter
            .compare_exchange(current, new, Ordering::SeqCst, Ordering::SeqCst)
    }
}

impl Clone for AtomicCounter {
    fn clone(&self) -> Self {
        Self::new(self.read())
    }
}

impl fmt::Debug for AtomicCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicCounter").field(&self.read()).finish()
    }
}

/// Counts live references to a shared allocation
///
/// Never underflows: decrementing a zero count leaves it at zero and reports
/// that the last reference was not dropped by this call.
#[derive(Default, Clone)]
pub struct RefCount {
    refs: AtomicCounter,
}

impl RefCount {
    pub const fn new(refs: i32) -> Self {
        Self {
            refs: AtomicCounter::new(refs),
        }
    }

    pub fn read(&self) -> i32 {
        self.refs.read()
    }

    pub fn set(&self, refs: i32) {
        self.refs.set(refs);
    }

    /// Increments unless the count is zero; returns whether it incremented
    pub fn inc_not_zero(&self) -> bool {
        let mut current = self.refs.read();
        loop {
            if current == 0 {
                return false;
            }
            match self.refs.compare_exchange(current, current.saturating_add(1)) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Takes another reference. Incrementing a zero count is a use after
    /// free and only produces a warning.
    pub fn inc(&self) {
        if !self.inc_not_zero() {
            crate::pr_warning!("refcount_t: increment on 0; use-after-free.\n");
        }
    }

    /// Drops one reference; returns true when that was the last one
    pub fn dec_and_test(&self) -> bool {
        let mut current = self.refs.read();
        loop {
            if current <= 0 {
                return false;
            }
            match self.refs.compare_exchange(current, current - 1) {
                Ok(_) => return current == 1,
                Err(actual) => current = actual,
            }
        }
    }
}

impl fmt::Debug for RefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefCount").field(&self.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_set_then_read() {
        let counter = AtomicCounter::default();
        for value in [0, 1, -1, 42, i32::MIN, i32::MAX] {
            counter.set(value);
            assert_eq!(counter.read(), value);
        }
    }

    #[test]
    fn test_counter_inc_dec() {
        let counter = AtomicCounter::new(5);
        assert_eq!(counter.inc(), 6);
        assert_eq!(counter.dec(), 5);
        assert_eq!(counter.dec(), 4);
    }

    #[test]
    fn test_counter_clone_is_snapshot() {
        let counter = AtomicCounter::new(7);
        let copy = counter.clone();
        counter.set(8);
        assert_eq!(copy.read(), 7);
    }

    #[test]
    fn test_counter_concurrent_increments() {
        let counter = Arc::new(AtomicCounter::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.inc();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.read(), 4000);
    }

    #[test]
    fn test_refcount_dec_and_test() {
        let refs = RefCount::new(2);
        assert!(!refs.dec_and_test());
        assert!(refs.dec_and_test());
        assert_eq!(refs.read(), 0);

        // Saturated at zero
        assert!(!refs.dec_and_test());
        assert_eq!(refs.read(), 0);
    }

    #[test]
    fn test_refcount_inc_not_zero() {
        let refs = RefCount::new(1);
        assert!(refs.inc_not_zero());
        assert_eq!(refs.read(), 2);

        refs.set(0);
        assert!(!refs.inc_not_zero());
        assert_eq!(refs.read(), 0);
    }

    #[test]
    fn test_refcount_inc_on_zero_does_not_resurrect() {
        let _guard = crate::global_state_guard();
        let refs = RefCount::new(0);
        refs.inc();
        assert_eq!(refs.read(), 0);
    }

    #[test]
    fn test_debug_shows_value() {
        assert_eq!(format!("{:?}", RefCount::new(3)), "RefCount(3)");
        assert_eq!(format!("{:?}", AtomicCounter::new(-2)), "AtomicCounter(-2)");
    }
}
