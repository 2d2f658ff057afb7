//! Thread map allocation
//!
//! All thread maps handed to the bindings come from the installed
//! [`ThreadMapFactory`] and go back to it on release, so an embedding host
//! (or a test) can swap the allocator.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use libperf_common::Result;

use crate::threadmap::ThreadMap;

/// Allocates and releases thread maps
pub trait ThreadMapFactory: Send + Sync {
    /// Allocates `nr` entries, see [`ThreadMap::new_array`]
    fn new_array(&self, nr: usize, pids: Option<&[i32]>) -> Result<ThreadMap> {
        ThreadMap::new_array(nr, pids)
    }

    /// Allocates a one-entry "any thread" map; `None` on allocation failure
    fn new_dummy(&self) -> Option<ThreadMap> {
        self.new_array(1, None).ok()
    }

    /// Takes back a map allocated by this factory
    fn release(&self, map: ThreadMap) {
        drop(map);
    }
}

/// Heap allocation with no bookkeeping
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactory;

impl ThreadMapFactory for DefaultFactory {}

static FACTORY: Lazy<RwLock<Arc<dyn ThreadMapFactory>>> = Lazy::new(|| {
    let factory: Arc<dyn ThreadMapFactory> = Arc::new(DefaultFactory);
    RwLock::new(factory)
});

/// Replaces the process-wide factory, returning the previous one.
///
/// Maps already allocated keep the factory they were allocated with.
pub fn install_factory(factory: Arc<dyn ThreadMapFactory>) -> Arc<dyn ThreadMapFactory> {
    tracing::debug!("thread map factory replaced");
    std::mem::replace(&mut *FACTORY.write(), factory)
}

pub fn current_factory() -> Arc<dyn ThreadMapFactory> {
    Arc::clone(&FACTORY.read())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullFactory;

    impl ThreadMapFactory for NullFactory {
        fn new_dummy(&self) -> Option<ThreadMap> {
            None
        }
    }

    #[test]
    fn test_default_factory_dummy() {
        let map = DefaultFactory.new_dummy().unwrap();
        assert_eq!(map.nr(), 1);
        assert_eq!(map.pid(0).unwrap(), -1);
    }

    #[test]
    fn test_default_factory_array_error_propagates() {
        assert!(DefaultFactory.new_array(3, Some(&[1, 2])).is_err());
    }

    #[test]
    fn test_install_returns_previous() {
        let _guard = crate::global_state_guard();
        let previous = install_factory(Arc::new(NullFactory));
        assert!(current_factory().new_dummy().is_none());

        let null = install_factory(previous);
        assert!(null.new_dummy().is_none());
        assert!(current_factory().new_dummy().is_some());
    }
}
