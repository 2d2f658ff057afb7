//! Thread map allocation and release through a tracking factory

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use libperf_core::{
    LibperfError, OwnedThreadMap, Result, ThreadMap, ThreadMapEntry, ThreadMapFactory,
};

/// Counts allocations and releases, and hands out a fixed two-thread map
#[derive(Default)]
struct TrackingFactory {
    allocated: AtomicUsize,
    released: AtomicUsize,
    fail: bool,
}

impl TrackingFactory {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ThreadMapFactory for TrackingFactory {
    fn new_array(&self, nr: usize, pids: Option<&[i32]>) -> Result<ThreadMap> {
        if self.fail {
            return Err(LibperfError::Allocation("tracking factory set to fail".to_string()));
        }
        let map = ThreadMap::new_array(nr, pids)?;
        self.allocated.fetch_add(1, Ordering::SeqCst);
        Ok(map)
    }

    fn new_dummy(&self) -> Option<ThreadMap> {
        if self.fail {
            return None;
        }
        self.allocated.fetch_add(1, Ordering::SeqCst);
        Some(
            ThreadMap::from_entries(vec![
                ThreadMapEntry::new(100, "a"),
                ThreadMapEntry::new(200, "bb"),
            ])
            .with_err_thread(-1),
        )
    }

    fn release(&self, map: ThreadMap) {
        self.released.fetch_add(1, Ordering::SeqCst);
        drop(map);
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_stub_factory_entries_are_visible() {
    init_logging();
    let factory = Arc::new(TrackingFactory::default());
    let owned = OwnedThreadMap::new_dummy(factory.clone()).expect("stub allocates");

    let map = owned.get().unwrap();
    assert_eq!(map.nr(), 2);
    assert_eq!(map.err_thread(), -1);
    assert!(map.refcnt().read() >= 0);

    let entries: Vec<(i32, &str)> = map
        .entries()
        .iter()
        .map(|e| (e.pid, e.comm.as_str()))
        .collect();
    assert_eq!(entries, vec![(100, "a"), (200, "bb")]);
}

#[test]
fn test_drop_releases_exactly_once() {
    init_logging();
    let factory = Arc::new(TrackingFactory::default());
    {
        let _owned = OwnedThreadMap::new_dummy(factory.clone()).unwrap();
        assert_eq!(factory.allocated(), 1);
        assert_eq!(factory.released(), 0);
    }
    assert_eq!(factory.released(), 1);
}

#[test]
fn test_explicit_release_then_drop_does_not_double_free() {
    init_logging();
    let factory = Arc::new(TrackingFactory::default());
    let mut owned = OwnedThreadMap::new_dummy(factory.clone()).unwrap();
    assert!(owned.release());
    drop(owned);
    assert_eq!(factory.allocated(), 1);
    assert_eq!(factory.released(), 1);
}

#[test]
fn test_many_maps_balance() {
    init_logging();
    let factory = Arc::new(TrackingFactory::default());
    let maps: Vec<_> = (0..16)
        .map(|i| OwnedThreadMap::new_array(factory.clone(), i + 1, None).unwrap())
        .collect();
    assert_eq!(factory.allocated(), 16);
    drop(maps);
    assert_eq!(factory.released(), 16);
}

#[test]
fn test_install_dummy_releases_previous_map() {
    let factory = Arc::new(TrackingFactory::default());
    let mut owned = OwnedThreadMap::empty(factory.clone());
    assert!(owned.install_dummy(factory.clone()));
    assert!(owned.install_dummy(factory.clone()));
    assert_eq!(factory.allocated(), 2);
    assert_eq!(factory.released(), 1);

    // A failing factory leaves the current map in place
    let failing = Arc::new(TrackingFactory::failing());
    assert!(!owned.install_dummy(failing));
    assert_eq!(owned.get().unwrap().nr(), 2);

    drop(owned);
    assert_eq!(factory.released(), 2);
}

#[test]
fn test_failed_allocation_is_none() {
    let factory = Arc::new(TrackingFactory::failing());
    assert!(OwnedThreadMap::new_dummy(factory.clone()).is_none());
    assert!(matches!(
        OwnedThreadMap::new_array(factory.clone(), 1, None),
        Err(LibperfError::Allocation(_))
    ));
    assert_eq!(factory.released(), 0);
}

#[test]
fn test_set_entries_through_owner() {
    let factory = Arc::new(TrackingFactory::default());
    let mut owned = OwnedThreadMap::new_dummy(factory).unwrap();
    let map = owned.get_mut().unwrap();

    let err = map
        .set_entries(&[ThreadMapEntry::new(1, "only-one")])
        .unwrap_err();
    assert_eq!(err, LibperfError::SizeMismatch { expected: 2, actual: 1 });
    assert_eq!(map.pid(0).unwrap(), 100);

    map.set_entries(&[
        ThreadMapEntry::new(300, "cc"),
        ThreadMapEntry::new(400, "a-very-long-command-name"),
    ])
    .unwrap();
    assert_eq!(map.pid(0).unwrap(), 300);
    assert_eq!(map.comm(0).unwrap(), "cc");
    assert_eq!(map.pid(1).unwrap(), 400);
    assert_eq!(map.comm(1).unwrap(), "a-very-long-com");
}
