//! libperf-core: the native side of the libperf Python bindings
//!
//! Holds the records the bindings expose: a thread map of monitored threads,
//! the atomic counter and reference count primitives it is built on, and the
//! diagnostic print sink installed by `libperf_init`.
//!
//! # Usage
//!
//! ```
//! use libperf_core::{current_factory, OwnedThreadMap};
//!
//! let owned = OwnedThreadMap::new_dummy(current_factory()).expect("allocation");
//! let map = owned.get().unwrap();
//! assert_eq!(map.nr(), 1);
//! assert_eq!(map.pid(0).unwrap(), -1);
//! ```

pub mod atomic;
pub mod comm;
pub mod config;
pub mod factory;
pub mod owner;
pub mod print;
pub mod registry;
pub mod threadmap;

pub use atomic::{AtomicCounter, RefCount};
pub use comm::{Comm, COMM_LEN};
pub use config::{get_config, set_config, LibperfConfig};
pub use factory::{current_factory, install_factory, DefaultFactory, ThreadMapFactory};
pub use owner::OwnedThreadMap;
pub use print::{libperf_init, libperf_print, stderr_print, tracing_print, PrintFn, PrintLevel};
pub use registry::{Registration, TypeRegistry};
pub use threadmap::{ThreadMap, ThreadMapEntry};

pub use libperf_common::{LibperfError, Result};

/// Serializes unit tests that touch process-global state
#[cfg(test)]
pub(crate) fn global_state_guard() -> parking_lot::MutexGuard<'static, ()> {
    static GUARD: parking_lot::Mutex<()> = parking_lot::const_mutex(());
    GUARD.lock()
}
