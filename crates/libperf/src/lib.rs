//! libperf: Python bindings for perf thread maps
//!
//! Exposes the thread map, its entries, and the atomic counter and reference
//! count primitives from `libperf-core` as Python classes.
//!
//! # Usage
//! ```python
//! import libperf
//!
//! libperf.libperf_init()
//! threads = libperf.perf_thread_map__new_dummy()
//! print(threads.nr, threads.err_thread, threads.refcnt.refs)
//!
//! entry = threads.map[0]
//! entry.comm = "worker"          # writes through to the map
//! threads.map = [libperf.ThreadMapEntry(1234, "bash")]
//! ```

use pyo3::prelude::*;

pub mod counter;
pub mod init;
pub mod registrar;
pub mod thread_map;

pub use libperf_common::error::ThreadMapReleasedError;

use libperf_core::TypeRegistry;
use registrar::ModuleRegistrar;

/// Adds every libperf class to `m`, entries before the map that owns them.
pub fn register_types(m: &Bound<'_, PyModule>) -> PyResult<TypeRegistry> {
    let mut registrar = ModuleRegistrar::new(m);
    registrar.push_type::<thread_map::PyThreadMapEntry>()?;
    registrar.push_type::<thread_map::PyThreadMap>()?;
    registrar.push_type::<counter::PyAtomicCounter>()?;
    registrar.push_type::<counter::PyRefCount>()?;
    registrar.push_type::<init::PyPrintLevel>()?;
    Ok(registrar.into_registry())
}

/// libperf Python module
#[pymodule]
fn libperf(m: &Bound<'_, PyModule>) -> PyResult<()> {
    init_module(m)
}

fn init_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    let registry = register_types(m)?;
    tracing::debug!(types = registry.len(), "libperf types registered");

    m.add_function(wrap_pyfunction!(thread_map::new_dummy_thread_map, m)?)?;
    init::register_functions(m)?;

    m.add("ThreadMapReleasedError", m.py().get_type::<ThreadMapReleasedError>())?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Once;

    use parking_lot::{const_mutex, Mutex};
    use pyo3::prelude::*;

    static INIT: Once = Once::new();
    static GUARD: Mutex<()> = const_mutex(());

    /// Runs `f` with the GIL held and a freshly built `libperf` module.
    ///
    /// Calls are serialized since some tests swap the process-wide factory.
    pub(crate) fn with_libperf<R>(f: impl FnOnce(Python<'_>, &Bound<'_, PyModule>) -> R) -> R {
        let _guard = GUARD.lock();
        INIT.call_once(|| {
            pyo3::prepare_freethreaded_python();
        });
        Python::with_gil(|py| {
            let m = PyModule::new(py, "libperf").unwrap();
            super::init_module(&m).unwrap();
            f(py, &m)
        })
    }
}
