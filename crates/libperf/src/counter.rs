//! AtomicCounter and RefCount classes

use libperf_core::{AtomicCounter, RefCount};
use pyo3::prelude::*;

use crate::thread_map::PyThreadMap;

// =====================
// AtomicCounter
// =====================

/// Python AtomicCounter class - an integer read and set atomically
#[pyclass(name = "AtomicCounter", module = "libperf")]
pub struct PyAtomicCounter {
    inner: AtomicCounter,
}

#[pymethods]
impl PyAtomicCounter {
    #[new]
    #[pyo3(signature = (counter = 0))]
    fn new(counter: i32) -> Self {
        Self {
            inner: AtomicCounter::new(counter),
        }
    }

    #[getter]
    fn counter(&self) -> i32 {
        self.inner.read()
    }

    #[setter]
    fn set_counter(&self, counter: i32) {
        self.inner.set(counter);
    }

    /// Add one, returning the new value
    fn inc(&self) -> i32 {
        self.inner.inc()
    }

    /// Subtract one, returning the new value
    fn dec(&self) -> i32 {
        self.inner.dec()
    }

    fn __repr__(&self) -> String {
        format!("AtomicCounter(counter={})", self.inner.read())
    }
}

// =====================
// RefCount
// =====================

enum RefSource {
    Standalone(RefCount),
    /// The reference count of a thread map, read through the map
    ThreadMap(Py<PyThreadMap>),
}

/// Python RefCount class
///
/// Either standalone, or a view onto a thread map's reference count that
/// reads and writes the map's own counter.
#[pyclass(name = "RefCount", module = "libperf")]
pub struct PyRefCount {
    source: RefSource,
}

impl PyRefCount {
    pub(crate) fn of_thread_map(parent: Py<PyThreadMap>) -> Self {
        Self {
            source: RefSource::ThreadMap(parent),
        }
    }

    fn with_refcount<R>(&self, py: Python<'_>, f: impl FnOnce(&RefCount) -> R) -> PyResult<R> {
        match &self.source {
            RefSource::Standalone(refs) => Ok(f(refs)),
            RefSource::ThreadMap(parent) => {
                let parent = parent.bind(py).try_borrow()?;
                Ok(f(parent.thread_map()?.refcnt()))
            }
        }
    }
}

#[pymethods]
impl PyRefCount {
    #[new]
    #[pyo3(signature = (refs = 1))]
    fn new(refs: i32) -> Self {
        Self {
            source: RefSource::Standalone(RefCount::new(refs)),
        }
    }

    #[getter]
    fn refs(&self, py: Python<'_>) -> PyResult<i32> {
        self.with_refcount(py, RefCount::read)
    }

    #[setter]
    fn set_refs(&self, py: Python<'_>, refs: i32) -> PyResult<()> {
        self.with_refcount(py, |r| r.set(refs))
    }

    /// True if this reads through a thread map
    #[getter]
    fn is_view(&self) -> bool {
        matches!(self.source, RefSource::ThreadMap(_))
    }

    /// Take a reference; a zero count stays zero and warns
    fn inc(&self, py: Python<'_>) -> PyResult<()> {
        self.with_refcount(py, RefCount::inc)
    }

    /// Drop a reference, returning True if it was the last one
    fn dec_and_test(&self, py: Python<'_>) -> PyResult<bool> {
        self.with_refcount(py, RefCount::dec_and_test)
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        let refs = self.with_refcount(py, RefCount::read)?;
        Ok(format!("RefCount(refs={})", refs))
    }
}
