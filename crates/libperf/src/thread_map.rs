//! ThreadMap and ThreadMapEntry classes

use libperf_core::{current_factory, OwnedThreadMap, ThreadMap, ThreadMapEntry};
use pyo3::prelude::*;

use crate::counter::PyRefCount;

// =====================
// ThreadMap
// =====================

/// Python ThreadMap class - owns one thread map allocation
///
/// A map created with `ThreadMap()` has no allocation until it is passed to
/// `perf_thread_map__new_dummy`. The allocation is released on `close()` or
/// when the object is collected.
#[pyclass(name = "ThreadMap", module = "libperf")]
pub struct PyThreadMap {
    inner: OwnedThreadMap,
}

impl PyThreadMap {
    pub(crate) fn from_owned(inner: OwnedThreadMap) -> Self {
        Self { inner }
    }

    pub(crate) fn thread_map(&self) -> PyResult<&ThreadMap> {
        Ok(self.inner.get()?)
    }

    fn thread_map_mut(&mut self) -> PyResult<&mut ThreadMap> {
        Ok(self.inner.get_mut()?)
    }
}

#[pymethods]
impl PyThreadMap {
    /// Create a map with no allocation
    #[new]
    fn new() -> Self {
        Self {
            inner: OwnedThreadMap::empty(current_factory()),
        }
    }

    /// Allocate `nr` entries, with `pids` or -1 for each
    #[staticmethod]
    #[pyo3(signature = (nr, pids = None))]
    fn new_array(nr: usize, pids: Option<Vec<i32>>) -> PyResult<Self> {
        let inner = OwnedThreadMap::new_array(current_factory(), nr, pids.as_deref())?;
        Ok(Self { inner })
    }

    /// Number of entries
    #[getter]
    fn nr(&self) -> PyResult<usize> {
        Ok(self.thread_map()?.nr())
    }

    #[getter]
    fn err_thread(&self) -> PyResult<i32> {
        Ok(self.thread_map()?.err_thread())
    }

    #[setter]
    fn set_err_thread(&mut self, err_thread: i32) -> PyResult<()> {
        self.thread_map_mut()?.set_err_thread(err_thread);
        Ok(())
    }

    /// The map's reference count, as a live view
    #[getter]
    fn refcnt(slf: &Bound<'_, Self>) -> PyResult<PyRefCount> {
        slf.borrow().thread_map()?;
        Ok(PyRefCount::of_thread_map(slf.clone().unbind()))
    }

    /// True once the allocation is gone (or before it exists)
    #[getter]
    fn released(&self) -> bool {
        self.inner.is_released()
    }

    /// Entries as views: writing to one writes to this map
    #[getter]
    fn map(slf: &Bound<'_, Self>) -> PyResult<Vec<PyThreadMapEntry>> {
        let nr = slf.borrow().thread_map()?.nr();
        Ok((0..nr)
            .map(|index| PyThreadMapEntry::view(slf.clone().unbind(), index))
            .collect())
    }

    /// Replace every entry's pid and comm; the length must equal `nr`
    #[setter]
    fn set_map(slf: &Bound<'_, Self>, entries: Vec<PyRef<PyThreadMapEntry>>) -> PyResult<()> {
        let py = slf.py();
        // Read the sources first: some may be views onto this same map.
        let snapshot = entries
            .iter()
            .map(|entry| entry.snapshot(py))
            .collect::<PyResult<Vec<_>>>()?;
        drop(entries);

        slf.borrow_mut().thread_map_mut()?.set_entries(&snapshot)?;
        Ok(())
    }

    fn pid(&self, idx: usize) -> PyResult<i32> {
        Ok(self.thread_map()?.pid(idx)?)
    }

    fn set_pid(&mut self, idx: usize, pid: i32) -> PyResult<()> {
        Ok(self.thread_map_mut()?.set_pid(idx, pid)?)
    }

    fn comm(&self, idx: usize) -> PyResult<String> {
        Ok(self.thread_map()?.comm(idx)?.to_string())
    }

    fn set_comm(&mut self, idx: usize, comm: &str) -> PyResult<()> {
        Ok(self.thread_map_mut()?.set_comm(idx, comm)?)
    }

    /// Index of the first entry with `pid`, or None
    fn idx(&self, pid: i32) -> PyResult<Option<usize>> {
        Ok(self.thread_map()?.idx(pid))
    }

    /// Take a reference and return this map
    fn get<'py>(slf: &Bound<'py, Self>) -> PyResult<Bound<'py, Self>> {
        slf.borrow().thread_map()?.get();
        Ok(slf.clone())
    }

    /// Drop a reference, returning True if it was the last one
    ///
    /// Storage is only freed by `close()` or collection.
    fn put(&self) -> PyResult<bool> {
        Ok(self.thread_map()?.put())
    }

    /// Resize to `nr` entries; new entries have pid 0 and an empty comm
    fn realloc(&mut self, nr: usize) -> PyResult<()> {
        Ok(self.thread_map_mut()?.realloc(nr)?)
    }

    /// Release the allocation now. Returns False if there was none.
    fn close(&mut self) -> bool {
        self.inner.release()
    }

    fn __len__(&self) -> PyResult<usize> {
        self.nr()
    }

    fn __repr__(&self) -> String {
        thread_map_repr(self.inner.get().ok())
    }
}

fn thread_map_repr(map: Option<&ThreadMap>) -> String {
    match map {
        Some(map) => format!(
            "ThreadMap(nr={}, err_thread={}, refcnt={})",
            map.nr(),
            map.err_thread(),
            map.refcnt().read()
        ),
        None => "ThreadMap(unallocated)".to_string(),
    }
}

/// Allocate a dummy thread map
///
/// With no argument a new `ThreadMap` is returned. Given an existing one, its
/// allocation is replaced and the same object returned. Returns None if the
/// allocation fails.
#[pyfunction]
#[pyo3(name = "perf_thread_map__new_dummy", signature = (thread_map = None))]
pub fn new_dummy_thread_map<'py>(
    py: Python<'py>,
    thread_map: Option<Bound<'py, PyThreadMap>>,
) -> PyResult<Option<Bound<'py, PyThreadMap>>> {
    let factory = current_factory();
    match thread_map {
        Some(existing) => {
            let installed = existing.try_borrow_mut()?.inner.install_dummy(factory);
            Ok(installed.then_some(existing))
        }
        None => match OwnedThreadMap::new_dummy(factory) {
            Some(inner) => Ok(Some(Bound::new(py, PyThreadMap::from_owned(inner))?)),
            None => Ok(None),
        },
    }
}

// =====================
// ThreadMapEntry
// =====================

enum EntrySlot {
    /// A free-standing entry, e.g. built to pass to `ThreadMap.map = [...]`
    Detached(ThreadMapEntry),
    /// Entry `index` of a thread map
    View {
        parent: Py<PyThreadMap>,
        index: usize,
    },
}

/// Python ThreadMapEntry class - one thread's pid and command name
///
/// Entries read from `ThreadMap.map` are views holding their parent map, so
/// they never outlive its storage; once the map is closed they raise
/// `ThreadMapReleasedError`.
#[pyclass(name = "ThreadMapEntry", module = "libperf")]
pub struct PyThreadMapEntry {
    slot: EntrySlot,
}

impl PyThreadMapEntry {
    fn view(parent: Py<PyThreadMap>, index: usize) -> Self {
        Self {
            slot: EntrySlot::View { parent, index },
        }
    }

    fn with_entry<R>(&self, py: Python<'_>, f: impl FnOnce(&ThreadMapEntry) -> R) -> PyResult<R> {
        match &self.slot {
            EntrySlot::Detached(entry) => Ok(f(entry)),
            EntrySlot::View { parent, index } => {
                let parent = parent.bind(py).try_borrow()?;
                Ok(f(parent.thread_map()?.entry(*index)?))
            }
        }
    }

    fn with_entry_mut<R>(
        &mut self,
        py: Python<'_>,
        f: impl FnOnce(&mut ThreadMapEntry) -> R,
    ) -> PyResult<R> {
        match &mut self.slot {
            EntrySlot::Detached(entry) => Ok(f(entry)),
            EntrySlot::View { parent, index } => {
                let mut parent = parent.bind(py).try_borrow_mut()?;
                Ok(f(parent.thread_map_mut()?.entry_mut(*index)?))
            }
        }
    }

    /// Current pid and comm, copied out
    pub(crate) fn snapshot(&self, py: Python<'_>) -> PyResult<ThreadMapEntry> {
        self.with_entry(py, ThreadMapEntry::clone)
    }
}

#[pymethods]
impl PyThreadMapEntry {
    #[new]
    #[pyo3(signature = (pid = 0, comm = ""))]
    fn new(pid: i32, comm: &str) -> Self {
        Self {
            slot: EntrySlot::Detached(ThreadMapEntry::new(pid, comm)),
        }
    }

    #[getter]
    fn pid(&self, py: Python<'_>) -> PyResult<i32> {
        self.with_entry(py, |e| e.pid)
    }

    #[setter]
    fn set_pid(&mut self, py: Python<'_>, pid: i32) -> PyResult<()> {
        self.with_entry_mut(py, |e| e.pid = pid)
    }

    /// Command name, at most 15 bytes
    #[getter]
    fn comm(&self, py: Python<'_>) -> PyResult<String> {
        self.with_entry(py, |e| e.comm.to_string())
    }

    /// Longer names are truncated without error
    #[setter]
    fn set_comm(&mut self, py: Python<'_>, comm: &str) -> PyResult<()> {
        self.with_entry_mut(py, |e| e.comm.set(comm))
    }

    /// Position in the parent map, or None for a detached entry
    #[getter]
    fn index(&self) -> Option<usize> {
        match &self.slot {
            EntrySlot::Detached(_) => None,
            EntrySlot::View { index, .. } => Some(*index),
        }
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        let entry = self.snapshot(py)?;
        Ok(entry_repr(&entry, self.index()))
    }
}

fn entry_repr(entry: &ThreadMapEntry, index: Option<usize>) -> String {
    match index {
        Some(index) => format!(
            "ThreadMapEntry(index={}, pid={}, comm={:?})",
            index,
            entry.pid,
            entry.comm.as_str()
        ),
        None => format!(
            "ThreadMapEntry(pid={}, comm={:?})",
            entry.pid,
            entry.comm.as_str()
        ),
    }
}
