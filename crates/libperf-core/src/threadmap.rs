//! Thread map: the set of threads a perf event is opened on

use libperf_common::{LibperfError, Result};

use crate::atomic::RefCount;
use crate::comm::Comm;

/// One monitored thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadMapEntry {
    pub pid: i32,
    pub comm: Comm,
}

impl ThreadMapEntry {
    pub fn new(pid: i32, comm: &str) -> Self {
        Self {
            pid,
            comm: Comm::new(comm),
        }
    }
}

/// A fixed-length, reference-counted list of threads.
///
/// The entry count is the length of the entry list, so the two can never
/// disagree; only [`ThreadMap::realloc`] changes it.
#[derive(Debug)]
pub struct ThreadMap {
    refcnt: RefCount,
    err_thread: i32,
    map: Vec<ThreadMapEntry>,
}

impl ThreadMap {
    /// Allocates `nr` entries with pids taken from `pids`, or `-1` for every
    /// entry when `pids` is `None`. The new map holds one reference.
    pub fn new_array(nr: usize, pids: Option<&[i32]>) -> Result<Self> {
        if let Some(pids) = pids {
            if pids.len() != nr {
                return Err(LibperfError::SizeMismatch {
                    expected: nr,
                    actual: pids.len(),
                });
            }
        }

        let mut map = Vec::new();
        reserve_entries(&mut map, nr)?;
        map.extend((0..nr).map(|i| ThreadMapEntry {
            pid: pids.map_or(-1, |p| p[i]),
            comm: Comm::default(),
        }));

        Ok(Self::from_entries(map))
    }

    /// A map with a single `-1` entry, meaning "any thread".
    pub fn new_dummy() -> Self {
        Self::from_entries(vec![ThreadMapEntry {
            pid: -1,
            comm: Comm::default(),
        }])
    }

    /// Wraps already-built entries, with one reference and no error thread.
    pub fn from_entries(map: Vec<ThreadMapEntry>) -> Self {
        Self {
            refcnt: RefCount::new(1),
            err_thread: -1,
            map,
        }
    }

    pub fn with_err_thread(mut self, err_thread: i32) -> Self {
        self.err_thread = err_thread;
        self
    }

    pub fn nr(&self) -> usize {
        self.map.len()
    }

    pub fn err_thread(&self) -> i32 {
        self.err_thread
    }

    pub fn set_err_thread(&mut self, err_thread: i32) {
        self.err_thread = err_thread;
    }

    pub fn refcnt(&self) -> &RefCount {
        &self.refcnt
    }

    pub fn entries(&self) -> &[ThreadMapEntry] {
        &self.map
    }

    pub fn entry(&self, idx: usize) -> Result<&ThreadMapEntry> {
        let nr = self.nr();
        self.map
            .get(idx)
            .ok_or(LibperfError::IndexOutOfRange { index: idx, nr })
    }

    pub fn entry_mut(&mut self, idx: usize) -> Result<&mut ThreadMapEntry> {
        let nr = self.nr();
        self.map
            .get_mut(idx)
            .ok_or(LibperfError::IndexOutOfRange { index: idx, nr })
    }

    pub fn pid(&self, idx: usize) -> Result<i32> {
        self.entry(idx).map(|e| e.pid)
    }

    pub fn set_pid(&mut self, idx: usize, pid: i32) -> Result<()> {
        self.entry_mut(idx)?.pid = pid;
        Ok(())
    }

    pub fn comm(&self, idx: usize) -> Result<&str> {
        self.entry(idx).map(|e| e.comm.as_str())
    }

    pub fn set_comm(&mut self, idx: usize, comm: &str) -> Result<()> {
        self.entry_mut(idx)?.comm.set(comm);
        Ok(())
    }

    /// Index of the first entry holding `pid`
    pub fn idx(&self, pid: i32) -> Option<usize> {
        self.map.iter().position(|e| e.pid == pid)
    }

    /// Overwrites every entry's pid and comm, in order.
    ///
    /// `entries` must have exactly `nr()` elements; otherwise nothing is
    /// written.
    pub fn set_entries(&mut self, entries: &[ThreadMapEntry]) -> Result<()> {
        if entries.len() != self.nr() {
            return Err(LibperfError::SizeMismatch {
                expected: self.nr(),
                actual: entries.len(),
            });
        }
        for (slot, entry) in self.map.iter_mut().zip(entries) {
            slot.pid = entry.pid;
            slot.comm = entry.comm;
        }
        Ok(())
    }

    /// Resizes to `nr` entries. Kept entries are untouched; new ones are
    /// zeroed. On allocation failure the map keeps its old size.
    pub fn realloc(&mut self, nr: usize) -> Result<()> {
        if nr > self.map.len() {
            let additional = nr - self.map.len();
            reserve_entries(&mut self.map, additional)?;
        }
        self.map.resize_with(nr, ThreadMapEntry::default);
        Ok(())
    }

    /// Takes another reference
    pub fn get(&self) -> &Self {
        self.refcnt.inc();
        self
    }

    /// Drops a reference; returns true if it was the last one
    pub fn put(&self) -> bool {
        self.refcnt.dec_and_test()
    }
}

fn reserve_entries(map: &mut Vec<ThreadMapEntry>, additional: usize) -> Result<()> {
    map.try_reserve_exact(additional).map_err(|e| {
        LibperfError::Allocation(format!(
            "cannot allocate {} thread map entries: {}",
            additional, e
        ))
    })
}
