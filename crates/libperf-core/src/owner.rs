//! Exclusive ownership of a factory-allocated thread map

use std::fmt;
use std::sync::Arc;

use libperf_common::{LibperfError, Result};

use crate::config::get_config;
use crate::factory::ThreadMapFactory;
use crate::threadmap::ThreadMap;

/// Owns one thread map and returns it to its factory exactly once, on
/// [`OwnedThreadMap::release`] or on drop, whichever comes first.
///
/// After release every accessor fails with [`LibperfError::Released`].
pub struct OwnedThreadMap {
    map: Option<ThreadMap>,
    factory: Arc<dyn ThreadMapFactory>,
}

impl OwnedThreadMap {
    /// Allocates a dummy map through `factory`; `None` if it fails.
    pub fn new_dummy(factory: Arc<dyn ThreadMapFactory>) -> Option<Self> {
        let map = factory.new_dummy()?;
        tracing::debug!(nr = map.nr(), "allocated dummy thread map");
        Some(Self::adopt(map, factory))
    }

    /// Allocates an `nr`-entry map through `factory`.
    pub fn new_array(
        factory: Arc<dyn ThreadMapFactory>,
        nr: usize,
        pids: Option<&[i32]>,
    ) -> Result<Self> {
        let map = factory.new_array(nr, pids)?;
        tracing::debug!(nr, "allocated thread map");
        Ok(Self::adopt(map, factory))
    }

    /// Takes ownership of a map `factory` allocated.
    pub fn adopt(map: ThreadMap, factory: Arc<dyn ThreadMapFactory>) -> Self {
        Self {
            map: Some(map),
            factory,
        }
    }

    /// An owner with no allocation yet, see [`OwnedThreadMap::install_dummy`].
    pub fn empty(factory: Arc<dyn ThreadMapFactory>) -> Self {
        Self { map: None, factory }
    }

    /// Allocates a dummy map through `factory` and swaps it in, releasing
    /// any map held before. On allocation failure the current state is kept
    /// and false is returned.
    pub fn install_dummy(&mut self, factory: Arc<dyn ThreadMapFactory>) -> bool {
        let Some(map) = factory.new_dummy() else {
            tracing::debug!("dummy thread map allocation failed");
            return false;
        };
        self.release();
        self.map = Some(map);
        self.factory = factory;
        true
    }

    pub fn get(&self) -> Result<&ThreadMap> {
        self.map.as_ref().ok_or(LibperfError::Released)
    }

    pub fn get_mut(&mut self) -> Result<&mut ThreadMap> {
        self.map.as_mut().ok_or(LibperfError::Released)
    }

    pub fn is_released(&self) -> bool {
        self.map.is_none()
    }

    /// Drops the owner's reference and hands the map back to the factory.
    ///
    /// Returns false if the map was already released. Extra references
    /// taken with [`ThreadMap::get`] do not keep the storage alive; they
    /// only trigger an "unbalanced" warning.
    pub fn release(&mut self) -> bool {
        let Some(map) = self.map.take() else {
            return false;
        };

        if !map.put() && get_config().warn_unbalanced_refcnt {
            crate::pr_warning!("thread map refcnt unbalanced\n");
            tracing::warn!(refcnt = map.refcnt().read(), "releasing thread map with live references");
        }

        tracing::debug!(nr = map.nr(), "released thread map");
        self.factory.release(map);
        true
    }
}

impl Drop for OwnedThreadMap {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for OwnedThreadMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedThreadMap")
            .field("map", &self.map)
            .finish_non_exhaustive()
    }
}
