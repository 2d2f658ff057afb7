//! Adds classes to the module exactly once, reporting failures

use libperf_common::{LibperfError, Result};
use libperf_core::{Registration, TypeRegistry};
use pyo3::prelude::*;
use pyo3::{PyClass, PyTypeInfo};

pub struct ModuleRegistrar<'a, 'py> {
    module: &'a Bound<'py, PyModule>,
    registry: TypeRegistry,
}

impl<'a, 'py> ModuleRegistrar<'a, 'py> {
    pub fn new(module: &'a Bound<'py, PyModule>) -> Self {
        Self {
            module,
            registry: TypeRegistry::new(),
        }
    }

    /// Adds class `T` under its Python name unless it is already there.
    pub fn push_type<T: PyClass>(&mut self) -> Result<Registration> {
        let name = <T as PyTypeInfo>::NAME;
        let registration = self.registry.register(name)?;
        if registration == Registration::Added {
            self.module
                .add_class::<T>()
                .map_err(|e| LibperfError::Registration(format!("{}: {}", name, e)))?;
            tracing::debug!(name, "registered type");
        }
        Ok(registration)
    }

    pub fn into_registry(self) -> TypeRegistry {
        self.registry
    }
}
