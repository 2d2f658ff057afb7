//! Type registration bookkeeping
//!
//! Tracks which object types a hosting module has already been given, so
//! registration can run from module init without double-adding a type.

use libperf_common::{LibperfError, Result};

/// Outcome of a successful registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First time this name was seen; the caller must add the type
    Added,
    /// Already registered; nothing to do
    AlreadyRegistered,
}

/// Names registered with one module, in registration order
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    names: Vec<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name`. Names must be non-empty identifiers.
    pub fn register(&mut self, name: &str) -> Result<Registration> {
        if !is_identifier(name) {
            return Err(LibperfError::Registration(format!(
                "invalid type name {:?}",
                name
            )));
        }
        if self.contains(name) {
            return Ok(Registration::AlreadyRegistered);
        }
        self.names.push(name.to_string());
        Ok(Registration::Added)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.register("ThreadMap").unwrap(), Registration::Added);
        assert_eq!(
            registry.register("ThreadMap").unwrap(),
            Registration::AlreadyRegistered
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = TypeRegistry::new();
        registry.register("ThreadMapEntry").unwrap();
        registry.register("ThreadMap").unwrap();
        assert_eq!(registry.names(), &["ThreadMapEntry", "ThreadMap"]);
    }

    #[test]
    fn test_register_rejects_bad_names() {
        let mut registry = TypeRegistry::new();
        for name in ["", "1map", "thread map", "a-b"] {
            let err = registry.register(name).unwrap_err();
            assert!(matches!(err, LibperfError::Registration(_)));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_underscore_names_allowed() {
        let mut registry = TypeRegistry::new();
        assert!(registry.register("py_perf_thread_map").is_ok());
        assert!(registry.contains("py_perf_thread_map"));
    }
}
