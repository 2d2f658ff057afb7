//! Global configuration for libperf
//!
//! Thread-safe, process-wide settings read by the print sink and the thread
//! map release path.

use std::sync::{PoisonError, RwLock};

use crate::print::PrintLevel;

/// Global library configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibperfConfig {
    /// Most verbose level still passed to the print sink
    pub verbosity: PrintLevel,

    /// Whether releasing a thread map with outstanding references warns
    pub warn_unbalanced_refcnt: bool,
}

impl LibperfConfig {
    const DEFAULT: LibperfConfig = LibperfConfig {
        verbosity: PrintLevel::Info,
        warn_unbalanced_refcnt: true,
    };
}

impl Default for LibperfConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Global configuration instance
static GLOBAL_CONFIG: RwLock<LibperfConfig> = RwLock::new(LibperfConfig::DEFAULT);

/// Gets the current configuration
///
/// A poisoned lock still holds a complete value, so it is read through.
pub fn get_config() -> LibperfConfig {
    GLOBAL_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the configuration
pub fn set_config(config: LibperfConfig) {
    let mut global = GLOBAL_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *global = config;
}
