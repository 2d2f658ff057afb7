//! Error types for libperf

use thiserror::Error;

/// Result type alias for libperf operations
pub type Result<T> = std::result::Result<T, LibperfError>;

/// Unified error type for all libperf operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibperfError {
    /// A value of the wrong semantic type was supplied
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    /// A sequence write did not match the fixed entry count
    #[error("Size mismatch: expected {expected} entries, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Entry index outside `0..nr`
    #[error("Index {index} out of range for thread map of {nr} entries")]
    IndexOutOfRange { index: usize, nr: usize },

    /// The thread map factory could not allocate a map
    #[error("Allocation error: {0}")]
    Allocation(String),

    /// A type could not be registered with the hosting module
    #[error("Registration error: {0}")]
    Registration(String),

    /// The thread map was never allocated or has already been released
    #[error("Thread map has no allocation")]
    Released,
}

#[cfg(feature = "python")]
pyo3::create_exception!(
    libperf,
    ThreadMapReleasedError,
    pyo3::exceptions::PyRuntimeError,
    "Raised when a thread map, or a view onto one, is used without an allocation."
);

#[cfg(feature = "python")]
impl From<LibperfError> for pyo3::PyErr {
    fn from(err: LibperfError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyIndexError, PyMemoryError, PyRuntimeError, PyTypeError, PyValueError};

        let msg = err.to_string();
        match err {
            LibperfError::TypeMismatch { .. } => PyTypeError::new_err(msg),
            LibperfError::SizeMismatch { .. } => PyValueError::new_err(msg),
            LibperfError::IndexOutOfRange { .. } => PyIndexError::new_err(msg),
            LibperfError::Allocation(_) => PyMemoryError::new_err(msg),
            LibperfError::Released => ThreadMapReleasedError::new_err(msg),
            LibperfError::Registration(_) => PyRuntimeError::new_err(msg),
        }
    }
}
