//! Library initialization, print levels and configuration
//!
//! # Usage
//! ```python
//! import libperf
//!
//! # Default sink: messages go to stderr
//! libperf.libperf_init()
//!
//! # Or route them to Python
//! libperf.libperf_init(lambda level, msg: print(level, msg, end=""))
//!
//! # Show debug messages as well
//! libperf.configure(verbosity=libperf.PrintLevel.DEBUG)
//! ```

use std::fmt;
use std::sync::Arc;

use libperf_common::LibperfError;
use libperf_core::{get_config, set_config, stderr_print, tracing_print, PrintFn, PrintLevel};
use pyo3::prelude::*;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Severity of a libperf diagnostic, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[pyclass(name = "PrintLevel", module = "libperf", eq, eq_int)]
pub enum PyPrintLevel {
    #[pyo3(name = "ERR")]
    Err = 0,
    #[pyo3(name = "WARN")]
    Warn = 1,
    #[pyo3(name = "INFO")]
    Info = 2,
    #[pyo3(name = "DEBUG")]
    Debug = 3,
    #[pyo3(name = "DEBUG2")]
    Debug2 = 4,
    #[pyo3(name = "DEBUG3")]
    Debug3 = 5,
}

impl From<PrintLevel> for PyPrintLevel {
    fn from(level: PrintLevel) -> Self {
        match level {
            PrintLevel::Err => Self::Err,
            PrintLevel::Warn => Self::Warn,
            PrintLevel::Info => Self::Info,
            PrintLevel::Debug => Self::Debug,
            PrintLevel::Debug2 => Self::Debug2,
            PrintLevel::Debug3 => Self::Debug3,
        }
    }
}

impl From<PyPrintLevel> for PrintLevel {
    fn from(level: PyPrintLevel) -> Self {
        match level {
            PyPrintLevel::Err => Self::Err,
            PyPrintLevel::Warn => Self::Warn,
            PyPrintLevel::Info => Self::Info,
            PyPrintLevel::Debug => Self::Debug,
            PyPrintLevel::Debug2 => Self::Debug2,
            PyPrintLevel::Debug3 => Self::Debug3,
        }
    }
}

/// Wraps a Python callable `(level, message)` as a print sink.
///
/// Exceptions raised by the callable are printed and swallowed; the sink
/// then reports -1 bytes written.
fn python_sink(callback: Py<PyAny>) -> PrintFn {
    Arc::new(move |level: PrintLevel, args: fmt::Arguments<'_>| {
        let message = args.to_string();
        let written = i32::try_from(message.len()).unwrap_or(i32::MAX);
        Python::with_gil(|py| {
            match callback.call1(py, (PyPrintLevel::from(level), message)) {
                Ok(_) => written,
                Err(err) => {
                    err.print(py);
                    -1
                }
            }
        })
    })
}

/// Initialize libperf's diagnostic output
///
/// # Arguments
/// * `print` - Optional callable taking `(level: PrintLevel, message: str)`.
///   Without it messages are written to stderr.
#[pyfunction]
#[pyo3(signature = (print = None))]
pub fn libperf_init(py: Python<'_>, print: Option<Py<PyAny>>) -> PyResult<()> {
    let print_fn: PrintFn = match print {
        Some(callback) => {
            let bound = callback.bind(py);
            if !bound.is_callable() {
                return Err(LibperfError::TypeMismatch {
                    expected: "callable",
                    actual: bound.get_type().name()?.to_string(),
                }
                .into());
            }
            python_sink(callback)
        }
        None => Arc::new(stderr_print),
    };
    libperf_core::libperf_init(print_fn);
    Ok(())
}

/// Install a stderr `tracing` subscriber and route libperf messages to it
///
/// Returns False if the process already has a global subscriber; the print
/// sink is switched either way.
#[pyfunction]
#[pyo3(signature = (level = "info"))]
pub fn enable_tracing(level: &str) -> PyResult<bool> {
    let level: Level = level
        .parse()
        .map_err(|_| pyo3::exceptions::PyValueError::new_err(format!("unknown log level: {}", level)))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();

    libperf_core::libperf_init(Arc::new(tracing_print));
    tracing::info!(%level, installed, "libperf tracing enabled");
    Ok(installed)
}

/// Configure libperf
///
/// # Arguments
/// * `verbosity` - Most verbose level passed to the print sink
/// * `warn_unbalanced_refcnt` - Warn when a map is released with live references
#[pyfunction]
#[pyo3(signature = (verbosity = None, warn_unbalanced_refcnt = None))]
pub fn configure(verbosity: Option<PyPrintLevel>, warn_unbalanced_refcnt: Option<bool>) -> PyResult<()> {
    let mut config = get_config();

    if let Some(level) = verbosity {
        config.verbosity = level.into();
    }
    if let Some(warn) = warn_unbalanced_refcnt {
        config.warn_unbalanced_refcnt = warn;
    }

    set_config(config);
    Ok(())
}

/// Current configuration as `(verbosity, warn_unbalanced_refcnt)`
#[pyfunction]
#[pyo3(name = "get_config")]
pub fn get_libperf_config() -> PyResult<(PyPrintLevel, bool)> {
    let config = get_config();
    Ok((config.verbosity.into(), config.warn_unbalanced_refcnt))
}

/// Register init and config functions with Python
pub fn register_functions(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(libperf_init, m)?)?;
    m.add_function(wrap_pyfunction!(enable_tracing, m)?)?;
    m.add_function(wrap_pyfunction!(configure, m)?)?;
    m.add_function(wrap_pyfunction!(get_libperf_config, m)?)?;
    Ok(())
}
