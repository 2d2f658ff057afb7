//! Diagnostic print sink
//!
//! The library reports problems through a single process-wide sink. Hosts
//! replace it with [`libperf_init`]; until then messages go to stderr.
//! Messages above the configured verbosity (see [`crate::config`]) are
//! dropped before the sink is called.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::config::get_config;

/// Severity of a diagnostic message, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrintLevel {
    Err = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Debug2 = 4,
    Debug3 = 5,
}

impl PrintLevel {
    /// Returns the level name as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Err => "ERR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Debug2 => "DEBUG2",
            Self::Debug3 => "DEBUG3",
        }
    }

    /// Level from its numeric value, if in range
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Err),
            1 => Some(Self::Warn),
            2 => Some(Self::Info),
            3 => Some(Self::Debug),
            4 => Some(Self::Debug2),
            5 => Some(Self::Debug3),
            _ => None,
        }
    }
}

impl fmt::Display for PrintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A diagnostic sink: receives the level and the formatted message, returns
/// the number of bytes written.
pub type PrintFn = Arc<dyn Fn(PrintLevel, fmt::Arguments<'_>) -> i32 + Send + Sync>;

static PRINT_FN: Lazy<RwLock<PrintFn>> = Lazy::new(|| {
    let default_fn: PrintFn = Arc::new(stderr_print);
    RwLock::new(default_fn)
});

/// Default sink: writes the message to stderr unchanged.
pub fn stderr_print(_level: PrintLevel, args: fmt::Arguments<'_>) -> i32 {
    let msg = args.to_string();
    eprint!("{}", msg);
    i32::try_from(msg.len()).unwrap_or(i32::MAX)
}

/// Sink that forwards messages to `tracing` at the matching level.
pub fn tracing_print(level: PrintLevel, args: fmt::Arguments<'_>) -> i32 {
    let msg = args.to_string();
    let msg = msg.trim_end();
    match level {
        PrintLevel::Err => tracing::error!(target: "libperf", "{}", msg),
        PrintLevel::Warn => tracing::warn!(target: "libperf", "{}", msg),
        PrintLevel::Info => tracing::info!(target: "libperf", "{}", msg),
        PrintLevel::Debug => tracing::debug!(target: "libperf", "{}", msg),
        PrintLevel::Debug2 | PrintLevel::Debug3 => tracing::trace!(target: "libperf", "{}", msg),
    }
    i32::try_from(msg.len()).unwrap_or(i32::MAX)
}

/// Installs `print_fn` as the library's diagnostic sink.
///
/// May be called again to replace the sink.
pub fn libperf_init(print_fn: PrintFn) {
    *PRINT_FN.write() = print_fn;
    tracing::debug!("libperf print sink installed");
}

/// Sends a message to the installed sink, honouring the configured verbosity.
///
/// Returns what the sink returned, or 0 if the message was filtered out.
pub fn libperf_print(level: PrintLevel, args: fmt::Arguments<'_>) -> i32 {
    if level > get_config().verbosity {
        return 0;
    }
    // Clone out of the lock so a sink may call back into libperf_init.
    let print_fn = Arc::clone(&PRINT_FN.read());
    print_fn(level, args)
}

#[macro_export]
macro_rules! pr_err {
    ($($arg:tt)*) => {
        $crate::print::libperf_print($crate::print::PrintLevel::Err, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_warning {
    ($($arg:tt)*) => {
        $crate::print::libperf_print($crate::print::PrintLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_info {
    ($($arg:tt)*) => {
        $crate::print::libperf_print($crate::print::PrintLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_debug {
    ($($arg:tt)*) => {
        $crate::print::libperf_print($crate::print::PrintLevel::Debug, format_args!($($arg)*))
    };
}
