//! Common utilities for libperf
//!
//! This crate provides the error type shared by the core library and the
//! Python bindings.

pub mod error;

pub use error::{LibperfError, Result};
