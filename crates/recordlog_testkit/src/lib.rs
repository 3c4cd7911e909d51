//! # recordlog testkit
//!
//! Test utilities for recordlog.
//!
//! This crate provides:
//! - Property-based generators for values and records
//! - A temporary log directory with a manual clock
//! - Readers and writers that chunk or fail on demand
//! - A compression codec that always fails
//! - Concurrent write load
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recordlog_testkit::prelude::*;
//!
//! #[test]
//! fn rotates() {
//!     let dir = TempLogDir::new();
//!     let sink = LogSink::rolling(dir.rolling_config("metrics"), SinkConfig::default())?;
//!     // ... write, advance the clock, write again
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
