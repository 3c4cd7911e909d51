//! # recordlog storage
//!
//! Append-only log targets for recordlog.
//!
//! Targets are **opaque byte sinks**: they receive complete encoded lines
//! and know nothing about records, framing or rotation.
//!
//! ## Design Principles
//!
//! - Targets only append, flush and sync
//! - One target has exactly one owner at a time (`Send`, not `Sync`)
//! - The rolling layer decides which target is live
//!
//! ## Available Targets
//!
//! - [`FileTarget`] - A file opened fresh or in append mode
//! - [`MemoryTarget`] - Shared in-memory buffer for tests
//! - [`WriterTarget`] - Any `io::Write`, such as stdout
//! - [`DiscardTarget`] - Drops everything; fallback after an open failure
//!
//! ## Example
//!
//! ```rust
//! use recordlog_storage::{LogTarget, MemoryTarget};
//!
//! let mut target = MemoryTarget::new();
//! let offset = target.append(b"{\"origin\":\"a\"}\n").unwrap();
//! assert_eq!(offset, 0);
//! assert_eq!(target.size().unwrap(), 15);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod discard;
mod error;
mod file;
mod memory;
mod writer;

pub use backend::LogTarget;
pub use discard::DiscardTarget;
pub use error::{StorageError, StorageResult};
pub use file::FileTarget;
pub use memory::MemoryTarget;
pub use writer::WriterTarget;
