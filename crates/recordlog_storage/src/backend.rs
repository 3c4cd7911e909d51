//! Log target trait definition.

use crate::error::StorageResult;
use std::path::Path;

/// A byte sink that receives encoded record lines.
///
/// Log targets are **opaque append-only streams**. They do not know about
/// records, lines or rotation; the caller hands them complete lines and
/// decides when a target is retired.
///
/// # Invariants
///
/// - `append` writes all of `data` or returns an error
/// - `append` returns the offset where data was written
/// - After `close` every other operation returns [`StorageError::Closed`]
///
/// # Implementors
///
/// - [`super::FileTarget`] - A file on disk
/// - [`super::MemoryTarget`] - A shared in-memory buffer
/// - [`super::WriterTarget`] - Any [`std::io::Write`]
/// - [`super::DiscardTarget`] - Accepts and drops everything
///
/// [`StorageError::Closed`]: crate::StorageError::Closed
pub trait LogTarget: Send {
    /// Appends data to the end of the target.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs or the target is closed.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered bytes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the number of bytes written so far.
    ///
    /// For a file opened in append mode this includes pre-existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Flushes and releases the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    fn close(&mut self) -> StorageResult<()> {
        self.flush()
    }

    /// Path of the backing file, if any.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Returns true if appended bytes are thrown away.
    fn is_discarding(&self) -> bool {
        false
    }
}
