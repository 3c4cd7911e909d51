//! In-memory log target for testing.

use crate::backend::LogTarget;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// A log target that collects bytes in a shared buffer.
///
/// Clones share the same buffer, so a test can hand one clone to a sink and
/// inspect the other.
///
/// # Example
///
/// ```rust
/// use recordlog_storage::{LogTarget, MemoryTarget};
///
/// let target = MemoryTarget::new();
/// let mut handle = target.clone();
/// handle.append(b"line\n").unwrap();
/// assert_eq!(target.contents(), b"line\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    data: Arc<Mutex<Vec<u8>>>,
    closed: bool,
}

impl MemoryTarget {
    /// Creates a new empty in-memory target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    /// Returns the written bytes as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data.lock()).into_owned()
    }

    /// Clears all data from the shared buffer.
    pub fn clear(&self) {
        self.data.lock().clear();
    }
}

impl LogTarget for MemoryTarget {
    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        let mut data = self.data.lock();
        let offset = data.len() as u64;
        data.extend_from_slice(new_data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.lock().len() as u64)
    }

    fn close(&mut self) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        self.closed = true;
        Ok(())
    }
}
