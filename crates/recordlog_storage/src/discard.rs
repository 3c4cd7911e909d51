//! Log target that drops everything.

use crate::backend::LogTarget;
use crate::error::StorageResult;

/// Accepts every write and keeps nothing.
///
/// Rolling output falls back to this when a file cannot be opened, so the
/// writer path keeps working until the next rotation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardTarget {
    discarded: u64,
}

impl DiscardTarget {
    /// Creates a new discard target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes dropped so far.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl LogTarget for DiscardTarget {
    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.discarded;
        self.discarded += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(0)
    }

    fn close(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn is_discarding(&self) -> bool {
        true
    }
}
