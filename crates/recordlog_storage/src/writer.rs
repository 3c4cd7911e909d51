//! Log target over any `io::Write`.

use crate::backend::LogTarget;
use crate::error::{StorageError, StorageResult};
use std::io::Write;

/// A log target that forwards to an arbitrary writer.
///
/// Used for fixed streams such as stdout or a socket. `sync` is the same as
/// `flush` because a generic writer has no durability hook.
#[derive(Debug)]
pub struct WriterTarget<W: Write + Send> {
    writer: Option<W>,
    written: u64,
}

impl<W: Write + Send> WriterTarget<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            written: 0,
        }
    }

    /// Returns the wrapped writer, or `None` after close.
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }

    fn writer(&mut self) -> StorageResult<&mut W> {
        self.writer.as_mut().ok_or(StorageError::Closed)
    }
}

impl<W: Write + Send> LogTarget for WriterTarget<W> {
    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.written;
        self.writer()?.write_all(data)?;
        self.written += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.writer()?.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.written)
    }

    fn close(&mut self) -> StorageResult<()> {
        let mut writer = self.writer.take().ok_or(StorageError::Closed)?;
        writer.flush()?;
        Ok(())
    }
}
