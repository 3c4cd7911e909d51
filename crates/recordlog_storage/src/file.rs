//! File-based log target.

use crate::backend::LogTarget;
use crate::error::{StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A log target backed by a file on disk.
///
/// Writes go straight to the file handle. Callers hand over one complete
/// line per `append`, so each record reaches the operating system in a
/// single write.
///
/// # Durability
///
/// - `flush()` calls `File::flush()` to push data to the OS
/// - `sync()` calls `File::sync_all()` to ensure data is on disk
///
/// # Example
///
/// ```no_run
/// use recordlog_storage::{FileTarget, LogTarget};
/// use std::path::Path;
///
/// let mut target = FileTarget::open_append(Path::new("records.log")).unwrap();
/// target.append(b"{\"origin\":\"a\"}\n").unwrap();
/// target.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileTarget {
    path: PathBuf,
    file: Option<File>,
    size: u64,
}

impl FileTarget {
    /// Creates a file that must not already exist.
    ///
    /// Parent directories are created as needed. Rotation uses this so two
    /// sinks never share a generated file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists or cannot be created.
    pub fn create_new(path: &Path) -> StorageResult<Self> {
        create_parent_dirs(path)?;
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            size: 0,
        })
    }

    /// Opens a file for appending, creating it if needed.
    ///
    /// Existing content is kept and new records follow it.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_append(path: &Path) -> StorageResult<Self> {
        create_parent_dirs(path)?;
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            size,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Returns true once the target has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn file(&mut self) -> StorageResult<&mut File> {
        self.file.as_mut().ok_or(StorageError::Closed)
    }
}

fn create_parent_dirs(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

impl LogTarget for FileTarget {
    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size;
        if data.is_empty() {
            return Ok(offset);
        }
        self.file()?.write_all(data)?;
        self.size += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file()?.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file()?.sync_all()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        if self.file.is_none() {
            return Err(StorageError::Closed);
        }
        Ok(self.size)
    }

    fn close(&mut self) -> StorageResult<()> {
        let mut file = self.file.take().ok_or(StorageError::Closed)?;
        file.flush()?;
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
