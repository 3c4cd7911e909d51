//! Test fixtures and I/O helpers.

use flate2::read::GzDecoder;
use recordlog_core::{CompressError, CompressionCodec, ManualTimeSource, RollingConfig};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Epoch milliseconds used as the start of rolling tests.
pub const TEST_EPOCH_MILLIS: i64 = 1_700_000_000_000;

/// A temporary directory for rolling logs with a manual clock.
pub struct TempLogDir {
    dir: TempDir,
    /// The clock handed to every config built from this fixture.
    pub clock: Arc<ManualTimeSource>,
}

impl TempLogDir {
    /// Creates an empty directory with the clock at [`TEST_EPOCH_MILLIS`].
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            clock: ManualTimeSource::shared(TEST_EPOCH_MILLIS),
        }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Base path `<dir>/<name>` for rolling output.
    pub fn base(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Rolling configuration over `<dir>/<name>` driven by the fixture clock.
    ///
    /// Uses a long close timeout so tests never race the compression worker.
    pub fn rolling_config(&self, name: &str) -> RollingConfig {
        RollingConfig::new(self.base(name), self.clock.clone())
            .close_timeout(Duration::from_secs(30))
    }

    /// Advances the fixture clock.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Sorted file names in the directory.
    pub fn file_names(&self) -> Vec<String> {
        list_logs(self.path())
            .into_iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect()
    }
}

impl Default for TempLogDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted regular files directly under `dir`.
pub fn list_logs(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .expect("Failed to read log directory")
        .map(|entry| entry.expect("Failed to read directory entry").path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    paths
}

/// Decompresses a `.gz` file.
pub fn gunzip(path: &Path) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(File::open(path).expect("Failed to open gzip file"))
        .read_to_end(&mut out)
        .expect("Failed to decompress gzip file");
    out
}

/// Extracts the single entry of a `.zip` file as `(name, bytes)`.
pub fn unzip(path: &Path) -> (String, Vec<u8>) {
    let file = File::open(path).expect("Failed to open zip file");
    let mut archive = zip::ZipArchive::new(file).expect("Failed to read zip archive");
    assert_eq!(archive.len(), 1, "expected a single entry");
    let mut entry = archive.by_index(0).expect("Failed to open zip entry");
    let mut out = Vec::new();
    entry
        .read_to_end(&mut out)
        .expect("Failed to decompress zip entry");
    (entry.name().to_string(), out)
}

/// Contents of a log file, decompressed according to its extension.
pub fn read_log_bytes(path: &Path) -> Vec<u8> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => gunzip(path),
        Some("zip") => unzip(path).1,
        _ => fs::read(path).expect("Failed to read log file"),
    }
}

/// A reader that returns at most `chunk` bytes per call.
pub struct ChunkedReader<R> {
    inner: R,
    chunk: usize,
}

impl<R: Read> ChunkedReader<R> {
    /// Wraps `inner`, limiting each read to `chunk` bytes (at least one).
    pub fn new(inner: R, chunk: usize) -> Self {
        Self {
            inner,
            chunk: chunk.max(1),
        }
    }
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk);
        self.inner.read(&mut buf[..n])
    }
}

/// A writer that fails every write after the first `ok_writes`.
#[derive(Debug, Clone, Default)]
pub struct FailingWriter {
    ok_writes: usize,
    writes: Arc<AtomicUsize>,
}

impl FailingWriter {
    /// Creates a writer that accepts `ok_writes` writes and then fails.
    pub fn after(ok_writes: usize) -> Self {
        Self {
            ok_writes,
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of write calls seen so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let seen = self.writes.fetch_add(1, Ordering::SeqCst);
        if seen < self.ok_writes {
            Ok(buf.len())
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "simulated write failure"))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A compression codec that writes a partial archive and then fails.
#[derive(Debug, Default)]
pub struct FailingCodec {
    attempts: AtomicUsize,
}

impl FailingCodec {
    /// Creates a new failing codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compressions attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl CompressionCodec for FailingCodec {
    fn extension(&self) -> &str {
        ".gz"
    }

    fn encode(&self, source: &Path, target: &mut File) -> Result<(), CompressError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        target
            .write_all(b"\x1f\x8b partial")
            .map_err(|e| CompressError::io(source, e))?;
        Err(CompressError::io(
            source,
            io::Error::new(io::ErrorKind::Other, "simulated compression failure"),
        ))
    }
}
