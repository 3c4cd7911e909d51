//! Time-based rolling output.
//!
//! The manager owns the single live output file and replaces it when its
//! interval has elapsed:
//!
//! ```text
//! NoFile --first write--> Open --interval elapsed--> (retire, open) --> Open
//!    \                      |
//!     `-------close()-------`--> Closed
//! ```
//!
//! Retired files are handed to one background worker thread that compresses
//! them in order. Rotation never waits for it. On close the manager waits a
//! bounded time for the worker and then detaches it.

use crate::compress::Compressor;
use crate::config::RollingConfig;
use crate::error::{CoreError, CoreResult};
use crate::naming::{first_free_path, format_timestamp, with_appended};
use crate::stats::SinkStats;
use recordlog_storage::{DiscardTarget, FileTarget, LogTarget};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Outcome of closing rolling output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStatus {
    /// Everything was flushed and all compression finished.
    Clean,
    /// The close timeout elapsed with compression still running.
    ///
    /// The worker keeps going in the background; `pending` files had not
    /// been compressed yet when close returned.
    CompressionDetached {
        /// Retired files not yet compressed.
        pending: usize,
    },
}

impl CloseStatus {
    /// Returns true if nothing was left running.
    pub fn is_clean(self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// The live output target of a rolling manager.
pub struct RollingFileState {
    target: Box<dyn LogTarget>,
    path: Option<PathBuf>,
    anchor_millis: i64,
}

impl RollingFileState {
    /// Path of the open file, or `None` when writes are being discarded
    /// after an open failure.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Start of the interval this file covers, in epoch milliseconds.
    pub fn anchor_millis(&self) -> i64 {
        self.anchor_millis
    }
}

impl std::fmt::Debug for RollingFileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollingFileState")
            .field("path", &self.path)
            .field("anchor_millis", &self.anchor_millis)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum ManagerState {
    NoFile,
    Open(RollingFileState),
    Closed,
}

/// Owns the active output file and rotates it on a time interval.
///
/// Not internally synchronized: [`crate::LogSink`] calls it under its lock,
/// which is what keeps rotation from racing a write.
#[derive(Debug)]
pub struct RollingFileManager {
    config: RollingConfig,
    interval_millis: i64,
    state: ManagerState,
    compressor: Option<Compressor>,
    worker: Option<CompressionWorker>,
    stats: Arc<SinkStats>,
}

impl RollingFileManager {
    /// Creates a manager using the compressor for the configured kind.
    ///
    /// No file is opened until the first call to [`Self::target`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: RollingConfig, stats: Arc<SinkStats>) -> CoreResult<Self> {
        let compressor = Compressor::for_kind(config.compression);
        Self::with_compressor(config, compressor, stats)
    }

    /// Creates a manager with an explicit compressor, overriding the
    /// configured kind.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is invalid.
    pub fn with_compressor(
        config: RollingConfig,
        compressor: Option<Compressor>,
        stats: Arc<SinkStats>,
    ) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            interval_millis: config.interval_millis(),
            config,
            state: ManagerState::NoFile,
            compressor,
            worker: None,
            stats,
        })
    }

    /// Returns the target for the next write, opening or rotating first.
    ///
    /// Never fails because of the file system: if a file cannot be opened,
    /// writes go to a discard target until the next rotation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] after [`Self::close`].
    pub fn target(&mut self) -> CoreResult<&mut dyn LogTarget> {
        let now = self.config.time_source.now_millis();

        let next_anchor = match &self.state {
            ManagerState::Closed => {
                return Err(CoreError::invalid_operation(
                    "rolling output is closed",
                ))
            }
            ManagerState::NoFile => Some(now),
            ManagerState::Open(current) => {
                let elapsed = now.saturating_sub(current.anchor_millis);
                (elapsed >= self.interval_millis).then(|| {
                    current.anchor_millis + (elapsed / self.interval_millis) * self.interval_millis
                })
            }
        };
        if let Some(anchor) = next_anchor {
            self.rotate(anchor);
        }

        match &mut self.state {
            ManagerState::Open(current) => Ok(current.target.as_mut()),
            _ => Err(CoreError::invalid_operation("no active output file")),
        }
    }

    /// Returns the live file state, if a file is open.
    pub fn current(&self) -> Option<&RollingFileState> {
        match &self.state {
            ManagerState::Open(current) => Some(current),
            _ => None,
        }
    }

    /// Path of the live file, if one is open.
    pub fn current_path(&self) -> Option<&Path> {
        self.current().and_then(RollingFileState::path)
    }

    /// Returns true once [`Self::close`] has run.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, ManagerState::Closed)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Retired files handed to the worker and not yet compressed.
    pub fn pending_compressions(&self) -> usize {
        self.worker.as_ref().map_or(0, CompressionWorker::pending)
    }

    /// Closes the live file and shuts down compression.
    ///
    /// The live file is compressed too if `compress_on_close` is set. Waits
    /// at most `close_timeout` for compression to finish, then detaches.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if already closed.
    pub fn close(&mut self) -> CoreResult<CloseStatus> {
        let previous = std::mem::replace(&mut self.state, ManagerState::Closed);
        match previous {
            ManagerState::Closed => {
                return Err(CoreError::invalid_operation(
                    "rolling output is already closed",
                ))
            }
            ManagerState::NoFile => {}
            ManagerState::Open(current) => {
                let compress = self.config.compress_on_close;
                self.retire(current, compress);
            }
        }

        let Some(worker) = self.worker.take() else {
            return Ok(CloseStatus::Clean);
        };
        Ok(worker.shutdown(self.config.close_timeout))
    }

    /// Opens the file for `anchor` and retires the previous one, if any.
    fn rotate(&mut self, anchor: i64) {
        let next = self.open_file(anchor);
        let previous = std::mem::replace(&mut self.state, ManagerState::Open(next));
        if let ManagerState::Open(retired) = previous {
            tracing::debug!(
                retired = ?retired.path,
                current = ?self.current_path(),
                "rotated log file"
            );
            self.stats.record_rotation();
            self.retire(retired, true);
        }
    }

    fn open_file(&self, anchor: i64) -> RollingFileState {
        let mut leading = OsString::from(self.config.base_path.as_os_str());
        leading.push("_");
        leading.push(format_timestamp(anchor));

        let path = first_free_path(Path::new(&leading), &self.config.suffix, is_taken);
        match FileTarget::create_new(&path) {
            Ok(target) => {
                tracing::debug!(path = %path.display(), "opened log file");
                RollingFileState {
                    target: Box::new(target),
                    path: Some(path),
                    anchor_millis: anchor,
                }
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "unable to open log file, discarding records until next rotation"
                );
                self.stats.record_open_failure();
                RollingFileState {
                    target: Box::new(DiscardTarget::new()),
                    path: None,
                    anchor_millis: anchor,
                }
            }
        }
    }

    fn retire(&mut self, mut state: RollingFileState, compress: bool) {
        if let Err(e) = state.target.close() {
            tracing::error!(path = ?state.path, error = %e, "unable to close log file");
        }
        let Some(path) = state.path else {
            return;
        };
        if !compress {
            return;
        }
        let Some(compressor) = self.compressor.clone() else {
            return;
        };

        if self.worker.is_none() {
            match CompressionWorker::spawn(compressor, Arc::clone(&self.stats)) {
                Ok(worker) => self.worker = Some(worker),
                Err(e) => {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "unable to start compression worker, leaving file uncompressed"
                    );
                    self.stats.record_compression(false);
                    return;
                }
            }
        }
        if let Some(worker) = &self.worker {
            worker.submit(path);
        }
    }
}

impl Drop for RollingFileManager {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Ok(CloseStatus::CompressionDetached { pending }) = self.close() {
                tracing::warn!(pending, "dropped rolling output with compression still running");
            }
        }
    }
}

/// A generated name is taken if the file or any of its archives exist.
fn is_taken(path: &Path) -> bool {
    path.exists()
        || with_appended(path, ".gz").exists()
        || with_appended(path, ".zip").exists()
}

/// Background thread that compresses retired files one at a time.
#[derive(Debug)]
struct CompressionWorker {
    sender: Sender<PathBuf>,
    done: Receiver<()>,
    handle: JoinHandle<()>,
    pending: Arc<AtomicUsize>,
}

impl CompressionWorker {
    fn spawn(compressor: Compressor, stats: Arc<SinkStats>) -> std::io::Result<Self> {
        let (sender, queue) = mpsc::channel::<PathBuf>();
        let (done_tx, done) = mpsc::channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        let handle = thread::Builder::new()
            .name("recordlog-compress".to_string())
            .spawn(move || {
                for path in queue {
                    match compressor.compress(&path) {
                        Ok(done) => {
                            tracing::debug!(
                                source = %path.display(),
                                target = %done.path.display(),
                                original_size = done.original_size,
                                compressed_size = done.compressed_size,
                                "compressed log file"
                            );
                            stats.record_compression(true);
                        }
                        Err(e) => {
                            tracing::error!(
                                path = %path.display(),
                                error = %e,
                                "unable to compress log file"
                            );
                            stats.record_compression(false);
                        }
                    }
                    worker_pending.fetch_sub(1, Ordering::SeqCst);
                }
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            sender,
            done,
            handle,
            pending,
        })
    }

    fn submit(&self, path: PathBuf) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::SendError(path)) = self.sender.send(path) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            tracing::error!(path = %path.display(), "compression worker has stopped");
        }
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn shutdown(self, timeout: std::time::Duration) -> CloseStatus {
        let Self {
            sender,
            done,
            handle,
            pending,
        } = self;
        drop(sender);

        match done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    tracing::error!("compression worker panicked");
                }
                CloseStatus::Clean
            }
            Err(RecvTimeoutError::Timeout) => {
                let pending = pending.load(Ordering::SeqCst);
                tracing::warn!(
                    pending,
                    timeout_ms = timeout.as_millis() as u64,
                    "compression still running at close, detaching worker"
                );
                CloseStatus::CompressionDetached { pending }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionKind;
    use crate::time::ManualTimeSource;
    use std::time::Duration;
    use tempfile::tempdir;

    const T0: i64 = 1_700_000_000_000;

    fn manager(base: &Path, clock: &Arc<ManualTimeSource>, kind: CompressionKind) -> RollingFileManager {
        let config = RollingConfig::new(base, clock.clone())
            .interval(Duration::from_secs(10))
            .compression(kind)
            .close_timeout(Duration::from_secs(10));
        RollingFileManager::new(config, Arc::new(SinkStats::new())).unwrap()
    }

    fn expected_name(base: &Path, anchor: i64, suffix: &str) -> PathBuf {
        let mut name = OsString::from(base.as_os_str());
        name.push(format!("_{}{suffix}", format_timestamp(anchor)));
        PathBuf::from(name)
    }

    #[test]
    fn no_file_until_first_write() {
        let dir = tempdir().unwrap();
        let clock = ManualTimeSource::shared(T0);
        let mut m = manager(&dir.path().join("m"), &clock, CompressionKind::None);
        assert!(m.current().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        m.target().unwrap().append(b"{}\n").unwrap();
        let path = m.current_path().unwrap().to_path_buf();
        assert_eq!(path, expected_name(&dir.path().join("m"), T0, ".log"));
        assert_eq!(m.current().unwrap().anchor_millis(), T0);
    }

    #[test]
    fn rotates_on_interval_boundary() {
        let dir = tempdir().unwrap();
        let clock = ManualTimeSource::shared(T0);
        let mut m = manager(&dir.path().join("m"), &clock, CompressionKind::None);

        m.target().unwrap().append(b"1\n").unwrap();
        let first = m.current_path().unwrap().to_path_buf();

        clock.advance(Duration::from_millis(9_999));
        m.target().unwrap().append(b"2\n").unwrap();
        assert_eq!(m.current_path().unwrap(), first);

        clock.advance(Duration::from_millis(1));
        m.target().unwrap().append(b"3\n").unwrap();
        let second = m.current_path().unwrap().to_path_buf();
        assert_ne!(second, first);
        assert_eq!(m.current().unwrap().anchor_millis(), T0 + 10_000);

        assert_eq!(m.close().unwrap(), CloseStatus::Clean);
        assert_eq!(std::fs::read(&first).unwrap(), b"1\n2\n");
        assert_eq!(std::fs::read(&second).unwrap(), b"3\n");
    }

    #[test]
    fn anchor_skips_idle_intervals() {
        let dir = tempdir().unwrap();
        let clock = ManualTimeSource::shared(T0);
        let mut m = manager(&dir.path().join("m"), &clock, CompressionKind::None);

        m.target().unwrap();
        clock.advance(Duration::from_millis(35_500));
        m.target().unwrap();
        assert_eq!(m.current().unwrap().anchor_millis(), T0 + 30_000);
    }

    #[test]
    fn name_collision_gets_index() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("m");
        std::fs::write(expected_name(&base, T0, ".log"), b"other").unwrap();
        std::fs::write(
            with_appended(&expected_name(&base, T0, "_1.log"), ".gz"),
            b"older",
        )
        .unwrap();

        let clock = ManualTimeSource::shared(T0);
        let mut m = manager(&base, &clock, CompressionKind::None);
        m.target().unwrap();
        assert_eq!(m.current_path().unwrap(), expected_name(&base, T0, "_2.log"));
    }

    #[test]
    fn open_failure_falls_back_to_discard() {
        let dir = tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();

        let clock = ManualTimeSource::shared(T0);
        let stats = Arc::new(SinkStats::new());
        let config = RollingConfig::new(blocker.join("m"), clock.clone())
            .compression(CompressionKind::None);
        let mut m = RollingFileManager::new(config, Arc::clone(&stats)).unwrap();

        assert!(m.target().unwrap().append(b"lost\n").is_ok());
        assert!(m.current().is_some());
        assert!(m.current_path().is_none());
        assert_eq!(stats.open_failures(), 1);
    }

    #[test]
    fn rotated_file_is_compressed_in_background() {
        let dir = tempdir().unwrap();
        let clock = ManualTimeSource::shared(T0);
        let mut m = manager(&dir.path().join("m"), &clock, CompressionKind::Gzip);

        m.target().unwrap().append(b"{\"a\":1}\n").unwrap();
        let first = m.current_path().unwrap().to_path_buf();
        clock.advance(Duration::from_secs(10));
        m.target().unwrap().append(b"{\"a\":2}\n").unwrap();
        let second = m.current_path().unwrap().to_path_buf();

        assert_eq!(m.close().unwrap(), CloseStatus::Clean);
        assert!(!first.exists());
        assert!(with_appended(&first, ".gz").exists());
        assert_eq!(std::fs::read(&second).unwrap(), b"{\"a\":2}\n");
        assert!(!with_appended(&second, ".gz").exists());
        assert_eq!(m.pending_compressions(), 0);
    }

    #[test]
    fn close_leaves_last_file_plain() {
        let dir = tempdir().unwrap();
        let clock = ManualTimeSource::shared(T0);
        let stats = Arc::new(SinkStats::new());
        let config = RollingConfig::new(dir.path().join("m"), clock.clone());
        let mut m = RollingFileManager::new(config, Arc::clone(&stats)).unwrap();

        m.target().unwrap().append(b"x\n").unwrap();
        let path = m.current_path().unwrap().to_path_buf();
        assert_eq!(m.close().unwrap(), CloseStatus::Clean);
        assert_eq!(std::fs::read(&path).unwrap(), b"x\n");
        assert!(!with_appended(&path, ".gz").exists());
        assert_eq!(stats.compressions_completed(), 0);
    }

    #[test]
    fn close_compresses_last_file_when_asked() {
        let dir = tempdir().unwrap();
        let clock = ManualTimeSource::shared(T0);
        let config = RollingConfig::new(dir.path().join("m"), clock.clone())
            .close_timeout(Duration::from_secs(10))
            .compress_on_close(true);
        let mut m = RollingFileManager::new(config, Arc::new(SinkStats::new())).unwrap();

        m.target().unwrap().append(b"x\n").unwrap();
        let path = m.current_path().unwrap().to_path_buf();
        assert_eq!(m.close().unwrap(), CloseStatus::Clean);
        assert!(!path.exists());
        assert!(with_appended(&path, ".gz").exists());
    }

    #[test]
    fn close_twice_is_an_error() {
        let dir = tempdir().unwrap();
        let clock = ManualTimeSource::shared(T0);
        let mut m = manager(&dir.path().join("m"), &clock, CompressionKind::None);

        assert_eq!(m.close().unwrap(), CloseStatus::Clean);
        assert!(m.close().unwrap_err().is_invalid_operation());
        assert!(m.target().is_err());
    }
}
