//! Record sinks.
//!
//! A sink turns one [`Record`] into one line of output. Writes from many
//! threads are serialized by a single lock per sink, so lines never
//! interleave and rotation never splits a record across two files.
//!
//! Recording must not disturb the application: I/O failures are logged and
//! the record is dropped. Only misuse reaches the caller (writing to a closed
//! sink, or a value the wire format cannot express).

use crate::cache::{CacheStatsSnapshot, RecordCache};
use crate::compress::Compressor;
use crate::config::{RollingConfig, SinkConfig};
use crate::error::{CoreError, CoreResult};
use crate::names;
use crate::rolling::{CloseStatus, RollingFileManager};
use crate::stats::SinkStats;
use parking_lot::{Mutex, RwLock};
use recordlog_codec::{JsonEncoder, Record, Value};
use recordlog_storage::{FileTarget, LogTarget, WriterTarget};
use std::backtrace::Backtrace;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Destination for finished records.
pub trait RecordSink: Send + Sync {
    /// Writes one record as one line.
    ///
    /// The record is recycled afterwards whether or not the write reached
    /// the output.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] after close, or
    /// [`CoreError::Codec`] if the record holds a value the wire format
    /// cannot express. I/O failures are not returned.
    fn write(&self, record: Record) -> CoreResult<()>;

    /// Reports that `key` was inserted into `record` more than once.
    ///
    /// Diagnostic only; the record is not modified.
    fn report_duplicate_entry(&self, record: &Record, key: &str);

    /// Returns an empty record, recycled when possible.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] after close.
    fn new_record(&self) -> CoreResult<Record>;

    /// Flushes and releases the output. Allowed exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if already closed.
    fn close(&self) -> CoreResult<CloseStatus>;

    /// Returns true once the sink has been closed.
    fn is_closed(&self) -> bool;
}

enum Output {
    Fixed(Box<dyn LogTarget>),
    Rolling(RollingFileManager),
}

struct SinkInner {
    closed: bool,
    output: Output,
    encoder: JsonEncoder,
    sync_on_write: bool,
}

impl SinkInner {
    /// Obtains the target (rotating if due), encodes and appends one line.
    fn write_line(&mut self, record: &Record, stats: &SinkStats) -> CoreResult<()> {
        let SinkInner {
            output,
            encoder,
            sync_on_write,
            ..
        } = self;

        let target: &mut dyn LogTarget = match output {
            Output::Fixed(target) => target.as_mut(),
            Output::Rolling(manager) => manager.target()?,
        };

        encoder.clear();
        encoder.encode_record_line(record)?;
        let line = encoder.as_bytes();

        let result = target.append(line).and_then(|_| {
            target.flush()?;
            if *sync_on_write {
                target.sync()?;
            }
            Ok(())
        });

        match result {
            Ok(()) if target.is_discarding() => stats.record_discard(),
            Ok(()) => stats.record_write(line.len() as u64),
            Err(e) => {
                tracing::error!(
                    path = ?target.path(),
                    error = %e,
                    "unable to write record, dropping it"
                );
                stats.record_drop();
            }
        }
        Ok(())
    }
}

/// A sink writing JSON lines to a fixed target or to rolling files.
///
/// # Example
///
/// ```rust,no_run
/// use recordlog_core::{LogSink, RecordSink, RollingConfig, SinkConfig, SystemTimeSource};
///
/// let config = RollingConfig::new("logs/metrics", SystemTimeSource::shared());
/// let sink = LogSink::rolling(config, SinkConfig::default())?;
///
/// let mut record = sink.new_record()?;
/// record.put("origin", "checkout");
/// record.put("timeDelta", 42);
/// sink.write(record)?;
///
/// sink.close()?;
/// # Ok::<(), recordlog_core::CoreError>(())
/// ```
pub struct LogSink {
    inner: Mutex<SinkInner>,
    cache: RwLock<Option<Arc<RecordCache>>>,
    closed: AtomicBool,
    stats: Arc<SinkStats>,
}

impl LogSink {
    /// Creates a sink over time-rotated files.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is invalid.
    pub fn rolling(config: RollingConfig, sink_config: SinkConfig) -> CoreResult<Self> {
        let compressor = Compressor::for_kind(config.compression);
        Self::rolling_with_compressor(config, compressor, sink_config)
    }

    /// Creates a sink over time-rotated files with an explicit compressor.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is invalid.
    pub fn rolling_with_compressor(
        config: RollingConfig,
        compressor: Option<Compressor>,
        sink_config: SinkConfig,
    ) -> CoreResult<Self> {
        let sync_on_write = config.sync_on_write || sink_config.sync_on_write;
        let stats = Arc::new(SinkStats::new());
        let manager = RollingFileManager::with_compressor(config, compressor, Arc::clone(&stats))?;
        Ok(Self::from_output(
            Output::Rolling(manager),
            sink_config,
            sync_on_write,
            stats,
        ))
    }

    /// Creates a sink over a single target.
    pub fn to_target(target: Box<dyn LogTarget>, sink_config: SinkConfig) -> Self {
        Self::from_output(
            Output::Fixed(target),
            sink_config,
            sink_config.sync_on_write,
            Arc::new(SinkStats::new()),
        )
    }

    /// Creates a sink appending to one file, without rotation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn append_to_file(path: &Path, sink_config: SinkConfig) -> CoreResult<Self> {
        let target = FileTarget::open_append(path)?;
        Ok(Self::to_target(Box::new(target), sink_config))
    }

    /// Creates a sink over any writer, such as stdout.
    pub fn to_writer<W: Write + Send + 'static>(writer: W, sink_config: SinkConfig) -> Self {
        Self::to_target(Box::new(WriterTarget::new(writer)), sink_config)
    }

    fn from_output(
        output: Output,
        sink_config: SinkConfig,
        sync_on_write: bool,
        stats: Arc<SinkStats>,
    ) -> Self {
        Self {
            inner: Mutex::new(SinkInner {
                closed: false,
                output,
                encoder: JsonEncoder::with_capacity(256),
                sync_on_write,
            }),
            cache: RwLock::new(Some(Arc::new(RecordCache::new(
                sink_config.cache_capacity,
            )))),
            closed: AtomicBool::new(false),
            stats,
        }
    }

    /// Returns the sink counters.
    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }

    /// Returns the record cache counters, or `None` after close.
    pub fn cache_stats(&self) -> Option<CacheStatsSnapshot> {
        self.cache.read().as_ref().map(|c| c.stats().snapshot())
    }

    /// Path of the file currently receiving records, if any.
    pub fn current_path(&self) -> Option<PathBuf> {
        let inner = self.inner.lock();
        match &inner.output {
            Output::Fixed(target) => target.path().map(Path::to_path_buf),
            Output::Rolling(manager) => manager.current_path().map(Path::to_path_buf),
        }
    }

    fn recycle(&self, record: Record) {
        if let Some(cache) = self.cache.read().as_ref() {
            cache.take(record);
        }
    }

    fn closed_error() -> CoreError {
        CoreError::invalid_operation("record sink is closed")
    }
}

impl RecordSink for LogSink {
    fn write(&self, record: Record) -> CoreResult<()> {
        let result = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(Self::closed_error());
            }
            inner.write_line(&record, &self.stats)
        };
        self.recycle(record);
        result
    }

    fn report_duplicate_entry(&self, record: &Record, key: &str) {
        self.stats.record_duplicate();
        if !tracing::enabled!(tracing::Level::ERROR) {
            return;
        }
        let backtrace = Backtrace::force_capture();
        tracing::error!(
            key,
            previous = ?record.get(key),
            backtrace = %backtrace,
            "duplicate entry in record, last value wins"
        );
    }

    fn new_record(&self) -> CoreResult<Record> {
        match self.cache.read().as_ref() {
            Some(cache) if !self.closed.load(Ordering::Acquire) => Ok(cache.fetch_or_new()),
            _ => Err(Self::closed_error()),
        }
    }

    fn close(&self) -> CoreResult<CloseStatus> {
        let status = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(CoreError::invalid_operation("record sink is already closed"));
            }
            inner.closed = true;
            self.closed.store(true, Ordering::Release);

            match &mut inner.output {
                Output::Fixed(target) => {
                    if let Err(e) = target.close() {
                        tracing::error!(path = ?target.path(), error = %e, "unable to close log target");
                    }
                    CloseStatus::Clean
                }
                Output::Rolling(manager) => manager.close()?,
            }
        };

        *self.cache.write() = None;
        Ok(status)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "failed to close record sink on drop");
            }
        }
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("closed", &self.is_closed())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

/// A sink that accepts and discards everything.
///
/// Used when recording is disabled. It keeps the same state rules as
/// [`LogSink`]: it can be closed once, and rejects use afterwards.
#[derive(Debug, Default)]
pub struct NullSink {
    closed: AtomicBool,
}

impl NullSink {
    /// Creates a new null sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for NullSink {
    fn write(&self, _record: Record) -> CoreResult<()> {
        if self.is_closed() {
            return Err(CoreError::invalid_operation("record sink is closed"));
        }
        Ok(())
    }

    fn report_duplicate_entry(&self, _record: &Record, _key: &str) {}

    fn new_record(&self) -> CoreResult<Record> {
        if self.is_closed() {
            return Err(CoreError::invalid_operation("record sink is closed"));
        }
        Ok(Record::new())
    }

    fn close(&self) -> CoreResult<CloseStatus> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(CoreError::invalid_operation("record sink is already closed"));
        }
        Ok(CloseStatus::Clean)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Accumulates fields and hands the finished record to a sink.
///
/// Re-inserting a key reports a duplicate entry to the sink once per key;
/// the last value wins.
///
/// ```rust
/// use recordlog_core::{LogSink, RecordBuilder, RecordSink, SinkConfig};
///
/// let sink = LogSink::to_writer(Vec::new(), SinkConfig::default());
/// let mut builder = RecordBuilder::new(&sink)?;
/// builder.origin("db.query").time_delta(12).succeeded(true);
/// builder.commit()?;
/// # Ok::<(), recordlog_core::CoreError>(())
/// ```
pub struct RecordBuilder<'a> {
    sink: &'a dyn RecordSink,
    record: Record,
    reported: Vec<String>,
}

impl<'a> RecordBuilder<'a> {
    /// Starts a record on `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the sink is closed.
    pub fn new(sink: &'a dyn RecordSink) -> CoreResult<Self> {
        Ok(Self {
            record: sink.new_record()?,
            sink,
            reported: Vec::new(),
        })
    }

    /// Sets a field.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        if self.record.contains_key(&key) && !self.reported.contains(&key) {
            self.sink.report_duplicate_entry(&self.record, &key);
            self.reported.push(key.clone());
        }
        self.record.put(key, value);
        self
    }

    /// Sets the [`names::ORIGIN`] field.
    pub fn origin(&mut self, origin: impl Into<String>) -> &mut Self {
        self.put(names::ORIGIN, origin.into())
    }

    /// Sets the [`names::START_TIME`] field, in epoch milliseconds.
    pub fn start_time(&mut self, millis: i64) -> &mut Self {
        self.put(names::START_TIME, millis)
    }

    /// Sets the [`names::TIME_DELTA`] field, in milliseconds.
    pub fn time_delta(&mut self, millis: i64) -> &mut Self {
        self.put(names::TIME_DELTA, millis)
    }

    /// Sets the [`names::SUCCEEDED`] field.
    pub fn succeeded(&mut self, succeeded: bool) -> &mut Self {
        self.put(names::SUCCEEDED, succeeded)
    }

    /// Returns the record built so far.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Writes the record to the sink.
    ///
    /// # Errors
    ///
    /// Returns whatever [`RecordSink::write`] returns.
    pub fn commit(self) -> CoreResult<()> {
        self.sink.write(self.record)
    }
}
