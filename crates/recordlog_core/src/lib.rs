//! # recordlog core
//!
//! Record log engine: structured records written as JSON lines to
//! time-rotated files, with background compression and a streaming reader.
//!
//! This crate provides:
//! - [`LogSink`]: serialized writes, one line per record, errors logged not raised
//! - [`RollingFileManager`]: interval rotation with an injected [`TimeSource`]
//! - [`Compressor`]: gzip and zip archiving of retired files
//! - [`RecordCache`]: bounded pool of emptied records
//! - [`RecordReader`]: brace-framed reading from any byte stream
//!
//! ## Usage
//!
//! ```rust,no_run
//! use recordlog_core::{
//!     CompressionKind, LogSink, RecordBuilder, RollingConfig, SinkConfig, SystemTimeSource,
//! };
//! use std::time::Duration;
//!
//! let config = RollingConfig::new("logs/requests", SystemTimeSource::shared())
//!     .interval(Duration::from_secs(15 * 60))
//!     .compression(CompressionKind::Gzip);
//! let sink = LogSink::rolling(config, SinkConfig::default())?;
//!
//! let mut record = RecordBuilder::new(&sink)?;
//! record.origin("checkout").time_delta(37).succeeded(true);
//! record.commit()?;
//! # Ok::<(), recordlog_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod compress;
mod config;
mod error;
mod log_file;
mod naming;
pub mod names;
mod reader;
mod rolling;
mod sink;
mod stats;
mod time;

pub use cache::{CacheStats, CacheStatsSnapshot, RecordCache};
pub use compress::{
    compressed_path, CompressedFile, CompressionCodec, Compressor, GzipCodec, ZipCodec,
    TEMP_SUFFIX,
};
pub use config::{
    CompressionKind, FramingMode, ReaderConfig, RollingConfig, SinkConfig,
    DEFAULT_CACHE_CAPACITY, DEFAULT_CLOSE_TIMEOUT, DEFAULT_INITIAL_BUFFER_SIZE,
    DEFAULT_MAX_BUFFER_SIZE, DEFAULT_ROTATION_INTERVAL, DEFAULT_SUFFIX,
};
pub use error::{CompressError, CoreError, CoreResult};
pub use log_file::{detect_compression, for_each_record, read_records};
pub use naming::{format_timestamp, TIMESTAMP_FORMAT};
pub use reader::RecordReader;
pub use rolling::{CloseStatus, RollingFileManager, RollingFileState};
pub use sink::{LogSink, NullSink, RecordBuilder, RecordSink};
pub use stats::{SinkStats, SinkStatsSnapshot};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};

pub use recordlog_codec::{Record, Value};
