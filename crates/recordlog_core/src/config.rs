//! Sink and reader configuration.

use crate::error::{CoreError, CoreResult};
use crate::time::TimeSource;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default rotation interval.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default suffix appended to rotated file names.
pub const DEFAULT_SUFFIX: &str = ".log";

/// Default time to wait for background compression on close.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Default initial reader window size.
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 4 * 1024;

/// Default maximum reader window size.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Default number of recycled records kept by a sink.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// How retired log files are compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionKind {
    /// Leave retired files as they are.
    None,
    /// Gzip stream, `.gz` extension.
    #[default]
    Gzip,
    /// Single-entry zip archive, `.zip` extension.
    Zip,
}

impl CompressionKind {
    /// File extension of the compressed artifact, including the dot.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some(".gz"),
            Self::Zip => Some(".zip"),
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            "zip" => Ok(Self::Zip),
            other => Err(CoreError::invalid_config(format!(
                "unknown compression kind {other:?}, expected none, gzip or zip"
            ))),
        }
    }
}

/// Configuration for time-based rolling output.
///
/// There is no default time source: the caller always chooses the clock,
/// which is how tests drive rotation deterministically.
#[derive(Debug, Clone)]
pub struct RollingConfig {
    /// Leading part of every generated file name, including directories.
    pub base_path: PathBuf,

    /// How long one file stays active.
    pub interval: Duration,

    /// How retired files are compressed.
    pub compression: CompressionKind,

    /// Appended to every generated file name.
    pub suffix: String,

    /// Clock consulted on every write.
    pub time_source: Arc<dyn TimeSource>,

    /// Whether to fsync after every record.
    pub sync_on_write: bool,

    /// How long `close` waits for background compression.
    pub close_timeout: Duration,

    /// Whether the file active at close is compressed too.
    ///
    /// Off by default: only rotation compresses, so the last file stays
    /// plain after shutdown.
    pub compress_on_close: bool,
}

impl RollingConfig {
    /// Creates a configuration with default rotation settings.
    pub fn new(base_path: impl Into<PathBuf>, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            base_path: base_path.into(),
            interval: DEFAULT_ROTATION_INTERVAL,
            compression: CompressionKind::default(),
            suffix: DEFAULT_SUFFIX.to_string(),
            time_source,
            sync_on_write: false,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            compress_on_close: false,
        }
    }

    /// Sets the rotation interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the compression kind.
    #[must_use]
    pub fn compression(mut self, kind: CompressionKind) -> Self {
        self.compression = kind;
        self
    }

    /// Sets the file name suffix.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Sets whether to fsync after every record.
    #[must_use]
    pub fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets how long `close` waits for compression.
    #[must_use]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Sets whether the last file is compressed on close.
    #[must_use]
    pub fn compress_on_close(mut self, value: bool) -> Self {
        self.compress_on_close = value;
        self
    }

    /// Rotation interval in milliseconds, clamped to at least one.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn interval_millis(&self) -> i64 {
        (self.interval.as_millis().min(i64::MAX as u128) as i64).max(1)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the interval is shorter than a
    /// millisecond, the base path has no file name part, or the suffix
    /// contains a path separator.
    pub fn validate(&self) -> CoreResult<()> {
        if self.interval < Duration::from_millis(1) {
            return Err(CoreError::invalid_config(
                "rotation interval must be at least one millisecond",
            ));
        }
        if self.base_path.file_name().is_none() {
            return Err(CoreError::invalid_config(format!(
                "base path {} has no file name",
                self.base_path.display()
            )));
        }
        if self.suffix.contains(['/', '\\']) {
            return Err(CoreError::invalid_config(format!(
                "suffix {:?} must not contain a path separator",
                self.suffix
            )));
        }
        Ok(())
    }
}

/// How the reader finds record boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingMode {
    /// Count braces outside string literals only.
    ///
    /// A `{` or `}` inside a quoted value does not affect framing.
    #[default]
    StringAware,
    /// Count every brace byte, including those inside strings.
    ///
    /// Only safe when values never contain braces.
    RawBraces,
}

/// Configuration for [`crate::RecordReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Window size allocated up front.
    pub initial_buffer_size: usize,

    /// Largest window the reader will grow to. A record must fit in it.
    pub max_buffer_size: usize,

    /// Record boundary detection.
    pub framing: FramingMode,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            framing: FramingMode::default(),
        }
    }
}

impl ReaderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial window size.
    #[must_use]
    pub const fn initial_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size;
        self
    }

    /// Sets the maximum window size.
    #[must_use]
    pub const fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    /// Sets the framing mode.
    #[must_use]
    pub const fn framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] unless
    /// `0 < initial_buffer_size <= max_buffer_size`.
    pub fn validate(&self) -> CoreResult<()> {
        if self.initial_buffer_size == 0 {
            return Err(CoreError::invalid_config(
                "initial buffer size must be positive",
            ));
        }
        if self.initial_buffer_size > self.max_buffer_size {
            return Err(CoreError::invalid_config(format!(
                "initial buffer size {} exceeds maximum {}",
                self.initial_buffer_size, self.max_buffer_size
            )));
        }
        Ok(())
    }
}

/// Configuration shared by every [`crate::LogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// How many emptied records the sink keeps for reuse. Zero disables
    /// recycling.
    pub cache_capacity: usize,

    /// Whether to fsync after every record on a fixed target.
    pub sync_on_write: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            sync_on_write: false,
        }
    }
}

impl SinkConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record cache capacity.
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Sets whether to fsync after every record.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}
