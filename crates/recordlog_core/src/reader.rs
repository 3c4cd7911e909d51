//! Streaming record reader.
//!
//! Records are framed by brace depth rather than by newlines, so the reader
//! accepts any whitespace between records and is insensitive to how the
//! underlying stream chunks its bytes.
//!
//! ## Buffer window
//!
//! ```text
//! 0          pos                last             capacity
//! |  consumed |  unread bytes    |  free space    |
//! ```
//!
//! When a record does not fit, the window is compacted (unread bytes moved
//! to the front) or, if the record already starts at the front and the
//! window is full, doubled up to [`ReaderConfig::max_buffer_size`].

use crate::config::{FramingMode, ReaderConfig};
use crate::error::{CoreError, CoreResult};
use recordlog_codec::{decode_record, Record};
use std::io::{self, Read};

/// Growable byte region with `[pos, last)` cursors.
///
/// `pos <= last <= capacity` always holds. The window never shrinks.
#[derive(Debug)]
struct BufferWindow {
    buf: Vec<u8>,
    pos: usize,
    last: usize,
}

impl BufferWindow {
    fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            pos: 0,
            last: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn unread(&self) -> &[u8] {
        &self.buf[self.pos..self.last]
    }

    fn is_full(&self) -> bool {
        self.last == self.capacity()
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.last, 0);
            self.last -= self.pos;
            self.pos = 0;
        }
    }

    fn grow(&mut self, capacity: usize) {
        if capacity > self.buf.len() {
            self.buf.resize(capacity, 0);
        }
    }

    /// Reads once into the free space, retrying on interruption.
    ///
    /// Callers must leave free space; zero means end of stream.
    fn fill<R: Read>(&mut self, source: &mut R) -> io::Result<usize> {
        debug_assert!(self.last < self.capacity());
        loop {
            match source.read(&mut self.buf[self.last..]) {
                Ok(n) => {
                    self.last += n;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn release(&mut self) {
        self.buf = Vec::new();
        self.pos = 0;
        self.last = 0;
    }
}

/// Incremental brace counter for one frame.
///
/// Keeps its position relative to the start of the frame, so scanning
/// resumes where it stopped after the window is compacted or grown.
#[derive(Debug)]
struct FrameScanner {
    mode: FramingMode,
    scanned: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl FrameScanner {
    fn new(mode: FramingMode) -> Self {
        Self {
            mode,
            scanned: 0,
            depth: 0,
            in_string: false,
            escaped: false,
        }
    }

    fn reset(&mut self) {
        self.scanned = 0;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
    }

    /// Scans `frame` (which starts with `{`) from where the last call left
    /// off. Returns the frame length once depth returns to zero.
    fn scan(&mut self, frame: &[u8]) -> Option<usize> {
        while self.scanned < frame.len() {
            let byte = frame[self.scanned];
            self.scanned += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' if self.mode == FramingMode::StringAware => self.in_string = true,
                b'{' => self.depth += 1,
                b'}' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some(self.scanned);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Active,
    Exhausted,
    Closed,
}

/// Reads records from any byte stream.
///
/// Single-threaded and stateful. After a fatal error (I/O failure, a record
/// larger than the maximum window, or a stream that ends inside a record) the
/// reader is exhausted and yields no more records. A complete frame that
/// fails to parse is reported as [`CoreError::Codec`] and skipped.
///
/// # Example
///
/// ```rust
/// use recordlog_core::{ReaderConfig, RecordReader};
///
/// let input = b"{\"origin\":\"a\"}\n{\"origin\":\"b\",\"n\":1000}\n";
/// let mut reader = RecordReader::new(&input[..], ReaderConfig::default())?;
///
/// let first = reader.read_next()?.unwrap();
/// assert_eq!(first.get("origin").and_then(|v| v.as_text()), Some("a"));
/// assert!(reader.read_next()?.is_some());
/// assert!(reader.read_next()?.is_none());
/// # Ok::<(), recordlog_core::CoreError>(())
/// ```
#[derive(Debug)]
pub struct RecordReader<R> {
    source: Option<R>,
    window: BufferWindow,
    scanner: FrameScanner,
    max_buffer_size: usize,
    consumed: u64,
    state: ReaderState,
}

impl<R: Read> RecordReader<R> {
    /// Creates a reader over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the buffer sizes are invalid.
    pub fn new(source: R, config: ReaderConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            source: Some(source),
            window: BufferWindow::new(config.initial_buffer_size),
            scanner: FrameScanner::new(config.framing),
            max_buffer_size: config.max_buffer_size,
            consumed: 0,
            state: ReaderState::Active,
        })
    }

    /// Returns the next record, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidOperation`] after [`close`](Self::close)
    /// - [`CoreError::RecordTooLarge`], [`CoreError::TruncatedStream`] and
    ///   [`CoreError::Io`] are fatal
    /// - [`CoreError::Codec`] for a malformed record; reading may continue
    pub fn read_next(&mut self) -> CoreResult<Option<Record>> {
        match self.state {
            ReaderState::Closed => {
                return Err(CoreError::invalid_operation("record reader is closed"))
            }
            ReaderState::Exhausted => return Ok(None),
            ReaderState::Active => {}
        }

        match self.next_frame() {
            Ok(Some(len)) => {
                let start = self.window.pos;
                let decoded = decode_record(&self.window.buf[start..start + len]);
                self.advance(len);
                decoded.map(Some).map_err(CoreError::from)
            }
            Ok(None) => {
                self.state = ReaderState::Exhausted;
                Ok(None)
            }
            Err(e) => {
                tracing::debug!(error = %e, offset = self.consumed, "record reader stopped");
                self.state = ReaderState::Exhausted;
                Err(e)
            }
        }
    }

    /// Locates the next complete frame at `window.pos` and returns its length.
    fn next_frame(&mut self) -> CoreResult<Option<usize>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        // Skip to the opening brace.
        loop {
            let unread = self.window.unread();
            let found = unread.iter().position(|&b| b == b'{');
            let skip = found.unwrap_or(unread.len());
            self.window.pos += skip;
            self.consumed += skip as u64;
            if found.is_some() {
                break;
            }
            self.window.compact();
            if self.window.fill(source)? == 0 {
                return Ok(None);
            }
        }

        self.scanner.reset();
        loop {
            if let Some(len) = self
                .scanner
                .scan(&self.window.buf[self.window.pos..self.window.last])
            {
                return Ok(Some(len));
            }

            if self.window.is_full() {
                if self.window.pos == 0 {
                    let capacity = self.window.capacity();
                    if capacity >= self.max_buffer_size {
                        return Err(CoreError::RecordTooLarge {
                            max_buffer_size: self.max_buffer_size,
                        });
                    }
                    let grown = capacity.saturating_mul(2).min(self.max_buffer_size);
                    tracing::trace!(from = capacity, to = grown, "growing reader window");
                    self.window.grow(grown);
                } else {
                    self.window.compact();
                }
            }

            if self.window.fill(source)? == 0 {
                return Err(CoreError::TruncatedStream {
                    buffered: self.window.last - self.window.pos,
                });
            }
        }
    }

    fn advance(&mut self, len: usize) {
        self.window.pos += len;
        self.consumed += len as u64;
    }

    /// Bytes consumed from the stream so far, including skipped whitespace.
    pub fn position(&self) -> u64 {
        self.consumed
    }

    /// Current window capacity.
    pub fn buffer_capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Returns true once closed.
    pub fn is_closed(&self) -> bool {
        self.state == ReaderState::Closed
    }

    /// Releases the source and the window.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if already closed.
    pub fn close(&mut self) -> CoreResult<()> {
        if self.state == ReaderState::Closed {
            return Err(CoreError::invalid_operation("record reader is already closed"));
        }
        self.state = ReaderState::Closed;
        self.source = None;
        self.window.release();
        Ok(())
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = CoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ReaderState::Closed {
            return None;
        }
        self.read_next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordlog_codec::Value;

    const THREE: &[u8] = b"{\"origin\":\"a\"}\n{\"origin\":\"b\",\"n\":1000}\n{\"origin\":\"c\",\"ok\":true}\n";

    /// Hands out at most `chunk` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt {
                self.interrupt = false;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.interrupt = true;
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn small() -> ReaderConfig {
        ReaderConfig::new().initial_buffer_size(8).max_buffer_size(64)
    }

    fn read_all<R: Read>(reader: RecordReader<R>) -> Vec<Record> {
        reader.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn three_record_scenario() {
        let mut reader = RecordReader::new(THREE, ReaderConfig::default()).unwrap();

        let a = reader.read_next().unwrap().unwrap();
        assert_eq!(a.get("origin"), Some(&Value::from("a")));
        let b = reader.read_next().unwrap().unwrap();
        assert_eq!(b.get("n"), Some(&Value::Int(1000)));
        let c = reader.read_next().unwrap().unwrap();
        assert_eq!(c.get("ok"), Some(&Value::Bool(true)));

        assert!(reader.read_next().unwrap().is_none());
        assert!(reader.read_next().unwrap().is_none());
        assert_eq!(reader.position(), THREE.len() as u64);
    }

    #[test]
    fn chunking_does_not_matter() {
        let whole = read_all(RecordReader::new(THREE, small()).unwrap());
        for chunk in [1, 2, 3, 7, 100] {
            let source = Trickle {
                data: THREE,
                chunk,
                interrupt: true,
            };
            assert_eq!(read_all(RecordReader::new(source, small()).unwrap()), whole);
        }
        assert_eq!(whole.len(), 3);
    }

    #[test]
    fn window_grows_up_to_max() {
        let line = format!("{{\"k\":\"{}\"}}", "x".repeat(40));
        let mut reader = RecordReader::new(line.as_bytes(), small()).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        assert_eq!(reader.buffer_capacity(), 64);
    }

    #[test]
    fn oversized_record_is_fatal() {
        let input = format!("{{\"k\":\"{}\"}}\n{{\"k\":1}}", "x".repeat(100));
        let mut reader = RecordReader::new(input.as_bytes(), small()).unwrap();

        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, CoreError::RecordTooLarge { max_buffer_size: 64 }));
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn truncated_stream_is_fatal() {
        let mut reader =
            RecordReader::new(&b"{\"a\":1}\n{\"b\":"[..], ReaderConfig::default()).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, CoreError::TruncatedStream { buffered: 5 }));
        assert!(err.is_fatal_for_reader());
        assert!(reader.next().is_none());
    }

    #[test]
    fn braces_inside_strings() {
        let input = br#"{"msg":"a } b { c","esc":"\"}"}"#;
        let mut reader = RecordReader::new(&input[..], ReaderConfig::default()).unwrap();
        let record = reader.read_next().unwrap().unwrap();
        assert_eq!(record.get("msg"), Some(&Value::from("a } b { c")));
        assert_eq!(record.get("esc"), Some(&Value::from("\"}")));
    }

    #[test]
    fn raw_framing_counts_every_brace() {
        let input = br#"{"a":"}"}"#;
        let config = ReaderConfig::new().framing(FramingMode::RawBraces);
        let mut reader = RecordReader::new(&input[..], config).unwrap();

        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, CoreError::Codec(_)));
        assert!(!err.is_fatal_for_reader());
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn malformed_record_is_skipped() {
        let input = b"{\"a\":}\n{\"b\":2}\n";
        let mut reader = RecordReader::new(&input[..], ReaderConfig::default()).unwrap();
        assert!(matches!(reader.read_next(), Err(CoreError::Codec(_))));
        let record = reader.read_next().unwrap().unwrap();
        assert_eq!(record.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn nested_objects_and_noise_between_records() {
        let input = b"  \n{\"m\":{\"x\":{\"y\":1}}}   junk {\"z\":[{}]}";
        let records = read_all(RecordReader::new(&input[..], small()).unwrap());
        assert_eq!(records.len(), 2);
        assert!(records[0].get("m").unwrap().get("x").is_some());
    }

    #[test]
    fn empty_stream() {
        let mut reader = RecordReader::new(&b""[..], ReaderConfig::default()).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn close_twice_is_an_error() {
        let mut reader = RecordReader::new(THREE, ReaderConfig::default()).unwrap();
        reader.close().unwrap();
        assert!(reader.is_closed());
        assert!(reader.read_next().unwrap_err().is_invalid_operation());
        assert!(reader.close().unwrap_err().is_invalid_operation());
        assert!(reader.next().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ReaderConfig::new().initial_buffer_size(128).max_buffer_size(64);
        assert!(matches!(
            RecordReader::new(THREE, config),
            Err(CoreError::InvalidConfig { .. })
        ));
    }
}
