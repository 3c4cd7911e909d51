//! Sink statistics.
//!
//! Recording failures never reach the caller, so these counters are the
//! only way to see that records were dropped or compression failed.
//!
//! # Usage
//!
//! ```rust,ignore
//! let sink = LogSink::rolling(config, SinkConfig::default())?;
//! sink.write(record)?;
//!
//! let stats = sink.stats().snapshot();
//! println!("written: {}", stats.records_written);
//! println!("dropped: {}", stats.records_dropped);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Sink counters.
///
/// All counters are atomic and monotonically increasing. The rolling
/// manager's background worker shares the same instance.
#[derive(Debug, Default)]
pub struct SinkStats {
    records_written: AtomicU64,
    records_dropped: AtomicU64,
    records_discarded: AtomicU64,
    bytes_written: AtomicU64,
    duplicate_entries: AtomicU64,

    rotations: AtomicU64,
    open_failures: AtomicU64,

    compressions_completed: AtomicU64,
    compressions_failed: AtomicU64,
}

impl SinkStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    // === Increment methods (internal use) ===

    pub(crate) fn record_write(&self, bytes: u64) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_drop(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discard(&self) {
        self.records_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicate_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_open_failure(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compression(&self, succeeded: bool) {
        if succeeded {
            self.compressions_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.compressions_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    // === Getter methods (public API) ===

    /// Records fully handed to the output target.
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    /// Records lost to I/O failures.
    pub fn records_dropped(&self) -> u64 {
        self.records_dropped.load(Ordering::Relaxed)
    }

    /// Records thrown away while no log file could be opened.
    ///
    /// These never count as written.
    pub fn records_discarded(&self) -> u64 {
        self.records_discarded.load(Ordering::Relaxed)
    }

    /// Bytes handed to the output target, newlines included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Duplicate-key insertions reported by producers.
    pub fn duplicate_entries(&self) -> u64 {
        self.duplicate_entries.load(Ordering::Relaxed)
    }

    /// Files retired because their interval elapsed.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Files that could not be opened.
    ///
    /// Records written while the fallback target is active are counted by
    /// [`Self::records_discarded`].
    pub fn open_failures(&self) -> u64 {
        self.open_failures.load(Ordering::Relaxed)
    }

    /// Retired files compressed successfully.
    pub fn compressions_completed(&self) -> u64 {
        self.compressions_completed.load(Ordering::Relaxed)
    }

    /// Retired files left uncompressed after an error.
    pub fn compressions_failed(&self) -> u64 {
        self.compressions_failed.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> SinkStatsSnapshot {
        SinkStatsSnapshot {
            records_written: self.records_written(),
            records_dropped: self.records_dropped(),
            records_discarded: self.records_discarded(),
            bytes_written: self.bytes_written(),
            duplicate_entries: self.duplicate_entries(),
            rotations: self.rotations(),
            open_failures: self.open_failures(),
            compressions_completed: self.compressions_completed(),
            compressions_failed: self.compressions_failed(),
        }
    }
}

/// A point-in-time snapshot of sink statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkStatsSnapshot {
    /// Records fully handed to the output target.
    pub records_written: u64,
    /// Records lost to I/O failures.
    pub records_dropped: u64,
    /// Records discarded after an open failure.
    pub records_discarded: u64,
    /// Bytes handed to the output target.
    pub bytes_written: u64,
    /// Duplicate-key insertions reported.
    pub duplicate_entries: u64,
    /// Interval rotations.
    pub rotations: u64,
    /// Files that could not be opened.
    pub open_failures: u64,
    /// Successful compressions.
    pub compressions_completed: u64,
    /// Failed compressions.
    pub compressions_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = SinkStats::new();
        assert_eq!(stats.snapshot(), SinkStatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = SinkStats::new();
        stats.record_write(10);
        stats.record_write(5);
        stats.record_drop();
        stats.record_discard();
        stats.record_compression(true);
        stats.record_compression(false);
        stats.record_compression(false);

        let snap = stats.snapshot();
        assert_eq!(snap.records_written, 2);
        assert_eq!(snap.bytes_written, 15);
        assert_eq!(snap.records_dropped, 1);
        assert_eq!(snap.records_discarded, 1);
        assert_eq!(snap.compressions_completed, 1);
        assert_eq!(snap.compressions_failed, 2);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(SinkStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        s.record_write(2);
                        s.record_duplicate();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.records_written(), 800);
        assert_eq!(stats.bytes_written(), 1600);
        assert_eq!(stats.duplicate_entries(), 800);
    }
}
