//! Bounded pool of recycled record containers.
//!
//! Every written record is cleared and handed back here, so a sink under
//! sustained load reuses the same few allocations instead of building a
//! fresh map per measurement. The pool is a lock-free bounded queue; when
//! it is full, returned records are simply dropped.

use crossbeam::queue::ArrayQueue;
use recordlog_codec::Record;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free pool of emptied [`Record`]s.
///
/// Any record handed out by [`RecordCache::fetch`] is empty. A cache with
/// capacity zero never holds anything.
#[derive(Debug)]
pub struct RecordCache {
    queue: Option<ArrayQueue<Record>>,
    stats: CacheStats,
}

/// Counters for cache monitoring.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

impl CacheStats {
    /// Number of fetches served from the pool.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of fetches that found the pool empty.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of records accepted back into the pool.
    pub fn returns(&self) -> u64 {
        self.returns.load(Ordering::Relaxed)
    }

    /// Number of records dropped because the pool was full.
    pub fn drops(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            returns: self.returns(),
            drops: self.drops(),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStatsSnapshot {
    /// Fetches served from the pool.
    pub hits: u64,
    /// Fetches that found the pool empty.
    pub misses: u64,
    /// Records accepted back.
    pub returns: u64,
    /// Records dropped on a full pool.
    pub drops: u64,
}

impl CacheStatsSnapshot {
    /// Fraction of fetches served from the pool (1.0 when nothing was fetched).
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl RecordCache {
    /// Creates an empty cache holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: (capacity > 0).then(|| ArrayQueue::new(capacity)),
            stats: CacheStats::default(),
        }
    }

    /// Takes an empty record from the pool, if one is available.
    #[inline]
    pub fn fetch(&self) -> Option<Record> {
        match self.queue.as_ref().and_then(ArrayQueue::pop) {
            Some(record) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(record)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Takes a pooled record or allocates a new one.
    #[inline]
    pub fn fetch_or_new(&self) -> Record {
        self.fetch().unwrap_or_default()
    }

    /// Clears a record and returns it to the pool.
    ///
    /// If the pool is full the record is dropped.
    #[inline]
    pub fn take(&self, mut record: Record) {
        let Some(queue) = self.queue.as_ref() else {
            self.stats.drops.fetch_add(1, Ordering::Relaxed);
            return;
        };
        record.clear();
        match queue.push(record) {
            Ok(()) => {
                self.stats.returns.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.drops.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Maximum number of pooled records.
    pub fn capacity(&self) -> usize {
        self.queue.as_ref().map_or(0, ArrayQueue::capacity)
    }

    /// Number of records currently pooled.
    pub fn len(&self) -> usize {
        self.queue.as_ref().map_or(0, ArrayQueue::len)
    }

    /// Returns true if no records are pooled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cache counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
