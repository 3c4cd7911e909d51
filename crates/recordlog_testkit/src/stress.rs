//! Concurrent write load for sinks.

use recordlog_core::{RecordSink, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total writes attempted.
    pub total_ops: usize,
    /// Writes that returned `Ok`.
    pub successful_ops: usize,
    /// Writes that returned an error.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Writes per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for a stress run.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Writer threads.
    pub threads: usize,
    /// Records written by each thread.
    pub records_per_thread: usize,
    /// Length of the text payload in each record.
    pub payload_len: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            records_per_thread: 1_000,
            payload_len: 64,
        }
    }
}

/// Writes records from several threads at once.
///
/// Each record carries `thread` and `seq` fields, so readers can check that
/// per-thread order was kept and that no line was torn.
pub fn concurrent_writes(sink: Arc<dyn RecordSink>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let payload: Arc<str> = "x".repeat(config.payload_len).into();
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let sink = Arc::clone(&sink);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let payload = Arc::clone(&payload);
            let count = config.records_per_thread;
            thread::spawn(move || {
                for seq in 0..count {
                    let outcome = sink.new_record().and_then(|mut record| {
                        record.put("thread", t as i64);
                        record.put("seq", seq as i64);
                        record.put("payload", Value::Text(payload.to_string()));
                        sink.write(record)
                    });
                    match outcome {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
