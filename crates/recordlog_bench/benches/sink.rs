//! Sink write path benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recordlog_bench::timing_record;
use recordlog_core::{
    CompressionKind, LogSink, ManualTimeSource, NullSink, RecordSink, RollingConfig, SinkConfig,
};
use recordlog_storage::DiscardTarget;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Benchmark single-threaded writes to different destinations.
fn bench_single_writer(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_writer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("null_sink", |b| {
        let sink = NullSink::new();
        b.iter(|| sink.write(black_box(timing_record(1))).unwrap());
    });

    group.bench_function("discard_target", |b| {
        let sink = LogSink::to_target(Box::new(DiscardTarget::new()), SinkConfig::default());
        b.iter(|| {
            let mut record = sink.new_record().unwrap();
            record.put("origin", "bench");
            record.put("timeDelta", 12);
            sink.write(black_box(record)).unwrap();
        });
    });

    group.bench_function("rolling_file", |b| {
        let dir = TempDir::new().unwrap();
        let config = RollingConfig::new(dir.path().join("bench"), ManualTimeSource::shared(0))
            .compression(CompressionKind::None);
        let sink = LogSink::rolling(config, SinkConfig::default()).unwrap();
        b.iter(|| sink.write(black_box(timing_record(1))).unwrap());
        sink.close().unwrap();
    });

    group.finish();
}

/// Benchmark lock contention with several writers.
fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");

    for threads in [2, 4, 8] {
        let per_thread = 1_000;
        group.throughput(Throughput::Elements((threads * per_thread) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let sink = Arc::new(LogSink::to_target(
                    Box::new(DiscardTarget::new()),
                    SinkConfig::default(),
                ));
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let sink = Arc::clone(&sink);
                        thread::spawn(move || {
                            for i in 0..per_thread {
                                sink.write(timing_record(i as i64)).unwrap();
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_writer, bench_contended);
criterion_main!(benches);
