//! Record reader benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recordlog_bench::encoded_lines;
use recordlog_core::{FramingMode, ReaderConfig, RecordReader};

/// Benchmark reading a batch of records from memory.
fn bench_read_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_batch");

    for count in [100, 10_000] {
        let bytes = encoded_lines(count);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        for framing in [FramingMode::StringAware, FramingMode::RawBraces] {
            let config = ReaderConfig::new().framing(framing);
            group.bench_with_input(
                BenchmarkId::new(format!("{framing:?}"), count),
                &bytes,
                |b, bytes| {
                    b.iter(|| {
                        let reader = RecordReader::new(&bytes[..], config).unwrap();
                        black_box(reader.map(|r| r.unwrap()).count())
                    });
                },
            );
        }
    }
    group.finish();
}

/// Benchmark the cost of window growth.
fn bench_initial_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_window");
    let bytes = encoded_lines(1_000);

    for initial in [64, 4096, 65536] {
        let config = ReaderConfig::new().initial_buffer_size(initial);
        group.bench_with_input(BenchmarkId::from_parameter(initial), &bytes, |b, bytes| {
            b.iter(|| {
                let reader = RecordReader::new(&bytes[..], config).unwrap();
                black_box(reader.count())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_read_batch, bench_initial_window);
criterion_main!(benches);
