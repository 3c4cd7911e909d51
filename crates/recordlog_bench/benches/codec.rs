//! JSON-line codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recordlog_bench::{payload_record, timing_record};
use recordlog_codec::{decode_record, encode_record_line, from_json, to_json, JsonEncoder, Value};

/// Create a nested value `depth` levels deep with `width` entries per level.
fn nested_value(depth: usize, width: usize) -> Value {
    if depth == 0 {
        Value::Text("leaf".into())
    } else {
        let children: Vec<(Value, Value)> = (0..width)
            .map(|i| {
                (
                    Value::Text(format!("key_{}", i)),
                    nested_value(depth - 1, width),
                )
            })
            .collect();
        Value::Map(children)
    }
}

/// Benchmark encoding a typical record.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    group.bench_function("timing_record", |b| {
        let record = timing_record(42);
        b.iter(|| black_box(encode_record_line(black_box(&record)).unwrap()));
    });

    group.bench_function("encoder_reuse", |b| {
        let record = timing_record(42);
        let mut encoder = JsonEncoder::with_capacity(256);
        b.iter(|| {
            encoder.clear();
            encoder.encode_record_line(black_box(&record)).unwrap();
            black_box(encoder.as_bytes().len());
        });
    });

    for depth in [1, 3, 5] {
        let value = nested_value(depth, 3);
        group.bench_with_input(BenchmarkId::new("nested", depth), &value, |b, value| {
            b.iter(|| black_box(to_json(black_box(value)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark decoding by payload size.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [16, 256, 4096] {
        let line = encode_record_line(&payload_record(size)).unwrap();
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &line, |b, line| {
            b.iter(|| black_box(decode_record(black_box(line)).unwrap()));
        });
    }

    let numbers = br#"[1,-2,3.25,1e300,123456789012345678901234567890,0.1]"#;
    group.bench_function("numbers", |b| {
        b.iter(|| black_box(from_json(black_box(numbers)).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
