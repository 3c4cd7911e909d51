//! Integration tests for rolling sinks.

use recordlog_core::{
    read_records, CloseStatus, CompressedFile, CompressionCodec, CompressionKind, Compressor,
    CompressError, GzipCodec, LogSink, ReaderConfig, Record, RecordSink, SinkConfig, Value,
};
use recordlog_testkit::prelude::*;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const INTERVAL: Duration = Duration::from_secs(10);

fn write_seq(sink: &LogSink, seq: i64) {
    let mut record = sink.new_record().unwrap();
    record.put("seq", seq);
    sink.write(record).unwrap();
}

fn seqs(path: &Path) -> Vec<i64> {
    read_records(path, &ReaderConfig::default())
        .unwrap()
        .iter()
        .map(|r| r.get("seq").and_then(Value::as_int).unwrap())
        .collect()
}

#[test]
fn elapsed_time_yields_one_file_per_interval() {
    let dir = TempLogDir::new();
    let config = dir
        .rolling_config("metrics")
        .interval(INTERVAL)
        .compression(CompressionKind::None);
    let sink = LogSink::rolling(config, SinkConfig::default()).unwrap();

    // One write per second for 35 seconds.
    for second in 0..35 {
        write_seq(&sink, second);
        dir.advance(Duration::from_secs(1));
    }
    assert_eq!(sink.close().unwrap(), CloseStatus::Clean);

    let files = list_logs(dir.path());
    assert_eq!(files.len(), 4);
    for (i, file) in files.iter().enumerate() {
        let start = i as i64 * 10;
        let expected: Vec<i64> = (start..(start + 10).min(35)).collect();
        assert_eq!(seqs(file), expected, "{}", file.display());
    }
    assert_eq!(sink.stats().rotations(), 3);
    assert_eq!(sink.stats().records_written(), 35);
}

#[test]
fn retired_files_are_gzipped_and_last_file_stays_plain() {
    let dir = TempLogDir::new();
    let config = dir
        .rolling_config("metrics")
        .interval(INTERVAL)
        .compression(CompressionKind::Gzip);
    let sink = LogSink::rolling(config, SinkConfig::default()).unwrap();

    for seq in 0..3 {
        write_seq(&sink, seq);
        dir.advance(INTERVAL);
    }
    assert!(sink.close().unwrap().is_clean());

    let files = list_logs(dir.path());
    assert_eq!(files.len(), 3);
    for (seq, file) in files[..2].iter().enumerate() {
        assert_eq!(file.extension().unwrap(), "gz");
        assert_eq!(
            gunzip(file),
            format!("{{\"seq\":{seq}}}\n").into_bytes(),
        );
        assert_eq!(seqs(file), vec![seq as i64]);
    }
    assert_eq!(files[2].extension().unwrap(), "log");
    assert_eq!(std::fs::read(&files[2]).unwrap(), b"{\"seq\":2}\n");
    assert_eq!(sink.stats().compressions_completed(), 2);
    assert_eq!(sink.stats().compressions_failed(), 0);
}

#[test]
fn zip_archives_hold_one_entry_named_after_the_log() {
    let dir = TempLogDir::new();
    let config = dir
        .rolling_config("metrics")
        .interval(INTERVAL)
        .compression(CompressionKind::Zip)
        .compress_on_close(true);
    let sink = LogSink::rolling(config, SinkConfig::default()).unwrap();
    write_seq(&sink, 7);
    let live = sink.current_path().unwrap();
    sink.close().unwrap();

    let files = list_logs(dir.path());
    assert_eq!(files.len(), 1);
    let (name, body) = unzip(&files[0]);
    assert_eq!(name, live.file_name().unwrap().to_str().unwrap());
    assert_eq!(body, b"{\"seq\":7}\n");
}

#[test]
fn failed_compression_keeps_sources() {
    let dir = TempLogDir::new();
    let codec = Arc::new(FailingCodec::new());
    let config = dir.rolling_config("metrics").interval(INTERVAL);
    let sink = LogSink::rolling_with_compressor(
        config,
        Some(Compressor::new(codec.clone())),
        SinkConfig::default(),
    )
    .unwrap();

    write_seq(&sink, 0);
    dir.advance(INTERVAL);
    write_seq(&sink, 1);
    sink.close().unwrap();

    assert_eq!(codec.attempts(), 1);
    assert_eq!(sink.stats().compressions_failed(), 1);

    let names = dir.file_names();
    assert_eq!(names.len(), 2, "{names:?}");
    assert!(names.iter().all(|n| n.ends_with(".log")), "{names:?}");
    let files = list_logs(dir.path());
    assert_eq!(seqs(&files[0]), vec![0]);
    assert_eq!(seqs(&files[1]), vec![1]);
}

#[derive(Debug)]
struct SlowCodec(Duration);

impl CompressionCodec for SlowCodec {
    fn extension(&self) -> &str {
        ".gz"
    }

    fn encode(&self, source: &Path, target: &mut File) -> Result<(), CompressError> {
        thread::sleep(self.0);
        GzipCodec::default().encode(source, target)
    }
}

#[test]
fn close_detaches_slow_compression() {
    let dir = TempLogDir::new();
    let config = dir
        .rolling_config("metrics")
        .interval(INTERVAL)
        .close_timeout(Duration::from_millis(20))
        .compress_on_close(true);
    let compressor = Compressor::new(Arc::new(SlowCodec(Duration::from_millis(400))));
    let sink =
        LogSink::rolling_with_compressor(config, Some(compressor), SinkConfig::default()).unwrap();

    write_seq(&sink, 0);
    dir.advance(INTERVAL);
    write_seq(&sink, 1);

    let status = sink.close().unwrap();
    assert!(matches!(status, CloseStatus::CompressionDetached { pending } if pending >= 1));

    // The detached worker still finishes.
    let deadline = Instant::now() + Duration::from_secs(10);
    while sink.stats().compressions_completed() < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(sink.stats().compressions_completed(), 2);
    assert!(dir.file_names().iter().all(|n| n.ends_with(".gz")));
}

#[test]
fn unopenable_directory_discards_records() {
    let dir = TempLogDir::new();
    std::fs::write(dir.path().join("blocker"), b"").unwrap();
    let config = dir
        .rolling_config("blocker/metrics")
        .compression(CompressionKind::None);
    let sink = LogSink::rolling(config, SinkConfig::default()).unwrap();

    for seq in 0..3 {
        write_seq(&sink, seq);
    }
    assert_eq!(sink.stats().open_failures(), 1);
    assert_eq!(sink.stats().records_discarded(), 3);
    assert_eq!(sink.stats().records_written(), 0);
    assert_eq!(sink.stats().bytes_written(), 0);
    assert!(sink.current_path().is_none());
    assert!(sink.close().unwrap().is_clean());
    assert_eq!(dir.file_names(), vec!["blocker"]);
}

#[test]
fn concurrent_writers_across_rotations() {
    let dir = TempLogDir::new();
    let config = dir
        .rolling_config("load")
        .interval(INTERVAL)
        .compression(CompressionKind::Gzip);
    let sink = Arc::new(LogSink::rolling(config, SinkConfig::default()).unwrap());

    let clock = dir.clock.clone();
    let ticker = thread::spawn(move || {
        for _ in 0..5 {
            thread::sleep(Duration::from_millis(5));
            clock.advance(INTERVAL);
        }
    });

    let load = StressConfig {
        threads: 4,
        records_per_thread: 500,
        payload_len: 32,
    };
    let result = concurrent_writes(sink.clone(), &load);
    ticker.join().unwrap();
    assert_eq!(result.successful_ops, 2_000);
    sink.close().unwrap();

    let mut last_seq = vec![-1i64; load.threads];
    let mut total = 0;
    for file in list_logs(dir.path()) {
        let records: Vec<Record> = read_records(&file, &ReaderConfig::default()).unwrap();
        for record in records {
            let thread = record.get("thread").and_then(Value::as_int).unwrap() as usize;
            let seq = record.get("seq").and_then(Value::as_int).unwrap();
            assert!(seq > last_seq[thread]);
            last_seq[thread] = seq;
            total += 1;
        }
    }
    assert_eq!(total, 2_000);
}

#[test]
fn compressed_file_reports_sizes() {
    let dir = TempLogDir::new();
    let source = dir.path().join("manual.log");
    std::fs::write(&source, "{\"k\":1}\n".repeat(100)).unwrap();

    let CompressedFile {
        path,
        original_size,
        compressed_size,
    } = Compressor::for_kind(CompressionKind::Gzip)
        .unwrap()
        .compress(&source)
        .unwrap();
    assert_eq!(original_size, 800);
    assert!(compressed_size < original_size);
    assert_eq!(read_log_bytes(&path), "{\"k\":1}\n".repeat(100).into_bytes());
    assert!(!source.exists());
}
