//! Benchmark utilities.

#![warn(missing_docs)]

use recordlog_codec::{encode_record_line, Record, Value};

/// A record shaped like a typical timing measurement.
pub fn timing_record(seq: i64) -> Record {
    let mut record = Record::with_capacity(6);
    record.put("origin", "bench.request");
    record.put("startTime", 1_700_000_000_000 + seq);
    record.put("timeDelta", seq % 250);
    record.put("succeeded", seq % 7 != 0);
    record.put("path", "/api/v1/orders");
    record.put("bytes", seq * 31);
    record
}

/// A record with one text field of `payload` bytes.
pub fn payload_record(payload: usize) -> Record {
    let mut record = Record::new();
    record.put("origin", "bench.payload");
    record.put("payload", Value::Text("x".repeat(payload)));
    record
}

/// `count` encoded timing records, one per line.
pub fn encoded_lines(count: usize) -> Vec<u8> {
    (0..count as i64)
        .flat_map(|i| encode_record_line(&timing_record(i)).unwrap_or_default())
        .collect()
}
