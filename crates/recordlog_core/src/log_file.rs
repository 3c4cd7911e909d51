//! Reading log files from disk, compressed or not.

use crate::config::{CompressionKind, ReaderConfig};
use crate::error::{CompressError, CoreResult};
use crate::reader::RecordReader;
use flate2::read::GzDecoder;
use recordlog_codec::Record;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

/// Detects the compression of a log file from its extension.
pub fn detect_compression(path: &Path) -> CompressionKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => CompressionKind::Gzip,
        Some("zip") => CompressionKind::Zip,
        _ => CompressionKind::None,
    }
}

/// Streams every record of a plain, `.gz` or `.zip` log file to `f`.
///
/// `f` returns `Ok(false)` to stop early. Returns the number of records
/// handed to `f`.
///
/// # Errors
///
/// Returns the first error from opening the file, reading a record or `f`.
pub fn for_each_record<F>(path: &Path, config: &ReaderConfig, mut f: F) -> CoreResult<usize>
where
    F: FnMut(Record) -> CoreResult<bool>,
{
    let file = File::open(path)?;
    match detect_compression(path) {
        CompressionKind::None => drain(BufReader::new(file), config, &mut f),
        CompressionKind::Gzip => drain(GzDecoder::new(BufReader::new(file)), config, &mut f),
        CompressionKind::Zip => {
            let mut archive =
                ZipArchive::new(BufReader::new(file)).map_err(|e| CompressError::zip(path, e))?;
            if archive.is_empty() {
                return Ok(0);
            }
            let entry = archive
                .by_index(0)
                .map_err(|e| CompressError::zip(path, e))?;
            drain(entry, config, &mut f)
        }
    }
}

/// Reads every record of a log file into memory.
///
/// # Errors
///
/// See [`for_each_record`].
pub fn read_records(path: &Path, config: &ReaderConfig) -> CoreResult<Vec<Record>> {
    let mut records = Vec::new();
    for_each_record(path, config, |record| {
        records.push(record);
        Ok(true)
    })?;
    Ok(records)
}

fn drain<R, F>(source: R, config: &ReaderConfig, f: &mut F) -> CoreResult<usize>
where
    R: Read,
    F: FnMut(Record) -> CoreResult<bool>,
{
    let mut reader = RecordReader::new(source, *config)?;
    let mut count = 0;
    while let Some(record) = reader.read_next()? {
        count += 1;
        if !f(record)? {
            break;
        }
    }
    reader.close()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::Compressor;
    use recordlog_codec::Value;
    use std::fs;
    use tempfile::tempdir;

    const BODY: &[u8] = b"{\"origin\":\"a\"}\n{\"origin\":\"b\",\"n\":1000}\n{\"origin\":\"c\",\"ok\":true}\n";

    #[test]
    fn detects_by_extension() {
        assert_eq!(detect_compression(Path::new("a.log")), CompressionKind::None);
        assert_eq!(detect_compression(Path::new("a.log.gz")), CompressionKind::Gzip);
        assert_eq!(detect_compression(Path::new("a.log_1.zip")), CompressionKind::Zip);
    }

    #[test]
    fn reads_plain_and_compressed() {
        for kind in [CompressionKind::None, CompressionKind::Gzip, CompressionKind::Zip] {
            let dir = tempdir().unwrap();
            let source = dir.path().join("m.log");
            fs::write(&source, BODY).unwrap();
            let path = match Compressor::for_kind(kind) {
                Some(c) => c.compress(&source).unwrap().path,
                None => source,
            };

            let records = read_records(&path, &ReaderConfig::default()).unwrap();
            assert_eq!(records.len(), 3, "{kind}");
            assert_eq!(records[1].get("n"), Some(&Value::Int(1000)));
        }
    }

    #[test]
    fn callback_can_stop_early() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.log");
        fs::write(&path, BODY).unwrap();

        let mut seen = Vec::new();
        let count = for_each_record(&path, &ReaderConfig::default(), |r| {
            seen.push(r);
            Ok(seen.len() < 2)
        })
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(read_records(&dir.path().join("nope.log"), &ReaderConfig::default()).is_err());
    }
}
