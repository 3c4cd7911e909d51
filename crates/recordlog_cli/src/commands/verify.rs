//! Verify command implementation.

use crate::error::{CliError, CliResult};
use recordlog_core::{for_each_record, ReaderConfig};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Verification result for one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// The file checked.
    pub path: PathBuf,
    /// Records read before the end or the first error.
    pub records: usize,
    /// The first error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Checks that every record of `path` can be framed and parsed.
pub fn verify_file(path: &Path, config: &ReaderConfig) -> FileReport {
    let mut records = 0;
    let error = for_each_record(path, config, |_| {
        records += 1;
        Ok(true)
    })
    .err()
    .map(|e| e.to_string());

    FileReport {
        path: path.to_path_buf(),
        records,
        error,
    }
}

/// Runs the verify command.
pub fn run<W: Write>(
    files: &[PathBuf],
    json: bool,
    config: &ReaderConfig,
    out: &mut W,
) -> CliResult<Vec<FileReport>> {
    let reports: Vec<FileReport> = files.iter().map(|p| verify_file(p, config)).collect();

    if json {
        serde_json::to_writer_pretty(&mut *out, &reports)?;
        writeln!(out)?;
    } else {
        for report in &reports {
            match &report.error {
                None => writeln!(out, "✓ {}: {} records", report.path.display(), report.records)?,
                Some(e) => writeln!(
                    out,
                    "✗ {}: {} records, then {e}",
                    report.path.display(),
                    report.records
                )?,
            }
        }
    }
    out.flush()?;

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        return Err(CliError::VerificationFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn counts_good_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("good.log");
        fs::write(&path, "{\"a\":1}\n{\"b\":2}\n").unwrap();

        let mut out = Vec::new();
        let reports = run(&[path], false, &ReaderConfig::default(), &mut out).unwrap();
        assert_eq!(reports[0].records, 2);
        assert!(String::from_utf8(out).unwrap().contains("2 records"));
    }

    #[test]
    fn reports_truncated_file() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.log");
        let bad = dir.path().join("bad.log");
        fs::write(&good, "{\"a\":1}\n").unwrap();
        fs::write(&bad, "{\"a\":1}\n{\"b\":").unwrap();

        let mut out = Vec::new();
        let err = run(&[good, bad.clone()], true, &ReaderConfig::default(), &mut out).unwrap_err();
        assert!(matches!(err, CliError::VerificationFailed { failed: 1, total: 2 }));

        let report = verify_file(&bad, &ReaderConfig::default());
        assert_eq!(report.records, 1);
        assert!(report.error.unwrap().contains("stream ended"));
    }
}
