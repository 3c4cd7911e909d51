//! Compress command implementation.

use crate::error::{CliError, CliResult};
use recordlog_core::{CompressedFile, CompressionKind, Compressor};
use std::io::Write;
use std::path::Path;

/// Compresses a retired log file in place, as the rolling sink would have.
pub fn run<W: Write>(path: &Path, kind: CompressionKind, out: &mut W) -> CliResult<CompressedFile> {
    let compressor = Compressor::for_kind(kind)
        .ok_or_else(|| CliError::Usage("compression kind `none` does nothing".to_string()))?;
    let done = compressor
        .compress(path)
        .map_err(recordlog_core::CoreError::from)?;

    writeln!(
        out,
        "{} -> {} ({} -> {} bytes)",
        path.display(),
        done.path.display(),
        done.original_size,
        done.compressed_size
    )?;
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn compresses_and_removes_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("left.log");
        fs::write(&path, "{\"a\":1}\n").unwrap();

        let mut out = Vec::new();
        let done = run(&path, CompressionKind::Zip, &mut out).unwrap();
        assert_eq!(done.path, dir.path().join("left.log.zip"));
        assert!(!path.exists());
    }

    #[test]
    fn none_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("left.log");
        fs::write(&path, "{}\n").unwrap();
        assert!(matches!(
            run(&path, CompressionKind::None, &mut Vec::new()),
            Err(CliError::Usage(_))
        ));
        assert!(path.exists());
    }
}
