//! Dump command implementation.

use crate::error::CliResult;
use clap::ValueEnum;
use recordlog_codec::{encode_record_line, to_json, Record, Value};
use recordlog_core::{for_each_record, ReaderConfig};
use std::io::Write;
use std::path::PathBuf;

/// How records are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON object per line, as stored.
    #[default]
    Json,
    /// Indented JSON.
    Pretty,
    /// `key=value` pairs.
    Text,
}

/// Runs the dump command. Returns the number of records printed.
pub fn run<W: Write>(
    files: &[PathBuf],
    format: OutputFormat,
    limit: Option<usize>,
    config: &ReaderConfig,
    out: &mut W,
) -> CliResult<usize> {
    let max_records = limit.unwrap_or(usize::MAX);
    let mut printed = 0;

    for path in files {
        if printed >= max_records {
            break;
        }
        tracing::debug!(path = %path.display(), "dumping log file");

        let mut failure = None;
        for_each_record(path, config, |record| {
            if let Err(e) = print_record(&record, format, out) {
                failure = Some(e);
                return Ok(false);
            }
            printed += 1;
            Ok(printed < max_records)
        })?;
        if let Some(e) = failure {
            return Err(e);
        }
    }

    out.flush()?;
    Ok(printed)
}

fn print_record<W: Write>(record: &Record, format: OutputFormat, out: &mut W) -> CliResult<()> {
    match format {
        OutputFormat::Json => out.write_all(&encode_record_line(record)?)?,
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut *out, record)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            let mut line = String::new();
            for (key, value) in record.iter() {
                if value.is_null() {
                    continue;
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(key);
                line.push('=');
                match value {
                    Value::Text(text) => line.push_str(text),
                    other => line.push_str(&String::from_utf8_lossy(&to_json(other)?)),
                }
            }
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}
