//! recordlog CLI
//!
//! Command-line tools for record log files.
//!
//! # Commands
//!
//! - `dump` - Print the records of plain, `.gz` or `.zip` log files
//! - `verify` - Check that every record can be framed and parsed
//! - `compress` - Compress a retired log file left behind at shutdown

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::dump::OutputFormat;
use recordlog_core::{CompressionKind, ReaderConfig, DEFAULT_MAX_BUFFER_SIZE};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Tools for newline-delimited JSON record logs.
#[derive(Parser)]
#[command(name = "recordlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Largest record the reader accepts, in bytes
    #[arg(global = true, long, default_value_t = DEFAULT_MAX_BUFFER_SIZE)]
    max_record_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print records from log files
    Dump {
        /// Log files, plain or compressed
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Verify that log files read back cleanly
    Verify {
        /// Log files, plain or compressed
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compress a retired log file
    Compress {
        /// The file to compress
        file: PathBuf,

        /// Compression kind (gzip, zip)
        #[arg(short, long, default_value = "gzip")]
        kind: CompressionKind,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> error::CliResult<()> {
    let reader_config = ReaderConfig::new()
        .initial_buffer_size(cli.max_record_size.min(ReaderConfig::default().initial_buffer_size))
        .max_buffer_size(cli.max_record_size);
    reader_config.validate()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Dump {
            files,
            format,
            limit,
        } => {
            let printed = commands::dump::run(&files, format, limit, &reader_config, &mut out)?;
            tracing::debug!(records = printed, "dump finished");
        }
        Commands::Verify { files, json } => {
            commands::verify::run(&files, json, &reader_config, &mut out)?;
        }
        Commands::Compress { file, kind } => {
            commands::compress::run(&file, kind, &mut out)?;
        }
    }

    Ok(())
}
