//! Compression of retired log files.
//!
//! A [`Compressor`] turns `app_<ts>.log` into `app_<ts>.log.gz` (or `.zip`):
//!
//! 1. Stream the source through the codec into `<target>.temp`
//! 2. Sync and rename the temp file to the final name
//! 3. Delete the source
//!
//! On failure the temp file is removed and the source is left untouched, so
//! a crash or a full disk never loses a retired log.

use crate::config::CompressionKind;
use crate::error::CompressError;
use crate::naming::{first_free_path, with_appended};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt::Debug;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Suffix of in-progress archives.
pub const TEMP_SUFFIX: &str = ".temp";

/// A compression format.
///
/// Implementations read `source` to the end and write the compressed form to
/// `target`. They must not touch any other file.
pub trait CompressionCodec: Send + Sync + Debug {
    /// Extension of the produced artifact, including the dot.
    fn extension(&self) -> &str;

    /// Compresses `source` into `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, compressing or writing fails.
    fn encode(&self, source: &Path, target: &mut File) -> Result<(), CompressError>;
}

/// Gzip stream codec.
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: Compression,
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl GzipCodec {
    /// Creates a codec with the given level (0-9).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl CompressionCodec for GzipCodec {
    fn extension(&self) -> &str {
        ".gz"
    }

    fn encode(&self, source: &Path, target: &mut File) -> Result<(), CompressError> {
        let mut input = File::open(source).map_err(|e| CompressError::io(source, e))?;
        let mut encoder = GzEncoder::new(target, self.level);
        io::copy(&mut input, &mut encoder).map_err(|e| CompressError::io(source, e))?;
        encoder
            .finish()
            .and_then(|out| out.flush())
            .map_err(|e| CompressError::io(source, e))
    }
}

/// Zip archive codec holding a single deflated entry named after the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCodec;

impl CompressionCodec for ZipCodec {
    fn extension(&self) -> &str {
        ".zip"
    }

    fn encode(&self, source: &Path, target: &mut File) -> Result<(), CompressError> {
        let entry_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CompressError::InvalidSource {
                path: source.to_path_buf(),
            })?;
        let mut input = File::open(source).map_err(|e| CompressError::io(source, e))?;

        let mut writer = ZipWriter::new(target);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer
            .start_file(entry_name, options)
            .map_err(|e| CompressError::zip(source, e))?;
        io::copy(&mut input, &mut writer).map_err(|e| CompressError::io(source, e))?;
        writer.finish().map_err(|e| CompressError::zip(source, e))?;
        Ok(())
    }
}

/// Result of a successful compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedFile {
    /// The archive that now holds the data.
    pub path: PathBuf,
    /// Size of the source before compression.
    pub original_size: u64,
    /// Size of the archive.
    pub compressed_size: u64,
}

/// Compresses retired files with one codec.
#[derive(Debug, Clone)]
pub struct Compressor {
    codec: Arc<dyn CompressionCodec>,
}

impl Compressor {
    /// Creates a compressor around a codec.
    pub fn new(codec: Arc<dyn CompressionCodec>) -> Self {
        Self { codec }
    }

    /// Returns the compressor for a kind, or `None` for
    /// [`CompressionKind::None`].
    pub fn for_kind(kind: CompressionKind) -> Option<Self> {
        match kind {
            CompressionKind::None => None,
            CompressionKind::Gzip => Some(Self::new(Arc::new(GzipCodec::default()))),
            CompressionKind::Zip => Some(Self::new(Arc::new(ZipCodec))),
        }
    }

    /// Extension of the produced artifact, including the dot.
    pub fn extension(&self) -> &str {
        self.codec.extension()
    }

    /// Compresses `source` next to itself and deletes it.
    ///
    /// The archive is `<source><ext>`, or `<source>_<n><ext>` if that name is
    /// taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the archive cannot
    /// be written. The source is still in place when this fails.
    pub fn compress(&self, source: &Path) -> Result<CompressedFile, CompressError> {
        if source.file_name().is_none() {
            return Err(CompressError::InvalidSource {
                path: source.to_path_buf(),
            });
        }
        let original_size = fs::metadata(source)
            .map_err(|e| CompressError::io(source, e))?
            .len();

        let extension = self.codec.extension();
        let target = first_free_path(source, extension, |p| p.exists());
        let temp = first_free_path(source, &format!("{extension}{TEMP_SUFFIX}"), |p| {
            p.exists()
        });

        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            "compressing retired log"
        );

        if let Err(e) = self.write_temp(source, &temp) {
            remove_temp(&temp);
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp, &target) {
            remove_temp(&temp);
            return Err(CompressError::io(source, e));
        }

        if let Err(e) = fs::remove_file(source) {
            tracing::error!(
                path = %source.display(),
                error = %e,
                "unable to remove compressed source"
            );
        }

        let compressed_size = fs::metadata(&target)
            .map_err(|e| CompressError::io(&target, e))?
            .len();

        Ok(CompressedFile {
            path: target,
            original_size,
            compressed_size,
        })
    }

    fn write_temp(&self, source: &Path, temp: &Path) -> Result<(), CompressError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp)
            .map_err(|e| CompressError::io(temp, e))?;
        self.codec.encode(source, &mut file)?;
        file.sync_all().map_err(|e| CompressError::io(temp, e))
    }
}

fn remove_temp(temp: &Path) {
    if temp.exists() {
        if let Err(e) = fs::remove_file(temp) {
            tracing::warn!(path = %temp.display(), error = %e, "unable to remove temp file");
        }
    }
}

/// Path a compressor for `kind` would try first for `source`.
pub fn compressed_path(source: &Path, kind: CompressionKind) -> Option<PathBuf> {
    kind.extension().map(|ext| with_appended(source, ext))
}
