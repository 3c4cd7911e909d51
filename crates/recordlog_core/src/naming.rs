//! File naming for rotated and compressed logs.

use chrono::{DateTime, Local, Utc};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Timestamp layout embedded in rotated file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H_%M_%S";

/// Renders epoch milliseconds in local time as `yyyy-MM-dd_HH_mm_ss`.
pub fn format_timestamp(millis: i64) -> String {
    let utc = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default();
    utc.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// Returns `<leading>[_<n>]<suffix>` for the smallest `n` not taken.
///
/// `n` is omitted when zero.
pub(crate) fn first_free_path(
    leading: &Path,
    suffix: &str,
    taken: impl Fn(&Path) -> bool,
) -> PathBuf {
    let mut index = 0u64;
    loop {
        let mut name = OsString::from(leading.as_os_str());
        if index > 0 {
            name.push(format!("_{index}"));
        }
        name.push(suffix);
        let candidate = PathBuf::from(name);
        if !taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// Appends `extension` to the full path, keeping the existing extension.
pub(crate) fn with_appended(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn timestamp_layout() {
        let text = format_timestamp(0);
        assert_eq!(text.len(), "yyyy-MM-dd_HH_mm_ss".len());
        assert_eq!(text.as_bytes()[4], b'-');
        assert_eq!(text.as_bytes()[10], b'_');
        assert!(!text.contains(':'));
    }

    #[test]
    fn first_free_path_skips_taken() {
        let taken: HashSet<PathBuf> = ["m_ts.log", "m_ts_1.log"].iter().map(PathBuf::from).collect();
        let path = first_free_path(Path::new("m_ts"), ".log", |p| taken.contains(p));
        assert_eq!(path, PathBuf::from("m_ts_2.log"));

        let path = first_free_path(Path::new("m_ts"), ".log", |_| false);
        assert_eq!(path, PathBuf::from("m_ts.log"));
    }

    #[test]
    fn appended_extension() {
        assert_eq!(
            with_appended(Path::new("dir/a.log"), ".gz"),
            PathBuf::from("dir/a.log.gz")
        );
    }
}
