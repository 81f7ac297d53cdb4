//! Age-based retention of rotated files.

use {
    crate::LogError,
    regex::Regex,
    std::{
        fs, io,
        path::Path,
        time::{Duration, SystemTime},
    },
};

/// Whether a file last modified at `modified` has outlived `max_age`.
///
/// A modification time in the future (clock skew) is never expired.
pub fn is_expired(modified: SystemTime, now: SystemTime, max_age: Duration) -> bool {
    now.duration_since(modified).is_ok_and(|age| age > max_age)
}

/// Build the pattern matching every rotated sibling of `file_name`, i.e.
/// `<file_name>-<anything>`.
pub fn rotated_file_pattern(file_name: &str) -> Result<Regex, LogError> {
    Regex::new(&format!(r"^{}-.+$", regex::escape(file_name))).map_err(|err| LogError::InvalidPattern(err.to_string()))
}

/// Delete expired rotated files in `directory`.
///
/// Only regular files whose name matches `pattern` are considered; symlinks
/// (the current alias) and `keep` (the file being written) are never touched.
/// Deletion is best effort: files that vanished concurrently are skipped
/// silently and other failures are reported through `tracing`.
///
/// Returns the number of files removed.
pub fn sweep(directory: &Path, pattern: &Regex, keep: &Path, now: SystemTime, max_age: Duration) -> usize {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(directory = %directory.display(), error = %err, "failed to list log directory");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path == keep {
            continue;
        }
        let matches = entry.file_name().to_str().is_some_and(|name| pattern.is_match(name));
        if !matches {
            continue;
        }
        let Ok(metadata) = fs::symlink_metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if !is_expired(modified, now, max_age) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed expired log file");
                removed += 1;
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove expired log file");
            }
        }
    }
    removed
}
