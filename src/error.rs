use std::{path::PathBuf, time::Duration};

/// Errors that can occur when building or writing through a logger.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Log path must be absolute: '{0}'")]
    RelativePath(PathBuf),
    #[error("Rotation period must be at least one second")]
    ZeroRotationPeriod,
    #[error("Max age {max_age:?} is shorter than the rotation period {rotation_period:?}")]
    RetentionShorterThanRotation { max_age: Duration, rotation_period: Duration },
    #[error("Failed to create directory '{0}': {1}")]
    CreateDirectoryFailed(PathBuf, String),
    #[error("Failed to create file '{0}': {1}")]
    CreateFileFailed(PathBuf, String),
    #[error("Failed to set file permissions for '{path}': {error}")]
    SetFilePermissionsError { path: PathBuf, error: String },
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("File IO error: {0}")]
    FileIOError(#[from] std::io::Error),
    #[error("A global logger has already been installed")]
    GlobalAlreadySet,
}
