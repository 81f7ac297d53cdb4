//! Time-rotating file sink.

use {
    crate::{formatter::check_strftime, retention, Clock, LogError},
    chrono::{DateTime, FixedOffset, Local, Offset, Utc},
    regex::Regex,
    serde::Deserialize,
    std::{
        ffi::OsString,
        fs,
        io::{self, Write as _},
        path::{Path, PathBuf},
        sync::{Arc, Mutex, PoisonError},
        time::{Duration, SystemTime},
    },
};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Specifies the time zone used to align rotation boundaries and to render
/// dates in rotated file names.
///
/// The zone is resolved to a fixed offset when the logger is built, so a
/// daylight-saving change while the process runs does not move boundaries.
///
/// # Examples
/// ```
/// use levelroll::TimeZone;
/// use chrono::FixedOffset;
///
/// let utc = TimeZone::UTC;
/// let local = TimeZone::Local;
/// let china = TimeZone::Fix(FixedOffset::east_opt(8 * 3600).unwrap());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZone {
    /// Use UTC. File names do not depend on where the process runs.
    UTC,
    /// Use the system's local offset at build time.
    #[default]
    Local,
    /// Use a fixed offset.
    #[serde(skip)]
    Fix(FixedOffset),
}

impl TimeZone {
    pub fn offset(&self) -> FixedOffset {
        match self {
            TimeZone::UTC => Utc.fix(),
            TimeZone::Local => Local::now().offset().to_owned(),
            TimeZone::Fix(fixed_offset) => *fixed_offset,
        }
    }
}

/// Rotation settings shared by every sink of one logger.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Length of one rotation period. Must be at least one second.
    pub rotation_period: Duration,
    /// Rotated files older than this are deleted on the next sweep.
    pub max_age: Duration,
    /// strftime pattern appended to the base path, rendered at period start.
    pub date_suffix_pattern: String,
    pub time_zone: FixedOffset,
    /// Unix mode bits applied to newly created files.
    pub file_mode: Option<u32>,
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), LogError> {
        if self.rotation_period.as_secs() == 0 {
            return Err(LogError::ZeroRotationPeriod);
        }
        if self.max_age < self.rotation_period {
            return Err(LogError::RetentionShorterThanRotation {
                max_age: self.max_age,
                rotation_period: self.rotation_period,
            });
        }
        if self.date_suffix_pattern.is_empty() || self.date_suffix_pattern.contains('/') {
            return Err(LogError::InvalidPattern(format!(
                "date suffix '{}' must be non-empty and must not contain '/'",
                self.date_suffix_pattern
            )));
        }
        check_strftime(&self.date_suffix_pattern)
    }

    /// Start of the rotation period containing `now`.
    ///
    /// Periods are aligned to the Unix epoch in the configured offset, so
    /// with a 24h period every file starts at local midnight. The result
    /// depends only on `now`, never on when the last rotation happened.
    pub fn period_start(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        let period = self.rotation_period.as_secs().max(1) as i64;
        let offset = i64::from(self.time_zone.local_minus_utc());
        let start = (now.timestamp() + offset).div_euclid(period) * period - offset;
        DateTime::from_timestamp(start, 0).unwrap_or(now).with_timezone(&self.time_zone)
    }

    /// `<base>-<period start rendered with the date suffix pattern>`.
    pub fn rotated_path(&self, base: &Path, period_start: &DateTime<FixedOffset>) -> PathBuf {
        let mut name = OsString::from(base.as_os_str());
        name.push("-");
        name.push(period_start.format(&self.date_suffix_pattern).to_string());
        PathBuf::from(name)
    }
}

struct SinkState {
    file: fs::File,
    period_start: DateTime<FixedOffset>,
    path: PathBuf,
}

/// Owns one physical log stream and rotates it on period boundaries.
///
/// All writes, rotations, alias updates and retention sweeps for a sink run
/// under one lock, so concurrent writers never create two files for the same
/// period, never interleave bytes, and never write into a file being swept.
pub struct RollingSink {
    base: PathBuf,
    directory: PathBuf,
    config: RotationConfig,
    pattern: Regex,
    clock: Arc<dyn Clock>,
    state: Mutex<SinkState>,
}

impl std::fmt::Debug for RollingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollingSink")
            .field("base", &self.base)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RollingSink {
    /// Open the file for the current period.
    ///
    /// Creates missing parent directories, points the alias at the new file
    /// and sweeps expired siblings. Fails if `base` is relative or if the
    /// directory or file cannot be created.
    pub fn new(base: impl Into<PathBuf>, config: RotationConfig, clock: Arc<dyn Clock>) -> Result<Self, LogError> {
        let base = base.into();
        config.validate()?;
        if !base.is_absolute() {
            return Err(LogError::RelativePath(base));
        }
        let file_name = base
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| LogError::CreateFileFailed(base.clone(), "log path has no usable file name".to_owned()))?;
        let pattern = retention::rotated_file_pattern(file_name)?;
        let directory = base.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/"));
        fs::create_dir_all(&directory)
            .map_err(|err| LogError::CreateDirectoryFailed(directory.clone(), err.to_string()))?;

        let now = clock.now();
        let period_start = config.period_start(now);
        let path = config.rotated_path(&base, &period_start);
        let file = create_log_file(&path, config.file_mode)?;

        let sink = RollingSink {
            base,
            directory,
            config,
            pattern,
            clock,
            state: Mutex::new(SinkState {
                file,
                period_start,
                path: path.clone(),
            }),
        };
        sink.update_alias(&path);
        sink.sweep(&path, now);
        Ok(sink)
    }

    /// Append `buf`, rotating first if the clock has entered a new period.
    ///
    /// The bytes are flushed before returning. If rotation fails the bytes
    /// still go to the previous file and the rotation error is returned;
    /// the next write retries the rotation.
    pub fn write(&self, buf: &[u8]) -> Result<(), LogError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        let period_start = self.config.period_start(now);
        let rotated = if period_start != state.period_start {
            self.rotate(&mut state, period_start, now)
        } else {
            Ok(())
        };
        state.file.write_all(buf)?;
        state.file.flush()?;
        rotated
    }

    /// Path of the file currently being written.
    pub fn current_path(&self) -> PathBuf {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).path.clone()
    }

    /// Start of the period the current file belongs to.
    pub fn period_start(&self) -> DateTime<FixedOffset> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).period_start
    }

    /// The stable name that always points at the current file.
    pub fn alias_path(&self) -> &Path {
        &self.base
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Switch to the file for `period_start`.
    ///
    /// The new file is opened before the old handle is given up, so on
    /// failure the sink keeps writing to the old file.
    fn rotate(&self, state: &mut SinkState, period_start: DateTime<FixedOffset>, now: DateTime<Utc>) -> Result<(), LogError> {
        let path = self.config.rotated_path(&self.base, &period_start);
        let file = match create_log_file(&path, self.config.file_mode) {
            Ok(file) => file,
            Err(err) => {
                tracing::error!(
                    path = %path.display(),
                    current = %state.path.display(),
                    error = %err,
                    "failed to rotate log file, continuing with the current one"
                );
                return Err(err);
            }
        };
        state.file.flush()?;
        state.file = file;
        state.period_start = period_start;
        state.path.clone_from(&path);

        self.update_alias(&path);
        self.sweep(&path, now);
        Ok(())
    }

    /// Atomically repoint the alias: a temporary symlink is renamed over it.
    #[cfg(unix)]
    fn update_alias(&self, target: &Path) {
        let mut tmp = OsString::from(self.base.as_os_str());
        tmp.push("_symlink");
        let tmp = PathBuf::from(tmp);
        let _ = fs::remove_file(&tmp);
        let result = std::os::unix::fs::symlink(target, &tmp).and_then(|()| fs::rename(&tmp, &self.base));
        if let Err(err) = result {
            let _ = fs::remove_file(&tmp);
            tracing::warn!(alias = %self.base.display(), target = %target.display(), error = %err, "failed to update log alias");
        }
    }

    #[cfg(not(unix))]
    fn update_alias(&self, _target: &Path) {}

    fn sweep(&self, keep: &Path, now: DateTime<Utc>) {
        retention::sweep(&self.directory, &self.pattern, keep, SystemTime::from(now), self.config.max_age);
    }
}

impl io::Write for &RollingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RollingSink::write(*self, buf).map_err(|err| match err {
            LogError::FileIOError(err) => err,
            other => io::Error::other(other.to_string()),
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // every write is flushed before it returns
        Ok(())
    }
}

/// Open `log_path` for appending, creating it and its directory if needed.
fn create_log_file(log_path: &Path, file_mode: Option<u32>) -> Result<fs::File, LogError> {
    let mut open_options = fs::OpenOptions::new();
    open_options.append(true).create(true);

    let mut create_log_file_res = open_options.open(log_path);
    if create_log_file_res.is_err() {
        // The directory may have been removed since construction.
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| LogError::CreateDirectoryFailed(parent.to_path_buf(), err.to_string()))?;
            create_log_file_res = open_options.open(log_path);
        }
    }

    let log_file =
        create_log_file_res.map_err(|err| LogError::CreateFileFailed(log_path.to_path_buf(), err.to_string()))?;

    set_permissions(log_path, file_mode)?;

    Ok(log_file)
}

/// Apply `file_mode` to `path`. Unix only; elsewhere the mode is ignored.
fn set_permissions(path: &Path, file_mode: Option<u32>) -> Result<(), LogError> {
    if let Some(mode) = file_mode {
        #[cfg(unix)]
        {
            fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|err| {
                LogError::SetFilePermissionsError {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                }
            })?
        }
        #[cfg(not(unix))]
        {
            let _ = (path, mode);
            tracing::warn!("setting file permissions is not supported on non-unix platforms");
        }
    }
    Ok(())
}
