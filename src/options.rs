use {
    crate::{
        formatter::check_strftime, Clock, Format, Formatter, Level, LevelRouter, LogError, Logger, RotationConfig,
        SystemClock, TimeZone,
    },
    serde::{Deserialize, Deserializer},
    std::{path::PathBuf, sync::Arc, time::Duration},
};

/// Default retention window: 15 days.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(15 * 24 * 60 * 60);
/// Default rotation period: 24 hours.
pub const DEFAULT_ROTATION_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);
/// Default date suffix of rotated files, e.g. `app.log-20240517`.
pub const DEFAULT_DATE_SUFFIX_PATTERN: &str = "%Y%m%d";
/// Default timestamp inside each entry.
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S";
/// Default field name for the caller location.
pub const DEFAULT_CALLER_FIELD_NAME: &str = "call";

/// Construction options for a [`Logger`].
///
/// Can be deserialized from any serde format; durations are given in whole
/// seconds and only `path` is required.
///
/// ```
/// let options: levelroll::Options = serde_json::from_str(r#"{
///     "path": "/var/log/app/app.log",
///     "format": "structured",
///     "level": "debug",
///     "max_age": 604800,
///     "separate_by_level": true
/// }"#).unwrap();
/// assert_eq!(options.max_age, std::time::Duration::from_secs(7 * 24 * 3600));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Options {
    /// Absolute base path of the log file.
    pub path: PathBuf,
    #[serde(default)]
    pub format: Format,
    /// Minimum severity written.
    #[serde(default)]
    pub level: Level,
    #[serde(default = "default_max_age", deserialize_with = "from_secs")]
    pub max_age: Duration,
    #[serde(default = "default_rotation_period", deserialize_with = "from_secs")]
    pub rotation_period: Duration,
    /// Give every level its own file family.
    #[serde(default)]
    pub separate_by_level: bool,
    /// Record the caller's `file:line` under `caller_field_name`.
    #[serde(default)]
    pub record_caller: bool,
    #[serde(default = "default_caller_field_name")]
    pub caller_field_name: String,
    #[serde(default)]
    pub pretty_structured_output: bool,
    /// Nest structured fields under this key instead of flattening them.
    #[serde(default)]
    pub data_key: Option<String>,
    #[serde(default = "default_date_suffix_pattern")]
    pub date_suffix_pattern: String,
    #[serde(default = "default_timestamp_pattern")]
    pub timestamp_pattern: String,
    #[serde(default)]
    pub time_zone: TimeZone,
    /// Unix mode bits for new log files.
    #[serde(default)]
    pub file_mode: Option<u32>,
}

impl Options {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Options {
            path: path.into(),
            format: Format::default(),
            level: Level::default(),
            max_age: DEFAULT_MAX_AGE,
            rotation_period: DEFAULT_ROTATION_PERIOD,
            separate_by_level: false,
            record_caller: false,
            caller_field_name: default_caller_field_name(),
            pretty_structured_output: false,
            data_key: None,
            date_suffix_pattern: default_date_suffix_pattern(),
            timestamp_pattern: default_timestamp_pattern(),
            time_zone: TimeZone::default(),
            file_mode: None,
        }
    }

    fn rotation_config(&self) -> RotationConfig {
        RotationConfig {
            rotation_period: self.rotation_period,
            max_age: self.max_age,
            date_suffix_pattern: self.date_suffix_pattern.clone(),
            time_zone: self.time_zone.offset(),
            file_mode: self.file_mode,
        }
    }

    fn validate(&self) -> Result<(), LogError> {
        if !self.path.is_absolute() {
            return Err(LogError::RelativePath(self.path.clone()));
        }
        check_strftime(&self.timestamp_pattern)?;
        if self.record_caller && self.caller_field_name.is_empty() {
            return Err(LogError::InvalidPattern("caller field name must not be empty".to_owned()));
        }
        Ok(())
    }
}

fn default_max_age() -> Duration {
    DEFAULT_MAX_AGE
}

fn default_rotation_period() -> Duration {
    DEFAULT_ROTATION_PERIOD
}

fn default_caller_field_name() -> String {
    DEFAULT_CALLER_FIELD_NAME.to_owned()
}

fn default_date_suffix_pattern() -> String {
    DEFAULT_DATE_SUFFIX_PATTERN.to_owned()
}

fn default_timestamp_pattern() -> String {
    DEFAULT_TIMESTAMP_PATTERN.to_owned()
}

fn from_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

fn exit_process(code: i32) -> ! {
    std::process::exit(code)
}

/// Provides a fluent interface for configuring [`Logger`] instances.
///
/// # Default Configuration
///
/// * Text output, minimum level `info`
/// * Daily rotation at midnight in the local time zone
/// * Files older than 15 days removed on rotation
/// * All levels in one file
///
/// # Examples
///
/// ```rust
/// use levelroll::{Format, Level, LoggerBuilder};
///
/// let dir = tempfile::tempdir().unwrap();
/// let logger = LoggerBuilder::new(dir.path().join("app.log"))
///     .format(Format::Structured)
///     .level(Level::Debug)
///     .max_age(std::time::Duration::from_secs(7 * 24 * 3600))
///     .separate_by_level(true)
///     .build()
///     .unwrap();
/// logger.info(levelroll::fields! { "port" => 8080 }, "listening");
/// ```
pub struct LoggerBuilder {
    options: Options,
    clock: Arc<dyn Clock>,
    exit_fn: fn(i32) -> !,
}

impl LoggerBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_options(Options::new(path))
    }

    pub fn from_options(options: Options) -> Self {
        LoggerBuilder {
            options,
            clock: Arc::new(SystemClock),
            exit_fn: exit_process,
        }
    }

    pub fn format(self, format: Format) -> Self {
        Self {
            options: Options { format, ..self.options },
            ..self
        }
    }

    /// Set the minimum severity written.
    pub fn level(self, level: Level) -> Self {
        Self {
            options: Options { level, ..self.options },
            ..self
        }
    }

    /// Set how long rotated files are kept.
    pub fn max_age(self, max_age: Duration) -> Self {
        Self {
            options: Options { max_age, ..self.options },
            ..self
        }
    }

    pub fn rotation_period(self, rotation_period: Duration) -> Self {
        Self {
            options: Options {
                rotation_period,
                ..self.options
            },
            ..self
        }
    }

    /// Write each level to its own `<path>.<level>` file family.
    pub fn separate_by_level(self, separate_by_level: bool) -> Self {
        Self {
            options: Options {
                separate_by_level,
                ..self.options
            },
            ..self
        }
    }

    pub fn record_caller(self, record_caller: bool) -> Self {
        Self {
            options: Options {
                record_caller,
                ..self.options
            },
            ..self
        }
    }

    pub fn caller_field_name(self, caller_field_name: impl Into<String>) -> Self {
        Self {
            options: Options {
                caller_field_name: caller_field_name.into(),
                ..self.options
            },
            ..self
        }
    }

    pub fn pretty_structured_output(self, pretty_structured_output: bool) -> Self {
        Self {
            options: Options {
                pretty_structured_output,
                ..self.options
            },
            ..self
        }
    }

    pub fn data_key(self, data_key: impl Into<String>) -> Self {
        Self {
            options: Options {
                data_key: Some(data_key.into()),
                ..self.options
            },
            ..self
        }
    }

    pub fn date_suffix_pattern(self, date_suffix_pattern: impl Into<String>) -> Self {
        Self {
            options: Options {
                date_suffix_pattern: date_suffix_pattern.into(),
                ..self.options
            },
            ..self
        }
    }

    pub fn timestamp_pattern(self, timestamp_pattern: impl Into<String>) -> Self {
        Self {
            options: Options {
                timestamp_pattern: timestamp_pattern.into(),
                ..self.options
            },
            ..self
        }
    }

    /// Set the time zone used for rotation boundaries, file names and
    /// entry timestamps.
    pub fn time_zone(self, time_zone: TimeZone) -> Self {
        Self {
            options: Options { time_zone, ..self.options },
            ..self
        }
    }

    /// Set the file permissions for log files (Unix-like systems only),
    /// e.g. `0o640`.
    pub fn file_mode(self, mode: u32) -> Self {
        Self {
            options: Options {
                file_mode: Some(mode),
                ..self.options
            },
            ..self
        }
    }

    /// Replace the wall clock, mainly for tests.
    pub fn clock(self, clock: Arc<dyn Clock>) -> Self {
        Self { clock, ..self }
    }

    /// Replace the function called after a fatal entry is written.
    /// Defaults to [`std::process::exit`].
    pub fn exit_fn(self, exit_fn: fn(i32) -> !) -> Self {
        Self { exit_fn, ..self }
    }

    /// Validate the options and open every sink.
    pub fn build(self) -> Result<Logger, LogError> {
        let options = self.options;
        options.validate()?;
        let config = options.rotation_config();
        config.validate()?;

        let router = if options.separate_by_level {
            LevelRouter::separate(&options.path, config.clone(), Arc::clone(&self.clock))?
        } else {
            LevelRouter::shared(&options.path, config.clone(), Arc::clone(&self.clock))?
        };
        let formatter = Formatter::new(options.format, options.timestamp_pattern)
            .pretty(options.pretty_structured_output)
            .data_key(options.data_key);

        Ok(Logger {
            level: options.level,
            formatter,
            router,
            caller_field: options.record_caller.then_some(options.caller_field_name),
            time_zone: config.time_zone,
            clock: self.clock,
            exit_fn: self.exit_fn,
        })
    }
}
