//! # levelroll
//!
//! levelroll is a leveled logger that writes structured entries to files
//! rotated on a fixed time period and removes files older than a retention
//! window. Entries are rendered as plain text or JSON and routed either to a
//! single file family or to one file family per level.
//!
//! Every rotated file is named after the start of its period
//! (`app.log-20250401`), and on Unix a stable symlink (`app.log`) always
//! points at the newest one so tools like `tail -F` can follow it.
//! Rotation boundaries are computed from wall-clock time in a configurable
//! time zone, so an idle process still rotates correctly on its next write.
//!
//! ## Example
//!
//! ```rust
//! use levelroll::{fields, Format, Level, LoggerBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = tempfile::tempdir()?;
//!     let logger = LoggerBuilder::new(dir.path().join("app.log"))
//!         .format(Format::Structured)
//!         .level(Level::Debug)
//!         .record_caller(true)
//!         .build()?;
//!
//!     logger.info(fields! { "hello" => "world" }, "hello");
//!     levelroll::warn!(logger, { "attempt" => 3 }, "retrying in {}s", 5);
//!     levelroll::debug!(logger, "plain message");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Layout on disk
//!
//! | mode | rotated files | alias |
//! |---|---|---|
//! | shared | `<path>-<date>` | `<path>` |
//! | separate | `<path>.<level>-<date>` | `<path>.<level>` |

mod clock;
mod error;
mod formatter;
mod global;
mod level;
mod logger;
mod options;
pub mod retention;
mod roller;
mod router;

pub use {
    clock::{Clock, ManualClock, SystemClock},
    error::LogError,
    formatter::{to_field_value, Fields, Format, Formatter, LogEntry, LEVEL_KEY, MESSAGE_KEY, TIME_KEY},
    global::{global, set_global},
    level::{Level, ParseLevelError},
    logger::Logger,
    options::{
        LoggerBuilder, Options, DEFAULT_CALLER_FIELD_NAME, DEFAULT_DATE_SUFFIX_PATTERN, DEFAULT_MAX_AGE,
        DEFAULT_ROTATION_PERIOD, DEFAULT_TIMESTAMP_PATTERN,
    },
    roller::{RollingSink, RotationConfig, TimeZone},
    router::{level_path, LevelRouter},
};

/// Leveled calls against the global logger installed with [`set_global`].
pub mod global_logger {
    pub use crate::global::{debug, error, fatal, info, panic, warn};
}

/// Build [`Fields`] from `key => value` pairs.
///
/// Values may be anything serializable; values that cannot be represented
/// are stored as a `!ERROR: ...` string.
///
/// ```
/// let fields = levelroll::fields! { "user" => "bob", "tries" => 3 };
/// assert_eq!(fields["tries"], 3);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert(::std::string::ToString::to_string(&$key), $crate::to_field_value(&$value));
        )+
        fields
    }};
}

/// Log at a level chosen at runtime and return the write result.
///
/// ```ignore
/// levelroll::log!(logger, Level::Warn, { "code" => 503 }, "upstream {} failed", name)?;
/// levelroll::log!(logger, Level::Info, "no fields")?;
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, { $($key:expr => $value:expr),* $(,)? }, $($arg:tt)+) => {
        $logger.log($level, $crate::fields!($($key => $value),*), ::std::format_args!($($arg)+))
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, $crate::Fields::new(), ::std::format_args!($($arg)+))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __leveled {
    ($method:ident, $logger:expr, { $($key:expr => $value:expr),* $(,)? }, $($arg:tt)+) => {
        $logger.$method($crate::fields!($($key => $value),*), ::std::format_args!($($arg)+))
    };
    ($method:ident, $logger:expr, $($arg:tt)+) => {
        $logger.$method($crate::Fields::new(), ::std::format_args!($($arg)+))
    };
}

/// `debug!(logger, { k => v, .. }, "fmt", args..)` or `debug!(logger, "fmt", args..)`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => { $crate::__leveled!(debug, $($arg)+) };
}

/// `info!(logger, { k => v, .. }, "fmt", args..)` or `info!(logger, "fmt", args..)`
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => { $crate::__leveled!(info, $($arg)+) };
}

/// `warn!(logger, { k => v, .. }, "fmt", args..)` or `warn!(logger, "fmt", args..)`
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => { $crate::__leveled!(warn, $($arg)+) };
}

/// `error!(logger, { k => v, .. }, "fmt", args..)` or `error!(logger, "fmt", args..)`
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => { $crate::__leveled!(error, $($arg)+) };
}

/// Write a fatal entry and exit the process.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => { $crate::__leveled!(fatal, $($arg)+) };
}

/// Write a panic entry, then panic with the message.
///
/// Named apart from [`std::panic!`] so both stay usable side by side.
#[macro_export]
macro_rules! log_panic {
    ($($arg:tt)+) => { $crate::__leveled!(panic, $($arg)+) };
}
