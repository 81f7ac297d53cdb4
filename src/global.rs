//! Optional process-wide logger.
//!
//! Nothing in the rotation core reads this; it only exists so applications
//! can log without threading a [`Logger`] handle everywhere. Calls made
//! before [`set_global`] print to standard error instead.

use {
    crate::{options::DEFAULT_TIMESTAMP_PATTERN, Fields, Format, Formatter, Level, LogEntry, LogError, Logger},
    chrono::Local,
    once_cell::sync::OnceCell,
    std::{
        fmt,
        io::{self, Write as _},
    },
};

static GLOBAL_LOGGER: OnceCell<Logger> = OnceCell::new();

/// Threshold applied to the stderr fallback.
const FALLBACK_LEVEL: Level = Level::Info;

/// Install `logger` as the process-wide logger. Can only succeed once.
pub fn set_global(logger: Logger) -> Result<(), LogError> {
    GLOBAL_LOGGER.set(logger).map_err(|_| LogError::GlobalAlreadySet)
}

pub fn global() -> Option<&'static Logger> {
    GLOBAL_LOGGER.get()
}

#[track_caller]
pub fn debug(fields: Fields, message: impl fmt::Display) {
    dispatch(Level::Debug, fields, message)
}

#[track_caller]
pub fn info(fields: Fields, message: impl fmt::Display) {
    dispatch(Level::Info, fields, message)
}

#[track_caller]
pub fn warn(fields: Fields, message: impl fmt::Display) {
    dispatch(Level::Warn, fields, message)
}

#[track_caller]
pub fn error(fields: Fields, message: impl fmt::Display) {
    dispatch(Level::Error, fields, message)
}

#[track_caller]
pub fn fatal(fields: Fields, message: impl fmt::Display) -> ! {
    match GLOBAL_LOGGER.get() {
        Some(logger) => logger.fatal(fields, message),
        None => {
            write_stderr(Level::Fatal, &fields, &message.to_string());
            std::process::exit(1)
        }
    }
}

#[track_caller]
pub fn panic(fields: Fields, message: impl fmt::Display) -> ! {
    match GLOBAL_LOGGER.get() {
        Some(logger) => logger.panic(fields, message),
        None => {
            let message = message.to_string();
            write_stderr(Level::Panic, &fields, &message);
            panic!("{message}")
        }
    }
}

#[track_caller]
fn dispatch(level: Level, fields: Fields, message: impl fmt::Display) {
    match GLOBAL_LOGGER.get() {
        Some(logger) => logger.emit(level, fields, message),
        None if level.enabled(FALLBACK_LEVEL) => write_stderr(level, &fields, &message.to_string()),
        None => {}
    }
}

fn write_stderr(level: Level, fields: &Fields, message: &str) {
    let entry = LogEntry {
        time: Local::now().fixed_offset(),
        level,
        message,
        fields,
    };
    let line = Formatter::new(Format::Text, DEFAULT_TIMESTAMP_PATTERN).render(&entry);
    let _ = io::stderr().lock().write_all(&line);
}
