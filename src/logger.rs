use {
    crate::{formatter::caller_value, Clock, Fields, Formatter, Level, LevelRouter, LogEntry, LogError, LoggerBuilder},
    chrono::FixedOffset,
    std::{fmt, panic::Location, path::PathBuf, sync::Arc},
};

/// Leveled logger writing to time-rotated files.
///
/// Build one with [`LoggerBuilder`]. The logger is `Send + Sync`; share it
/// behind an `Arc` or install it with [`crate::set_global`].
///
/// Every enabled call formats the entry, routes it to the sink for its
/// level and returns once the bytes have been flushed. `fatal` exits the
/// process and `panic` unwinds, both only after the write has finished.
pub struct Logger {
    pub(crate) level: Level,
    pub(crate) formatter: Formatter,
    pub(crate) router: LevelRouter,
    pub(crate) caller_field: Option<String>,
    pub(crate) time_zone: FixedOffset,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) exit_fn: fn(i32) -> !,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("formatter", &self.formatter)
            .field("router", &self.router)
            .field("caller_field", &self.caller_field)
            .finish_non_exhaustive()
    }
}

impl Logger {
    pub fn builder(path: impl Into<PathBuf>) -> LoggerBuilder {
        LoggerBuilder::new(path)
    }

    /// Minimum severity written.
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level.enabled(self.level)
    }

    pub fn router(&self) -> &LevelRouter {
        &self.router
    }

    /// Write one entry and report the outcome.
    ///
    /// Disabled levels return `Ok(())` without touching the filesystem.
    /// `Level::Fatal` and `Level::Panic` never return; see [`Logger::fatal`]
    /// and [`Logger::panic`].
    #[track_caller]
    pub fn log(&self, level: Level, fields: Fields, message: impl fmt::Display) -> Result<(), LogError> {
        match level {
            Level::Fatal => self.fatal(fields, message),
            Level::Panic => self.panic(fields, message),
            _ if !self.enabled(level) => Ok(()),
            _ => self.write_entry(level, fields, &message.to_string(), Location::caller()),
        }
    }

    #[track_caller]
    pub fn debug(&self, fields: Fields, message: impl fmt::Display) {
        self.emit(Level::Debug, fields, message)
    }

    #[track_caller]
    pub fn info(&self, fields: Fields, message: impl fmt::Display) {
        self.emit(Level::Info, fields, message)
    }

    #[track_caller]
    pub fn warn(&self, fields: Fields, message: impl fmt::Display) {
        self.emit(Level::Warn, fields, message)
    }

    #[track_caller]
    pub fn error(&self, fields: Fields, message: impl fmt::Display) {
        self.emit(Level::Error, fields, message)
    }

    /// Write a fatal entry, then exit the process with status 1.
    ///
    /// The process exits even when `fatal` is below the configured
    /// threshold; only the write is skipped in that case.
    #[track_caller]
    pub fn fatal(&self, fields: Fields, message: impl fmt::Display) -> ! {
        if self.enabled(Level::Fatal) {
            let message = message.to_string();
            if let Err(err) = self.write_entry(Level::Fatal, fields, &message, Location::caller()) {
                report_write_error(Level::Fatal, &err);
            }
        }
        (self.exit_fn)(1)
    }

    /// Write a panic entry, then panic with the message.
    #[track_caller]
    pub fn panic(&self, fields: Fields, message: impl fmt::Display) -> ! {
        let message = message.to_string();
        if let Err(err) = self.write_entry(Level::Panic, fields, &message, Location::caller()) {
            report_write_error(Level::Panic, &err);
        }
        panic!("{message}")
    }

    /// Fire-and-forget write used by the leveled methods.
    #[track_caller]
    pub(crate) fn emit(&self, level: Level, fields: Fields, message: impl fmt::Display) {
        if let Err(err) = self.log(level, fields, message) {
            report_write_error(level, &err);
        }
    }

    fn write_entry(&self, level: Level, mut fields: Fields, message: &str, caller: &Location<'_>) -> Result<(), LogError> {
        if let Some(key) = &self.caller_field {
            fields.insert(key.clone(), caller_value(caller));
        }
        let entry = LogEntry {
            time: self.clock.now().with_timezone(&self.time_zone),
            level,
            message,
            fields: &fields,
        };
        let bytes = self.formatter.render(&entry);
        self.router.route(level).write(&bytes)
    }
}

fn report_write_error(level: Level, err: &LogError) {
    tracing::error!(%level, error = %err, "failed to write log entry");
}
