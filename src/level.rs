use {
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

/// Severity of a log entry.
///
/// Variants are declared from most to least severe, so the derived ordering
/// reads `Panic < Fatal < Error < Warn < Info < Debug`. A logger configured
/// with threshold `t` writes every level `l` where `l <= t`.
///
/// # Examples
/// ```
/// use levelroll::Level;
///
/// assert!(Level::Error.enabled(Level::Info));
/// assert!(!Level::Debug.enabled(Level::Info));
/// assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Written, then the calling thread unwinds.
    Panic,
    /// Written, then the process exits.
    Fatal,
    Error,
    #[serde(alias = "warning")]
    Warn,
    #[default]
    Info,
    Debug,
}

impl Level {
    /// Every level, most severe first. Index matches [`Level::index`].
    pub const ALL: [Level; 6] = [
        Level::Panic,
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
    ];

    /// Lowercase name, used for per-level file names and structured output.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Panic => "panic",
            Level::Fatal => "fatal",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }

    /// Uppercase label used by the text formatter.
    pub fn label(&self) -> &'static str {
        match self {
            Level::Panic => "PANIC",
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    /// Position in [`Level::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Whether this level passes a minimum-severity threshold.
    pub fn enabled(&self, threshold: Level) -> bool {
        *self <= threshold
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no known level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown log level '{0}'")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "panic" => Ok(Level::Panic),
            "fatal" => Ok(Level::Fatal),
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}
