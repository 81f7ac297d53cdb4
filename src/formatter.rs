//! Rendering of log entries into bytes.
//!
//! Formatting is pure and never fails: a value that cannot be serialized is
//! replaced by a `!ERROR: ...` placeholder string so the line is still written.

use {
    crate::{Level, LogError, DEFAULT_TIMESTAMP_PATTERN},
    chrono::{
        format::{Item, StrftimeItems},
        DateTime, FixedOffset,
    },
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    std::{collections::BTreeMap, fmt::Write as _, panic::Location},
};

/// User-supplied key/value pairs attached to an entry.
pub type Fields = BTreeMap<String, Value>;

/// Keys written by the structured formatter itself.
pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const MESSAGE_KEY: &str = "msg";

const RESERVED_KEYS: [&str; 3] = [TIME_KEY, LEVEL_KEY, MESSAGE_KEY];

/// Convert any serializable value into a field value.
///
/// Values serde cannot represent (for example maps with non-string keys) are
/// stringified with a placeholder instead of being dropped.
pub fn to_field_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| Value::String(format!("!ERROR: {err}")))
}

/// One log call, borrowed for the duration of a single dispatch.
#[derive(Debug, Clone)]
pub struct LogEntry<'a> {
    pub time: DateTime<FixedOffset>,
    pub level: Level,
    pub message: &'a str,
    pub fields: &'a Fields,
}

/// Output encoding of log entries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `<timestamp> [<LEVEL>] <message> key=value ...`
    #[default]
    Text,
    /// One JSON object per line (or per block when pretty-printed).
    #[serde(alias = "json")]
    Structured,
}

/// Renders [`LogEntry`] values into bytes ready to append to a file.
#[derive(Debug, Clone)]
pub struct Formatter {
    format: Format,
    timestamp_pattern: String,
    pretty: bool,
    data_key: Option<String>,
}

impl Formatter {
    /// An invalid `timestamp_pattern` is replaced by
    /// [`DEFAULT_TIMESTAMP_PATTERN`] so rendering can never fail.
    pub fn new(format: Format, timestamp_pattern: impl Into<String>) -> Self {
        let mut timestamp_pattern = timestamp_pattern.into();
        if let Err(err) = check_strftime(&timestamp_pattern) {
            tracing::warn!(error = %err, fallback = DEFAULT_TIMESTAMP_PATTERN, "invalid timestamp pattern");
            timestamp_pattern = DEFAULT_TIMESTAMP_PATTERN.to_owned();
        }
        Formatter {
            format,
            timestamp_pattern,
            pretty: false,
            data_key: None,
        }
    }

    /// Pretty-print structured output. Has no effect on text output.
    pub fn pretty(self, pretty: bool) -> Self {
        Formatter { pretty, ..self }
    }

    /// Nest user fields under `key` in structured output instead of
    /// flattening them next to the reserved keys.
    pub fn data_key(self, key: Option<String>) -> Self {
        Formatter { data_key: key, ..self }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn render(&self, entry: &LogEntry<'_>) -> Vec<u8> {
        match self.format {
            Format::Text => self.render_text(entry).into_bytes(),
            Format::Structured => self.render_structured(entry),
        }
    }

    fn render_text(&self, entry: &LogEntry<'_>) -> String {
        let mut line = String::with_capacity(64 + entry.message.len());
        let _ = write!(
            line,
            "{} [{}] {}",
            entry.time.format(&self.timestamp_pattern),
            entry.level.label(),
            TextMessage(entry.message)
        );
        for (key, value) in entry.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            push_text_value(&mut line, value);
        }
        line.push('\n');
        line
    }

    fn render_structured(&self, entry: &LogEntry<'_>) -> Vec<u8> {
        let mut record = Map::new();
        match &self.data_key {
            Some(key) => {
                if !entry.fields.is_empty() {
                    let nested = entry.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                    record.insert(unreserved(key), Value::Object(nested));
                }
            }
            None => {
                for (key, value) in entry.fields {
                    record.insert(unreserved(key), value.clone());
                }
            }
        }
        record.insert(
            TIME_KEY.to_owned(),
            Value::String(entry.time.format(&self.timestamp_pattern).to_string()),
        );
        record.insert(LEVEL_KEY.to_owned(), Value::String(entry.level.name().to_owned()));
        record.insert(MESSAGE_KEY.to_owned(), Value::String(entry.message.to_owned()));

        let record = Value::Object(record);
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(&record)
        } else {
            serde_json::to_vec(&record)
        };
        match encoded {
            Ok(mut bytes) => {
                bytes.push(b'\n');
                bytes
            }
            Err(err) => {
                let mut line = self.render_text(entry);
                line.insert_str(0, &format!("!ERROR: {err}: "));
                line.into_bytes()
            }
        }
    }
}

/// chrono fails while rendering an invalid pattern, so reject it up front.
pub(crate) fn check_strftime(pattern: &str) -> Result<(), LogError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(LogError::InvalidPattern(format!("'{pattern}' is not a valid strftime pattern")));
    }
    Ok(())
}

/// A message is written bare unless it would break the one-line layout.
struct TextMessage<'a>(&'a str);

impl std::fmt::Display for TextMessage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.chars().any(char::is_control) {
            write!(f, "{}", Value::String(self.0.to_owned()))
        } else {
            f.write_str(self.0)
        }
    }
}

/// Format a caller location the way it is stored in the caller field.
pub fn caller_value(location: &Location<'_>) -> Value {
    Value::String(format!("{}:{}", location.file(), location.line()))
}

/// Rename a user key that would shadow one of the reserved keys.
fn unreserved(key: &str) -> String {
    if RESERVED_KEYS.contains(&key) {
        format!("fields.{key}")
    } else {
        key.to_owned()
    }
}

fn push_text_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) if !needs_quoting(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"')
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone, serde_json::json, std::collections::HashMap};

    const PATTERN: &str = "%Y-%m-%d %H:%M:%S";

    fn time() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 3, 9, 8, 7, 6).unwrap()
    }

    fn entry<'a>(level: Level, message: &'a str, fields: &'a Fields) -> LogEntry<'a> {
        LogEntry { time: time(), level, message, fields }
    }

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn text_layout() {
        let f = fields(&[("user", json!("bob")), ("count", json!(3))]);
        let out = Formatter::new(Format::Text, PATTERN).render(&entry(Level::Warn, "disk low", &f));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2024-03-09 08:07:06 [WARN] disk low count=3 user=bob\n"
        );
    }

    #[test]
    fn text_quotes_ambiguous_strings() {
        let f = fields(&[("a", json!("two words")), ("b", json!("")), ("c", json!("k=v"))]);
        let out = Formatter::new(Format::Text, PATTERN).render(&entry(Level::Info, "m", &f));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"a="two words""#));
        assert!(out.contains(r#"b="""#));
        assert!(out.contains(r#"c="k=v""#));
    }

    #[test]
    fn text_honors_timestamp_pattern() {
        let f = Fields::new();
        let out = Formatter::new(Format::Text, "%H:%M").render(&entry(Level::Debug, "x", &f));
        assert_eq!(String::from_utf8(out).unwrap(), "08:07 [DEBUG] x\n");
    }

    #[test]
    fn structured_flattens_fields() {
        let f = fields(&[("hello", json!("world"))]);
        let out = Formatter::new(Format::Structured, PATTERN).render(&entry(Level::Info, "hello", &f));
        assert_eq!(*out.last().unwrap(), b'\n');
        let record: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(record["level"], "info");
        assert_eq!(record["msg"], "hello");
        assert_eq!(record["hello"], "world");
        assert_eq!(record["time"], "2024-03-09 08:07:06");
    }

    #[test]
    fn structured_renames_colliding_fields() {
        let f = fields(&[("level", json!("custom")), ("msg", json!(1))]);
        let out = Formatter::new(Format::Structured, PATTERN).render(&entry(Level::Error, "boom", &f));
        let record: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(record["level"], "error");
        assert_eq!(record["fields.level"], "custom");
        assert_eq!(record["fields.msg"], 1);
    }

    #[test]
    fn structured_nests_under_data_key() {
        let f = fields(&[("hello", json!("world"))]);
        let formatter = Formatter::new(Format::Structured, PATTERN).data_key(Some("data".into()));
        let record: Value = serde_json::from_slice(&formatter.render(&entry(Level::Info, "m", &f))).unwrap();
        assert_eq!(record["data"]["hello"], "world");
        assert!(record.get("hello").is_none());
    }

    #[test]
    fn pretty_changes_whitespace_only() {
        let f = fields(&[("a", json!([1, 2])), ("b", json!({"c": true}))]);
        let e = entry(Level::Info, "m", &f);
        let compact = Formatter::new(Format::Structured, PATTERN).render(&e);
        let pretty = Formatter::new(Format::Structured, PATTERN).pretty(true).render(&e);
        assert_eq!(compact.iter().filter(|b| **b == b'\n').count(), 1);
        assert!(pretty.iter().filter(|b| **b == b'\n').count() > 1);
        let compact: Value = serde_json::from_slice(&compact).unwrap();
        let pretty: Value = serde_json::from_slice(&pretty).unwrap();
        assert_eq!(compact, pretty);
    }

    #[test]
    fn invalid_timestamp_pattern_falls_back_to_default() {
        let f = fields(&[("k", json!("v"))]);
        let text = Formatter::new(Format::Text, "%Q").render(&entry(Level::Info, "kept", &f));
        assert_eq!(String::from_utf8(text).unwrap(), "2024-03-09 08:07:06 [INFO] kept k=v\n");

        let out = Formatter::new(Format::Structured, "%Q").render(&entry(Level::Info, "kept", &f));
        let record: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(record["time"], "2024-03-09 08:07:06");
        assert_eq!(record["msg"], "kept");
    }

    #[test]
    fn text_escapes_multiline_messages() {
        let f = Fields::new();
        let out = Formatter::new(Format::Text, PATTERN).render(&entry(Level::Error, "first\nsecond", &f));
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "2024-03-09 08:07:06 [ERROR] \"first\\nsecond\"\n");
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn unrepresentable_values_become_placeholders() {
        let mut odd = HashMap::new();
        odd.insert((1, 2), "tuple keys are not json");
        let value = to_field_value(&odd);
        assert!(value.as_str().unwrap().starts_with("!ERROR: "));
    }
}
