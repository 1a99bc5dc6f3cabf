//! The logging event model as scripts see it.
//!
//! Every type here serialises into the `serde_json::Value` shape that ends up
//! in a script binding, so scripts can address e.g. `message.text` or
//! `logEvent.level`.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

/// Event severity. Lower integer means more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum Level {
    Off,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    All,
}

impl Level {
    pub fn int_level(self) -> i32 {
        match self {
            Level::Off => 0,
            Level::Fatal => 100,
            Level::Error => 200,
            Level::Warn => 300,
            Level::Info => 400,
            Level::Debug => 500,
            Level::Trace => 600,
            Level::All => i32::MAX,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Off => "OFF",
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
            Level::All => "ALL",
        }
    }

    /// True when `self` is at least as severe as `other`.
    pub fn is_more_specific_than(self, other: Level) -> bool {
        self.int_level() <= other.int_level()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Level::Off,
            "FATAL" => Level::Fatal,
            "ERROR" => Level::Error,
            "WARN" => Level::Warn,
            "INFO" => Level::Info,
            "DEBUG" => Level::Debug,
            "TRACE" => Level::Trace,
            "ALL" => Level::All,
            other => return Err(format!("unknown level `{other}`")),
        })
    }
}

impl TryFrom<String> for Level {
    type Error = String;

    fn try_from(s: String) -> Result<Self, String> {
        s.parse()
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A named tag attached to an event, optionally with parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<Marker>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), parents: Vec::new() }
    }

    pub fn with_parent(mut self, parent: Marker) -> Self {
        self.parents.push(parent);
        self
    }

    /// Whether this marker is, or descends from, a marker called `name`.
    pub fn is_instance_of(&self, name: &str) -> bool {
        self.name == name || self.parents.iter().any(|p| p.is_instance_of(name))
    }
}

/// Error information attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowableInfo {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ThrowableInfo>>,
}

impl ThrowableInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: kind.into(), message: message.into(), cause: None }
    }
}

/// A log message in one of the shapes a logging call can produce.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Plain text.
    Simple { text: String },
    /// An arbitrary non-textual payload.
    Object { value: Value },
    /// A `{}` format with positional parameters.
    Parameterized { format: String, parameters: Vec<Value> },
}

impl Message {
    pub fn simple(text: impl Into<String>) -> Self {
        Message::Simple { text: text.into() }
    }

    /// Wraps a message argument: text stays a simple message, anything else
    /// becomes an object message.
    pub fn from_object(value: Value) -> Self {
        match value {
            Value::String(text) => Message::Simple { text },
            value => Message::Object { value },
        }
    }

    pub fn parameterized(format: impl Into<String>, parameters: Vec<Value>) -> Self {
        Message::Parameterized { format: format.into(), parameters }
    }

    pub fn formatted(&self) -> String {
        match self {
            Message::Simple { text } => text.clone(),
            Message::Object { value } => match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            Message::Parameterized { format, parameters } => {
                let mut args = parameters.iter().map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
                let pieces = format.split("{}").collect_vec();
                let mut out = String::with_capacity(format.len());
                for (i, piece) in pieces.iter().enumerate() {
                    out.push_str(piece);
                    if i + 1 < pieces.len() {
                        match args.next() {
                            Some(arg) => out.push_str(&arg),
                            None => out.push_str("{}"),
                        }
                    }
                }
                out
            }
        }
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            Message::Simple { text } => json!({ "type": "simple", "text": text }),
            Message::Object { value } => {
                json!({ "type": "object", "text": self.formatted(), "value": value })
            }
            Message::Parameterized { format, parameters } => json!({
                "type": "parameterized",
                "text": self.formatted(),
                "format": format,
                "parameters": parameters,
            }),
        };
        value.serialize(serializer)
    }
}

/// A fully formed event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub logger_name: String,
    pub level: Level,
    #[serde(default)]
    pub marker: Option<Marker>,
    pub message: Message,
    #[serde(default)]
    pub thrown: Option<ThrowableInfo>,
    #[serde(default)]
    pub thread_name: Option<String>,
    #[serde(default)]
    pub time_millis: u64,
}

impl LogEvent {
    pub fn new(logger_name: impl Into<String>, level: Level, message: Message) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            marker: None,
            message,
            thrown: None,
            thread_name: None,
            time_millis: 0,
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn with_thrown(mut self, thrown: ThrowableInfo) -> Self {
        self.thrown = Some(thrown);
        self
    }
}
