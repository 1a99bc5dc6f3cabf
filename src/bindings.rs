//! Variable bindings handed to a script for one evaluation.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::Configuration;
use crate::event::{Level, LogEvent, Marker, Message, ThrowableInfo};

/// Name-to-value mapping exposed to a script. Built fresh for every
/// evaluation and moved into the registry, so it is never shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptBindings {
    vars: Map<String, Value>,
}

impl ScriptBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Names owned by the binding builder. Properties never appear under them,
/// whichever shape is being evaluated.
pub const RESERVED_NAMES: [&str; 8] = [
    "logger",
    "level",
    "marker",
    "message",
    "parameters",
    "throwable",
    "logEvent",
    "substitutor",
];

/// The four input shapes a filter can be asked about.
#[derive(Debug, Clone, Copy)]
pub enum EventShape<'a> {
    /// A raw format string with positional parameters.
    Parameters {
        logger: &'a str,
        level: Level,
        marker: Option<&'a Marker>,
        message: &'a str,
        parameters: &'a [Value],
    },
    /// An arbitrary message argument, text or not.
    Object {
        logger: &'a str,
        level: Level,
        marker: Option<&'a Marker>,
        message: &'a Value,
        thrown: Option<&'a ThrowableInfo>,
    },
    /// A message that is already built.
    Message {
        logger: &'a str,
        level: Level,
        marker: Option<&'a Marker>,
        message: &'a Message,
        thrown: Option<&'a ThrowableInfo>,
    },
    /// A complete event record.
    Event(&'a LogEvent),
}

/// Builds the binding for one evaluation out of an [`EventShape`] and the
/// hosting configuration's properties and substitutor.
pub struct ScriptBindingBuilder<'a> {
    configuration: &'a Configuration,
}

impl<'a> ScriptBindingBuilder<'a> {
    pub fn new(configuration: &'a Configuration) -> Self {
        Self { configuration }
    }

    pub fn build(&self, shape: &EventShape<'_>) -> ScriptBindings {
        let mut b = ScriptBindings::new();
        match *shape {
            EventShape::Parameters { logger, level, marker, message, parameters } => {
                Self::put_call_site(&mut b, logger, level, marker);
                b.put("message", to_binding(&Message::simple(message)));
                b.put("parameters", Value::Array(parameters.to_vec()));
                b.put("throwable", Value::Null);
            }
            EventShape::Object { logger, level, marker, message, thrown } => {
                Self::put_call_site(&mut b, logger, level, marker);
                b.put("message", to_binding(&Message::from_object(message.clone())));
                b.put("parameters", Value::Null);
                b.put("throwable", to_binding(&thrown));
            }
            EventShape::Message { logger, level, marker, message, thrown } => {
                Self::put_call_site(&mut b, logger, level, marker);
                b.put("message", to_binding(message));
                b.put("parameters", Value::Null);
                b.put("throwable", to_binding(&thrown));
            }
            EventShape::Event(event) => {
                b.put("logEvent", to_binding(event));
            }
        }
        for (name, value) in self.configuration.properties() {
            if !RESERVED_NAMES.contains(&name.as_str()) {
                b.put(name.clone(), Value::String(value.clone()));
            }
        }
        b.put("substitutor", to_binding(self.configuration.substitutor()));
        b
    }

    fn put_call_site(b: &mut ScriptBindings, logger: &str, level: Level, marker: Option<&Marker>) {
        b.put("logger", json!({ "name": logger }));
        b.put("level", to_binding(&level));
        b.put("marker", to_binding(&marker));
    }
}

fn to_binding<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
