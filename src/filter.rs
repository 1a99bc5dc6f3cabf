//! Script-backed log event filtering.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::bindings::{EventShape, ScriptBindingBuilder};
use crate::config::Configuration;
use crate::errors::{ConfigError, ConfigResult};
use crate::event::{Level, LogEvent, Marker, Message, ThrowableInfo};
use crate::script::Script;

/// What a filter tells the logging pipeline to do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum FilterResult {
    /// Log the event without consulting further filters.
    Accept,
    /// No opinion; later filters decide.
    Neutral,
    /// Drop the event.
    Deny,
}

impl FilterResult {
    pub const DEFAULT_ON_MATCH: FilterResult = FilterResult::Neutral;
    pub const DEFAULT_ON_MISMATCH: FilterResult = FilterResult::Deny;
}

impl FromStr for FilterResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACCEPT" => Ok(FilterResult::Accept),
            "NEUTRAL" => Ok(FilterResult::Neutral),
            "DENY" => Ok(FilterResult::Deny),
            other => Err(format!("unknown filter result `{other}`")),
        }
    }
}

impl TryFrom<String> for FilterResult {
    type Error = String;

    fn try_from(s: String) -> Result<Self, String> {
        s.parse()
    }
}

impl fmt::Display for FilterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterResult::Accept => "ACCEPT",
            FilterResult::Neutral => "NEUTRAL",
            FilterResult::Deny => "DENY",
        })
    }
}

/// Filters decide per event. They must never panic or fail on the logging
/// path, hence the infallible return.
pub trait Filter: Send + Sync + fmt::Display {
    fn filter(&self, shape: &EventShape<'_>) -> FilterResult;

    fn filter_parameters(
        &self,
        logger: &str,
        level: Level,
        marker: Option<&Marker>,
        message: &str,
        parameters: &[Value],
    ) -> FilterResult {
        self.filter(&EventShape::Parameters { logger, level, marker, message, parameters })
    }

    fn filter_object(
        &self,
        logger: &str,
        level: Level,
        marker: Option<&Marker>,
        message: &Value,
        thrown: Option<&ThrowableInfo>,
    ) -> FilterResult {
        self.filter(&EventShape::Object { logger, level, marker, message, thrown })
    }

    fn filter_message(
        &self,
        logger: &str,
        level: Level,
        marker: Option<&Marker>,
        message: &Message,
        thrown: Option<&ThrowableInfo>,
    ) -> FilterResult {
        self.filter(&EventShape::Message { logger, level, marker, message, thrown })
    }

    fn filter_event(&self, event: &LogEvent) -> FilterResult {
        self.filter(&EventShape::Event(event))
    }
}

/// Returns `on_match` when its script yields exactly `true` and
/// `on_mismatch` for anything else, including script failures.
pub struct ScriptFilter {
    script: Script,
    configuration: Arc<Configuration>,
    on_match: FilterResult,
    on_mismatch: FilterResult,
}

impl ScriptFilter {
    /// Validates the script source and, for inline and file scripts,
    /// registers the script with the configuration's registry.
    ///
    /// Failures are reported once on the `config` target and leave no filter.
    pub fn create(
        script: Option<Script>,
        on_match: Option<FilterResult>,
        on_mismatch: Option<FilterResult>,
        configuration: Arc<Configuration>,
    ) -> ConfigResult<Self> {
        Self::try_create(script, on_match, on_mismatch, configuration).inspect_err(|e| {
            error!(target: "config", "{}", e);
        })
    }

    fn try_create(
        script: Option<Script>,
        on_match: Option<FilterResult>,
        on_mismatch: Option<FilterResult>,
        configuration: Arc<Configuration>,
    ) -> ConfigResult<Self> {
        let script = script.ok_or(ConfigError::MissingScript)?;
        let registry = configuration.registry();
        if script.is_reference() {
            if registry.get_script(script.name()).is_none() {
                return Err(ConfigError::UnknownScriptRef(script.name().to_string()));
            }
        } else {
            registry.add_script(&script).map_err(|source| ConfigError::InvalidScript {
                name: script.name().to_string(),
                source,
            })?;
        }
        Ok(Self {
            script,
            configuration,
            on_match: on_match.unwrap_or(FilterResult::DEFAULT_ON_MATCH),
            on_mismatch: on_mismatch.unwrap_or(FilterResult::DEFAULT_ON_MISMATCH),
        })
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn on_match(&self) -> FilterResult {
        self.on_match
    }

    pub fn on_mismatch(&self) -> FilterResult {
        self.on_mismatch
    }
}

impl Filter for ScriptFilter {
    fn filter(&self, shape: &EventShape<'_>) -> FilterResult {
        let bindings = ScriptBindingBuilder::new(&self.configuration).build(shape);
        match self.configuration.registry().execute(self.script.name(), bindings) {
            Ok(Value::Bool(true)) => self.on_match,
            _ => self.on_mismatch,
        }
    }
}

impl fmt::Display for ScriptFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script.name())
    }
}

impl fmt::Debug for ScriptFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFilter")
            .field("script", &self.script.name())
            .field("on_match", &self.on_match)
            .field("on_mismatch", &self.on_mismatch)
            .finish()
    }
}
