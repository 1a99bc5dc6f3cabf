pub mod bindings;
pub mod config;
pub mod errors;
pub mod event;
pub mod filter;
pub mod functions; // pluggable script functions
pub mod lifecycle;
pub mod logging;
pub mod plugins;
pub mod producer;
pub mod registry;
pub mod script;
pub mod substitutor;
mod comparison;
mod expression;
mod parser;

pub use bindings::{EventShape, ScriptBindingBuilder, ScriptBindings};
pub use config::{ConfigDocument, Configuration};
pub use errors::{BindingError, ConfigError, ScriptError};
pub use event::{Level, LogEvent, Marker, Message, ThrowableInfo};
pub use filter::{Filter, FilterResult, ScriptFilter};
pub use plugins::PluginRegistry;
pub use producer::{InjectionPoint, Member, ProducerDisposerBinding};
pub use registry::{ScriptManager, ScriptRegistry};
pub use script::Script;
