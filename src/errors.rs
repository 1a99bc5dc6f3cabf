use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

// Errors raised while compiling or running a script
#[derive(Debug, Error)]
pub enum ScriptError {
    // The script body could not be parsed
    #[error("parse error in script `{script}`: {message}")]
    Parse { script: String, message: String },

    // The script parsed but failed while executing against a binding
    #[error("runtime error: {0}")]
    Runtime(String),

    // Execution was requested for a name the registry does not know
    #[error("no script named `{0}` is registered")]
    UnknownScript(String),

    // The registry cannot run scripts written in this language
    #[error("script `{script}` uses unsupported language `{language}`")]
    UnsupportedLanguage { script: String, language: String },

    // A script file could not be read
    #[error("cannot read script file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// Errors raised while building a filter from configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    // Neither an inline script, a script file nor a reference was supplied
    #[error("a Script, ScriptFile or ScriptRef element must be provided for this ScriptFilter")]
    MissingScript,

    // A reference points at a script nobody declared
    #[error("no script with name {0} has been declared")]
    UnknownScriptRef(String),

    // An inline or file script was rejected by the registry
    #[error("script `{name}` could not be registered: {source}")]
    InvalidScript {
        name: String,
        #[source]
        source: ScriptError,
    },

    // The configuration names an element no factory is registered for
    #[error("no plugin factory registered for element `{0}`")]
    UnknownElement(String),

    // The configuration document itself is malformed
    #[error("invalid configuration document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

// Errors raised by producer/disposer bindings and the scope that tears them down
#[derive(Debug, Error)]
pub enum BindingError {
    // A binding was built without the member that produces the resource
    #[error("a producer member is required")]
    MissingProducer,

    // The producer itself failed
    #[error("producer `{member}` failed: {message}")]
    Producer { member: String, message: String },

    // A disposer dependency could not be resolved
    #[error("cannot resolve injection point `{0}`")]
    Resolution(String),

    // The disposer ran and failed
    #[error("disposer `{method}` failed: {message}")]
    Disposer { method: String, message: String },
}

// Type aliases for results of each error family
pub type Result<T> = std::result::Result<T, ScriptError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type BindingResult<T> = std::result::Result<T, BindingError>;
