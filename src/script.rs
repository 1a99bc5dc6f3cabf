use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Result, ScriptError};

/// Language understood by the built-in registry.
pub const DEFAULT_LANGUAGE: &str = "expr";

/// Where a script's body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Body given directly in configuration.
    Inline { language: String, body: String },
    /// Body read from a file when the configuration was loaded.
    File { language: String, path: PathBuf, body: String },
    /// Names a script that must already be registered.
    Reference,
}

/// A named script. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    name: String,
    source: ScriptSource,
}

impl Script {
    pub fn inline(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::inline_with_language(name, DEFAULT_LANGUAGE, body)
    }

    pub fn inline_with_language(
        name: impl Into<String>,
        language: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: ScriptSource::Inline { language: language.into(), body: body.into() },
        }
    }

    /// Loads a script body from disk. Without an explicit name the file
    /// path is used.
    pub fn from_file(name: Option<String>, language: Option<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            name: name.unwrap_or_else(|| path.display().to_string()),
            source: ScriptSource::File {
                language: language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                path: path.to_path_buf(),
                body,
            },
        })
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self { name: name.into(), source: ScriptSource::Reference }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ScriptSource {
        &self.source
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.source, ScriptSource::Reference)
    }

    pub fn language(&self) -> Option<&str> {
        match &self.source {
            ScriptSource::Inline { language, .. } | ScriptSource::File { language, .. } => Some(language),
            ScriptSource::Reference => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match &self.source {
            ScriptSource::Inline { body, .. } | ScriptSource::File { body, .. } => Some(body),
            ScriptSource::Reference => None,
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Configuration form of an inline script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptElement {
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
    pub body: String,
}

/// Configuration form of a script file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFileElement {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    pub path: PathBuf,
}

impl ScriptElement {
    pub fn into_script(self) -> Script {
        let language = self.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        Script::inline_with_language(self.name, language, self.body)
    }
}

impl ScriptFileElement {
    pub fn into_script(self) -> Result<Script> {
        Script::from_file(self.name, self.language, &self.path)
    }
}
