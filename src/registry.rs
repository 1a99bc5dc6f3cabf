//! Named script storage and execution.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use crate::bindings::ScriptBindings;
use crate::errors::{Result, ScriptError};
use crate::expression::{self, Expr};
use crate::functions::Registry;
use crate::script::{Script, DEFAULT_LANGUAGE};

/// Stores named scripts and runs them against a binding.
///
/// Implementations must allow concurrent `execute` and `get_script` calls
/// once scripts are registered.
pub trait ScriptRegistry: Send + Sync {
    /// Registers an inline or file script under its name, replacing any
    /// previous script of the same name.
    fn add_script(&self, script: &Script) -> Result<()>;

    fn get_script(&self, name: &str) -> Option<Arc<Script>>;

    /// Runs the named script. The binding is consumed by the call.
    fn execute(&self, name: &str, bindings: ScriptBindings) -> Result<Value>;
}

struct CompiledScript {
    script: Arc<Script>,
    expr: Expr,
}

/// Default registry running the built-in `expr` language.
pub struct ScriptManager {
    scripts: RwLock<HashMap<String, Arc<CompiledScript>>>,
    functions: Registry,
}

impl ScriptManager {
    pub fn new() -> Self {
        Self::with_functions(Registry::with_builtins())
    }

    pub fn with_functions(functions: Registry) -> Self {
        Self { scripts: RwLock::new(HashMap::new()), functions }
    }

    /// Names of all registered scripts, sorted.
    pub fn script_names(&self) -> Vec<String> {
        let scripts = self.scripts.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = scripts.keys().cloned().collect();
        names.sort();
        names
    }

    fn compiled(&self, name: &str) -> Option<Arc<CompiledScript>> {
        let scripts = self.scripts.read().unwrap_or_else(|e| e.into_inner());
        scripts.get(name).cloned()
    }
}

impl Default for ScriptManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRegistry for ScriptManager {
    fn add_script(&self, script: &Script) -> Result<()> {
        let (language, body) = match (script.language(), script.body()) {
            (Some(l), Some(b)) => (l, b),
            _ => return Err(ScriptError::UnknownScript(script.name().to_string())),
        };
        if !language.eq_ignore_ascii_case(DEFAULT_LANGUAGE) {
            return Err(ScriptError::UnsupportedLanguage {
                script: script.name().to_string(),
                language: language.to_string(),
            });
        }
        let expr = expression::compile(script.name(), body, &self.functions)?;
        debug!(target: "script", "Registering script: {}", script.name());
        let compiled = Arc::new(CompiledScript { script: Arc::new(script.clone()), expr });
        let mut scripts = self.scripts.write().unwrap_or_else(|e| e.into_inner());
        if scripts.insert(script.name().to_string(), compiled).is_some() {
            warn!(target: "script", "Script {} replaced an earlier definition", script.name());
        }
        Ok(())
    }

    fn get_script(&self, name: &str) -> Option<Arc<Script>> {
        self.compiled(name).map(|c| Arc::clone(&c.script))
    }

    fn execute(&self, name: &str, bindings: ScriptBindings) -> Result<Value> {
        let compiled = self.compiled(name).ok_or_else(|| {
            warn!(target: "script", "No script named {} could be found", name);
            ScriptError::UnknownScript(name.to_string())
        })?;
        expression::eval(&compiled.expr, &bindings, &self.functions).inspect_err(|e| {
            warn!(target: "script", "Error running script {}: {}", name, e);
        })
    }
}
