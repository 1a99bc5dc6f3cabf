//! Element-name to factory lookup used when loading a configuration document.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::{ConfigDocument, Configuration, FilterElement, ScriptDeclaration};
use crate::errors::{ConfigError, ConfigResult};
use crate::filter::{Filter, ScriptFilter};
use crate::registry::ScriptRegistry;
use crate::script::Script;

/// Factory function type for building a filter from its configuration element
pub type FilterFactory = fn(&FilterElement, &Arc<Configuration>) -> ConfigResult<Arc<dyn Filter>>;

/// Registry of filter factories keyed by element name (case-insensitive)
pub struct PluginRegistry {
    factories: HashMap<String, FilterFactory>,
}

/// Result of loading a configuration document.
pub struct LoadedConfiguration {
    pub configuration: Arc<Configuration>,
    pub filters: Vec<Arc<dyn Filter>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register("ScriptFilter", script_filter_factory);
        reg
    }

    pub fn register(&mut self, element: impl AsRef<str>, factory: FilterFactory) {
        let key = element.as_ref().to_ascii_lowercase();
        debug!(target: "config", "Registering filter factory: {}", key);
        self.factories.insert(key, factory);
    }

    pub fn create(&self, element: &FilterElement, configuration: &Arc<Configuration>) -> ConfigResult<Arc<dyn Filter>> {
        let factory = self
            .factories
            .get(&element.kind.to_ascii_lowercase())
            .ok_or_else(|| ConfigError::UnknownElement(element.kind.clone()))?;
        factory(element, configuration)
    }

    /// Parses a JSON document, registers its shared scripts, then builds every
    /// filter entry. Entries that fail are skipped; the rest still load.
    pub fn load(&self, json: &str, registry: Arc<dyn ScriptRegistry>) -> ConfigResult<LoadedConfiguration> {
        let doc = ConfigDocument::from_json(json)?;
        Ok(self.load_document(doc, registry))
    }

    pub fn load_document(&self, doc: ConfigDocument, registry: Arc<dyn ScriptRegistry>) -> LoadedConfiguration {
        let configuration = Arc::new(doc.configuration(registry));

        for decl in doc.scripts {
            let script = match decl {
                ScriptDeclaration::Inline(el) => Ok(el.into_script()),
                ScriptDeclaration::File(el) => el.into_script(),
            };
            let registered = script.and_then(|s| configuration.registry().add_script(&s));
            if let Err(e) = registered {
                error!(target: "config", "Unable to register script: {}", e);
            }
        }

        let mut filters = Vec::with_capacity(doc.filters.len());
        for element in &doc.filters {
            match self.create(element, &configuration) {
                Ok(f) => filters.push(f),
                Err(ConfigError::UnknownElement(kind)) => {
                    warn!(target: "config", "Unknown filter element {}, ignoring it", kind);
                }
                // already reported by the factory
                Err(e) => debug!(target: "config", "Skipping filter entry: {}", e),
            }
        }
        LoadedConfiguration { configuration, filters }
    }

    pub fn available_elements(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn script_filter_factory(element: &FilterElement, configuration: &Arc<Configuration>) -> ConfigResult<Arc<dyn Filter>> {
    let script = if let Some(el) = element.script.clone() {
        Some(el.into_script())
    } else if let Some(el) = element.script_file.clone() {
        let name = el.path.display().to_string();
        match el.into_script() {
            Ok(s) => Some(s),
            Err(source) => {
                let err = ConfigError::InvalidScript { name, source };
                error!(target: "config", "{}", err);
                return Err(err);
            }
        }
    } else {
        element.script_ref.clone().map(Script::reference)
    };
    let filter = ScriptFilter::create(script, element.on_match, element.on_mismatch, Arc::clone(configuration))?;
    Ok(Arc::new(filter))
}
