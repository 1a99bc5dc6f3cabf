//! Hosting configuration seen by filters, and the JSON document it loads from.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::filter::FilterResult;
use crate::registry::{ScriptManager, ScriptRegistry};
use crate::script::{ScriptElement, ScriptFileElement};
use crate::substitutor::StrSubstitutor;

/// Properties, text substitution and the shared script registry.
///
/// Immutable once built; filters hold it behind an `Arc`.
pub struct Configuration {
    properties: HashMap<String, String>,
    substitutor: StrSubstitutor,
    registry: Arc<dyn ScriptRegistry>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&String, &String)> {
        self.properties.iter()
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn substitutor(&self) -> &StrSubstitutor {
        &self.substitutor
    }

    pub fn registry(&self) -> &Arc<dyn ScriptRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ConfigurationBuilder {
    properties: HashMap<String, String>,
    registry: Option<Arc<dyn ScriptRegistry>>,
}

impl ConfigurationBuilder {
    /// Adds a property; a later value for the same name wins.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn properties<I, K, V>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in props {
            self.properties.insert(k.into(), v.into());
        }
        self
    }

    pub fn registry(mut self, registry: Arc<dyn ScriptRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Configuration {
        let substitutor = StrSubstitutor::new(self.properties.clone());
        Configuration {
            properties: self.properties,
            substitutor,
            registry: self.registry.unwrap_or_else(|| Arc::new(ScriptManager::new())),
        }
    }
}

/// Top-level JSON configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub properties: Vec<PropertyElement>,
    #[serde(default)]
    pub scripts: Vec<ScriptDeclaration>,
    #[serde(default)]
    pub filters: Vec<FilterElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyElement {
    pub name: String,
    pub value: String,
}

/// A shared script declared once and referenced by name from filters.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptDeclaration {
    Inline(ScriptElement),
    File(ScriptFileElement),
}

/// One filter entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterElement {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub on_match: Option<FilterResult>,
    #[serde(default)]
    pub on_mismatch: Option<FilterResult>,
    #[serde(default)]
    pub script: Option<ScriptElement>,
    #[serde(default)]
    pub script_file: Option<ScriptFileElement>,
    #[serde(default)]
    pub script_ref: Option<String>,
}

impl ConfigDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builds the configuration these properties describe.
    pub fn configuration(&self, registry: Arc<dyn ScriptRegistry>) -> Configuration {
        Configuration::builder()
            .properties(self.properties.iter().map(|p| (p.name.clone(), p.value.clone())))
            .registry(registry)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn last_property_wins() {
        let doc = ConfigDocument::from_json(
            r#"{ "properties": [
                { "name": "env", "value": "dev" },
                { "name": "env", "value": "prod" }
            ] }"#,
        )
        .unwrap();
        let cfg = doc.configuration(Arc::new(ScriptManager::new()));
        assert_eq!(cfg.property("env"), Some("prod"));
        assert_eq!(cfg.substitutor().replace("${env}"), "prod");
    }

    #[test]
    fn filter_element_fields() {
        let doc = ConfigDocument::from_json(
            r#"{
                "scripts": [
                    { "name": "shared", "body": "true" },
                    { "path": "/etc/filters/a.expr" }
                ],
                "filters": [
                    { "type": "ScriptFilter", "onMatch": "accept", "scriptRef": "shared" }
                ]
            }"#,
        )
        .unwrap();
        assert!(matches!(doc.scripts[0], ScriptDeclaration::Inline(_)));
        assert!(matches!(doc.scripts[1], ScriptDeclaration::File(_)));
        let f = &doc.filters[0];
        assert_eq!(f.on_match, Some(FilterResult::Accept));
        assert_eq!(f.on_mismatch, None);
        assert_eq!(f.script_ref.as_deref(), Some("shared"));
    }
}
