use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// Replaces `${name}` and `${name:-default}` references with configured
/// property values. Unknown names without a default are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StrSubstitutor {
    variables: HashMap<String, String>,
}

impl StrSubstitutor {
    pub fn new(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// Rebuilds a substitutor from its bound form, as scripts receive it.
    pub fn from_value(value: &Value) -> Option<Self> {
        let vars = value.get("variables")?.as_object()?;
        let variables = vars
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect();
        Some(Self { variables })
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn replace(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let key = &after[..end];
            let (name, default) = match key.split_once(":-") {
                Some((n, d)) => (n, Some(d)),
                None => (key, None),
            };
            match self.lookup(name).or(default) {
                Some(v) => out.push_str(v),
                None => out.push_str(&rest[start..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn subst() -> StrSubstitutor {
        StrSubstitutor::new(HashMap::from([
            ("env".to_string(), "prod".to_string()),
            ("app".to_string(), "billing".to_string()),
        ]))
    }

    #[test]
    fn replaces_known_names() {
        assert_eq!(subst().replace("${app}-${env}.log"), "billing-prod.log");
    }

    #[test]
    fn defaults_and_unknowns() {
        assert_eq!(subst().replace("${region:-eu}/${missing}"), "eu/${missing}");
    }

    #[test]
    fn unterminated_reference_is_kept() {
        assert_eq!(subst().replace("x ${env"), "x ${env");
    }
}
