//! Property bags and host-version tolerant attribute probing

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque key-value property bag as handed out by the host.
///
/// Keys are namespaced strings (`user.property/status`, `block/tags`, ...);
/// values keep whatever shape the host used. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(Map<String, Value>);

impl PropertyBag {
    /// Creates an empty bag
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Gets a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns true if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over all key-value pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for PropertyBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Looks a key up, also accepting the EDN-style spelling with a leading `:`.
fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key)
        .or_else(|| map.get(&format!(":{}", key)))
        .filter(|v| !v.is_null())
}

/// Returns the first non-null value among `paths`.
///
/// A path starting with `properties` is looked up in the property bag, every
/// other path in the free-form attribute map. Nested segments descend into
/// objects.
pub(crate) fn probe<'a>(
    attrs: &'a Map<String, Value>,
    properties: &'a PropertyBag,
    paths: &[&[&str]],
) -> Option<&'a Value> {
    paths.iter().find_map(|path| {
        let (first, rest) = path.split_first()?;
        if *first == "properties" {
            let (key, rest) = rest.split_first()?;
            descend(lookup(&properties.0, key)?, rest)
        } else {
            descend(lookup(attrs, first)?, rest)
        }
    })
}

fn descend<'a>(mut value: &'a Value, rest: &[&str]) -> Option<&'a Value> {
    for segment in rest {
        value = lookup(value.as_object()?, segment)?;
    }
    Some(value)
}

/// Normalises a keyword-ish value: `":quote"` and `"quote"` both become `quote`.
pub(crate) fn keyword(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map
            .get("ident")
            .or_else(|| map.get("db/ident"))
            .and_then(Value::as_str)?,
        _ => return None,
    };
    let s = s.trim().trim_start_matches(':');
    let s = s.rsplit('/').next().unwrap_or(s);
    if s.is_empty() {
        None
    } else {
        Some(s.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn probe_returns_first_present() {
        let a = attrs(json!({"heading": 3, "other": null}));
        let mut props = PropertyBag::new();
        props.set("heading", 2);

        let found = probe(&a, &props, &[&["properties", "heading"], &["heading"]]);
        assert_eq!(found, Some(&json!(2)));

        let found = probe(&a, &props, &[&["other"], &["heading"]]);
        assert_eq!(found, Some(&json!(3)));
    }

    #[test]
    fn probe_accepts_colon_keys_and_nesting() {
        let a = attrs(json!({":block/properties": {"display": "code"}}));
        let props = PropertyBag::new();

        let found = probe(&a, &props, &[&["block/properties", "display"]]);
        assert_eq!(found, Some(&json!("code")));
    }

    #[test]
    fn keyword_normalisation() {
        assert_eq!(keyword(&json!(":quote")), Some("quote".to_string()));
        assert_eq!(keyword(&json!("Code")), Some("code".to_string()));
        assert_eq!(keyword(&json!({"db/ident": ":quote"})), Some("quote".to_string()));
        assert_eq!(keyword(&json!(3)), None);
    }
}
