//! The variable map supplied to a generation call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[cfg(test)]
#[path = "variables_tests.rs"]
mod tests;

/// Variables supplied by the caller, keyed by name.
///
/// Values are stored as JSON values so that configuration files and API
/// payloads can be passed through untouched; the engine rejects anything
/// that is not a string during validation. Iteration is in name order,
/// which keeps validation failures deterministic.
///
/// # Examples
///
/// ```rust
/// use prompt_engine::Variables;
/// use serde_json::json;
///
/// let mut variables = Variables::new();
/// variables.insert("name", "John");
/// assert_eq!(variables.get_str("name"), Some("John"));
///
/// let from_json: Variables = serde_json::from_value(json!({"count": 3})).unwrap();
/// assert!(from_json.get_str("count").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, Value>);

impl Variables {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a string value, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), Value::String(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The value of `name` when it is present and a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), Value::String(value.into())))
                .collect(),
        )
    }
}

/// Name of a JSON value's type, as used in error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
