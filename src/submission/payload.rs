//! Submission payloads
//!
//! A payload maps field ids to raw values exactly as delivered by the form
//! surface. Normalization happens inside the validator, never here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sanitize::unslash;

/// Raw end-user submission, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionPayload {
    entries: IndexMap<String, Value>,
}

impl SubmissionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from a decoded JSON body.
    ///
    /// Only object members carry string keys; any other shape (a list
    /// indexed by position, a bare scalar) contributes no entries.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self {
                entries: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            },
            _ => Self::default(),
        }
    }

    /// Builds a payload from key/value pairs; later duplicates overwrite.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Adds or replaces an entry, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Drops entries with empty keys and unslashes string values.
    pub(crate) fn normalized(&self) -> IndexMap<String, Value> {
        self.entries
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => Value::String(unslash(s)),
                    other => other.clone(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object_keeps_order() {
        let payload = SubmissionPayload::from_json(&json!({"b": "1", "a": "2"}));
        let keys: Vec<&String> = payload.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_from_json_list_has_no_string_keys() {
        let payload = SubmissionPayload::from_json(&json!(["Alice", "x@y.io"]));
        assert!(payload.is_empty());
    }

    #[test]
    fn test_normalized_drops_empty_keys_and_unslashes() {
        let payload = SubmissionPayload::new()
            .with("", "orphan")
            .with("name", r"O\'Brien")
            .with("count", 3);

        let normalized = payload.normalized();
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized["name"], "O'Brien");
        assert_eq!(normalized["count"], 3);
    }
}
