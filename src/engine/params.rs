//! Merged, upper-cased view of one request's inputs.

use serde_json::{Map, Value};

/// Request parameters keyed by upper-cased name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSet {
    values: Map<String, Value>,
}

impl ParameterSet {
    /// Merge request sources. On a case-insensitive key collision headers win over body
    /// fields, and body fields win over path parameters.
    pub fn merge(
        path: &Map<String, Value>,
        body: Option<&Map<String, Value>>,
        headers: &Map<String, Value>,
    ) -> Self {
        let mut merged = ParameterSet::default();
        for (k, v) in path {
            merged.insert(k, v.clone());
        }
        if let Some(body) = body {
            for (k, v) in body {
                merged.insert(k, v.clone());
            }
        }
        for (k, v) in headers {
            merged.insert(k, v.clone());
        }
        merged
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_uppercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&name.to_uppercase())
    }

    /// Names from `required` that this set does not supply, in the order given.
    pub fn missing(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.get(name).is_none())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}
