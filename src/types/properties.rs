//! Property bags
//!
//! The canonical in-memory form of a wire record before validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unordered mapping from property name to a loosely-typed value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    inner: Map<String, Value>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property; JSON `null` counts as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key).filter(|v| !v.is_null())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.inner.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Split off every key in `claimed`, returning the remainder unchanged
    pub fn without(mut self, claimed: &[&str]) -> Properties {
        for key in claimed {
            self.inner.remove(*key);
        }
        self
    }

    /// Decode a JSON payload that must be an object
    pub fn from_value(value: Value) -> Option<Properties> {
        match value {
            Value::Object(inner) => Some(Self { inner }),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.inner)
    }
}

impl From<Map<String, Value>> for Properties {
    fn from(inner: Map<String, Value>) -> Self {
        Self { inner }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Properties {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
