//! Request Values
//!
//! Flat, ordered key/value request bodies produced by property encoders.

use crate::types::Properties;
use serde_json::Value;
use std::fmt;

/// HTTP verb understood by the request collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered request parameters
///
/// Keys are kept in insertion order; adding a key that already exists
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestValues {
    pairs: Vec<(String, String)>,
}

impl RequestValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string parameter
    pub fn add_string(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    /// Set an unsigned integer parameter
    pub fn add_uint(&mut self, key: &str, value: u64) {
        self.add_string(key, value.to_string());
    }

    /// Set a boolean parameter (sent as `0`/`1`)
    pub fn add_bool(&mut self, key: &str, value: bool) {
        self.add_string(key, if value { "1" } else { "0" });
    }

    /// Append every pair of `other`, replacing existing keys
    pub fn extend(&mut self, other: RequestValues) {
        for (key, value) in other.pairs {
            self.add_string(&key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// View the request as a property bag of string values, the shape the
    /// server echoes back for form-submitted parameters
    pub fn to_properties(&self) -> Properties {
        self.pairs
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = RequestValues::new();
        for (k, v) in iter {
            values.add_string(&k.into(), v);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let mut values = RequestValues::new();
        values.add_uint("cores", 2);
        values.add_string("name", "web");
        values.add_bool("template", true);

        let keys: Vec<&str> = values.keys().collect();
        assert_eq!(keys, vec!["cores", "name", "template"]);
        assert_eq!(values.get("template"), Some("1"));
    }

    #[test]
    fn test_duplicate_key_replaces_in_place() {
        let mut values = RequestValues::new();
        values.add_uint("memory", 512);
        values.add_uint("swap", 0);
        values.add_uint("memory", 1024);

        assert_eq!(values.len(), 2);
        assert_eq!(values.pairs()[0], ("memory".to_string(), "1024".to_string()));
    }

    #[test]
    fn test_to_properties_uses_string_values() {
        let values: RequestValues = [("comment", "lab")].into_iter().collect();
        let props = values.to_properties();
        assert_eq!(props.get("comment"), Some(&Value::String("lab".into())));
    }
}
