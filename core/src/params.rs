//! Request parameters with optional values.
//!
//! Endpoint methods accept many optional filters. Rather than branching on
//! each one, callers record every parameter with an `Option` value and the
//! absent ones are culled by `sanitized` right before encoding. The same
//! routine backs GET query strings and POST bodies.

use std::collections::BTreeMap;

use url::form_urlencoded;

/// Parameter name to optional value. Iteration order is by name, so encoded
/// output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, Option<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value. `None` records the key as
    /// absent; it will not be sent.
    pub fn insert<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) {
        self.entries
            .insert(key.into(), value.map(|v| v.to_string()));
    }

    /// Builder form of `insert`.
    pub fn with<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    /// Number of recorded keys, absent ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The pairs that will go over the wire: every key whose value is absent
    /// is dropped.
    pub fn sanitized(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
            .collect()
    }

    /// Form-URL-encode the sanitized pairs. Empty when nothing survives.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.sanitized() {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
