//! Per-request annotation surface written by access predicates.

use std::collections::HashMap;

use serde_json::Value;

/// Well-known annotation keys.
pub mod keys {
    /// Authorized user or service name.
    pub const UID: &str = "uid";
    /// Official team of the authorized user.
    pub const TEAM: &str = "team";
    /// Real name of the authorized user.
    pub const CN: &str = "cn";
}

/// Mutable key/value annotations for one request.
///
/// Predicates write into it during a chain evaluation; once the decision is
/// `Allowed` it is handed to downstream handlers. The gate itself never reads
/// it after the decision has been made.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    values: HashMap<String, Value>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an annotation.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_owned(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Annotation value if it is a JSON string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
