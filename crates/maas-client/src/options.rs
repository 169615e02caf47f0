//! Caller overrides and parameter validation

use serde_json::{Map, Value};

use crate::error::{MaasError, Result};

/// Optional keyword parameters merged into a request
///
/// Values win over every field the client fills in itself, the default
/// model included. `null` values are dropped.
///
/// ```
/// use maas_client::RequestOptions;
///
/// let options = RequestOptions::new().set("temperature", 0.2).set("max_tokens", 64);
/// assert_eq!(options.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    values: Map<String, Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reject blank string values; `null` counts as absent
    pub(crate) fn validate(&self) -> Result<()> {
        for (key, value) in &self.values {
            if let Value::String(text) = value
                && text.trim().is_empty()
            {
                return Err(MaasError::validation(key));
            }
        }

        Ok(())
    }

    /// Overlay onto a JSON payload
    pub(crate) fn merge_into(&self, payload: &mut Map<String, Value>) {
        for (key, value) in &self.values {
            if !value.is_null() {
                payload.insert(key.clone(), value.clone());
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RequestOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Multipart form value; strings are sent as-is, everything else as JSON
pub(crate) fn form_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Fail on a blank required string
pub(crate) fn required_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MaasError::validation(field));
    }

    Ok(())
}

/// Fail on an empty required collection
pub(crate) fn required_items<T>(field: &str, items: &[T]) -> Result<()> {
    if items.is_empty() {
        return Err(MaasError::validation(field));
    }

    Ok(())
}
