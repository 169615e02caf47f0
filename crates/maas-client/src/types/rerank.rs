use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::usage::Usage;

/// Document to rerank: plain text or a structured object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RerankInput {
    Text(String),
    Structured(Map<String, Value>),
}

impl From<&str> for RerankInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RerankInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Map<String, Value>> for RerankInput {
    fn from(map: Map<String, Value>) -> Self {
        Self::Structured(map)
    }
}

/// Rerank response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RerankResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    /// Documents ordered by relevance
    #[serde(default)]
    pub results: Vec<RerankDocument>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One scored document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RerankDocument {
    /// Position in the request's document list
    pub index: usize,
    pub relevance_score: f64,
    /// Echo of the document, when the server returns it
    #[serde(default)]
    pub document: Option<Value>,
}

impl RerankDocument {
    /// Text of the echoed document, either a bare string or `{"text": ...}`
    pub fn text(&self) -> Option<&str> {
        match self.document.as_ref()? {
            Value::String(text) => Some(text),
            Value::Object(map) => map.get("text")?.as_str(),
            _ => None,
        }
    }
}
