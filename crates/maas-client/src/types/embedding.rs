use maas_observability::UsageDetails;
use serde::{Deserialize, Serialize};

/// Embedding input: single string or batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Batch(Vec<String>),
}

impl EmbeddingInput {
    /// Whether a single input is blank or a batch is empty
    ///
    /// Batch entries are sent as given.
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            Self::Single(text) => text.trim().is_empty(),
            Self::Batch(items) => items.is_empty(),
        }
    }
}

impl From<&str> for EmbeddingInput {
    fn from(text: &str) -> Self {
        Self::Single(text.to_owned())
    }
}

impl From<String> for EmbeddingInput {
    fn from(text: String) -> Self {
        Self::Single(text)
    }
}

impl From<Vec<String>> for EmbeddingInput {
    fn from(items: Vec<String>) -> Self {
        Self::Batch(items)
    }
}

impl From<Vec<&str>> for EmbeddingInput {
    fn from(items: Vec<&str>) -> Self {
        Self::Batch(items.into_iter().map(ToOwned::to_owned).collect())
    }
}

impl From<&[&str]> for EmbeddingInput {
    fn from(items: &[&str]) -> Self {
        Self::Batch(items.iter().map(|t| (*t).to_owned()).collect())
    }
}

/// Embedding response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default)]
    pub object: String,
    /// One entry per input item
    #[serde(default)]
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub usage: Option<EmbeddingUsage>,
}

/// Single embedding entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingData {
    #[serde(default)]
    pub object: String,
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Index in the input batch
    #[serde(default)]
    pub index: usize,
}

/// Token usage for embeddings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl EmbeddingUsage {
    pub(crate) const fn details(&self) -> UsageDetails {
        UsageDetails {
            input: self.prompt_tokens,
            output: None,
            total: self.total_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn input_serializes_untagged() {
        assert_eq!(serde_json::to_value(EmbeddingInput::from("hi")).unwrap(), json!("hi"));
        assert_eq!(
            serde_json::to_value(EmbeddingInput::from(vec!["a", "b"])).unwrap(),
            json!(["a", "b"])
        );
    }

    #[test]
    fn blank_inputs() {
        assert!(EmbeddingInput::from("  ").is_blank());
        assert!(EmbeddingInput::Batch(Vec::new()).is_blank());
        assert!(!EmbeddingInput::from(vec!["ok", ""]).is_blank());
        assert!(!EmbeddingInput::from(vec!["ok"]).is_blank());
    }

    #[test]
    fn response_maps() {
        let response: EmbeddingResponse = serde_json::from_value(json!({
            "object": "list",
            "data": [
                {"object": "embedding", "embedding": [0.1, 0.2], "index": 0},
                {"object": "embedding", "embedding": [0.3, 0.4], "index": 1}
            ],
            "model": "bge-m3",
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        }))
        .unwrap();

        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[1].index, 1);
        assert!((response.data[1].embedding[0] - 0.3).abs() < f32::EPSILON);
        assert_eq!(response.usage.unwrap().total_tokens, Some(4));
    }
}
