use serde::Deserialize;
use serde_json::Value;

/// Model advertised by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub owned_by: String,
    /// Provider-specific capability description
    #[serde(default)]
    pub capabilities: Option<Value>,
}

/// Response of the model listing endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsListResponse {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub data: Vec<ModelInfo>,
}

impl ModelsListResponse {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|m| m.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn listing_maps() {
        let list: ModelsListResponse = serde_json::from_value(json!({
            "object": "list",
            "data": [
                {"id": "llama-3.1-8b", "object": "model", "created": 1_700_000_000, "owned_by": "meta"},
                {"id": "bge-m3", "capabilities": {"embeddings": true}}
            ]
        }))
        .unwrap();

        assert_eq!(list.ids().collect::<Vec<_>>(), ["llama-3.1-8b", "bge-m3"]);
        assert_eq!(list.data[0].owned_by, "meta");
        assert_eq!(list.data[1].capabilities, Some(json!({"embeddings": true})));
    }
}
