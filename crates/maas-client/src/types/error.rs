/// Failure reply from the API, body kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("API error {status_code}: {error}")]
pub struct ApiError {
    /// HTTP status code
    pub status_code: u16,
    /// Raw response body
    pub error: String,
}

impl ApiError {
    pub fn new(status_code: u16, error: impl Into<String>) -> Self {
        Self {
            status_code,
            error: error.into(),
        }
    }

    /// Message from an OpenAI-style `{"error": {"message": ...}}` body
    pub fn message(&self) -> Option<String> {
        let body: serde_json::Value = serde_json::from_str(&self.error).ok()?;
        let error = body.get("error")?;

        error
            .get("message")
            .and_then(serde_json::Value::as_str)
            .or_else(|| error.as_str())
            .map(ToOwned::to_owned)
    }
}
