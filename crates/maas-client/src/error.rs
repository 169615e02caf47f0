use crate::types::ApiError;

/// Client-specific result type
pub type Result<T> = std::result::Result<T, MaasError>;

/// Errors from the MaaS client
#[derive(Debug, thiserror::Error)]
pub enum MaasError {
    /// Client could not be constructed
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Required or optional parameter failed validation before any I/O
    #[error("{field} must not be empty")]
    Validation {
        /// Offending parameter name
        field: String,
    },

    /// Server answered with status 400 or above
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Request could not be sent or its body not read
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A streamed frame was not valid JSON
    #[error("failed to decode stream frame: {0}")]
    StreamDecode(String),

    /// A successful response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl MaasError {
    pub(crate) fn validation(field: impl Into<String>) -> Self {
        Self::Validation { field: field.into() }
    }

    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// HTTP status of an API error
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status_code),
            _ => None,
        }
    }
}
