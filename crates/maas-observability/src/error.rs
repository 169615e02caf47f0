/// Observability result type
pub type Result<T> = std::result::Result<T, ObservabilityError>;

/// Failures inside tracing code
///
/// These never cross into the MaaS client; the span guard and the
/// [`Observability`](crate::Observability) context log and drop them.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// Tracing was enabled with unusable settings
    #[error("invalid tracing configuration: {0}")]
    Config(String),

    /// The ingestion request could not be sent
    #[error("ingestion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The ingestion endpoint answered with an error status
    #[error("ingestion rejected with status {status}: {body}")]
    Ingestion {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A recorder could not accept an observation
    #[error("failed to record observation: {0}")]
    Record(String),

    /// A global log subscriber could not be installed
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}
