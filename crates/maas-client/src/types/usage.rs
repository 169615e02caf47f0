use maas_observability::UsageDetails;
use serde::Deserialize;

/// Token usage statistics
///
/// Counts the server did not report stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: Option<u64>,
    /// Tokens generated in the completion
    pub completion_tokens: Option<u64>,
    /// Total tokens
    pub total_tokens: Option<u64>,
}

pub type ChatUsage = Usage;
pub type CompletionUsage = Usage;

impl Usage {
    pub(crate) const fn details(&self) -> UsageDetails {
        UsageDetails {
            input: self.prompt_tokens,
            output: self.completion_tokens,
            total: self.total_tokens,
        }
    }
}
