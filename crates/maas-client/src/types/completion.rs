use serde::Deserialize;
use serde_with::{DefaultOnNull, serde_as};

use super::chat::ChatDelta;
use super::usage::Usage;

/// Text completion response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Text of the first choice
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.text.as_str())
    }
}

/// A single completion choice
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub index: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Streamed completion fragment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<CompletionChunkChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl CompletionChunk {
    /// Incremental text of the first choice
    ///
    /// Servers send either `text` or a chat-style `delta.content`.
    pub fn text(&self) -> Option<&str> {
        let choice = self.choices.first()?;

        choice
            .text
            .as_deref()
            .or_else(|| choice.delta.as_ref()?.content.as_deref())
    }
}

/// Choice within a streamed completion chunk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub delta: Option<ChatDelta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}
