//! Request inputs and response models of the MaaS API
//!
//! Response models are read-only snapshots of a server reply. Fields the
//! server may omit carry serde defaults so sparse replies still map.

mod audio;
mod chat;
mod completion;
mod embedding;
mod error;
mod model;
mod rerank;
mod usage;

pub use audio::{AudioFile, AudioSegment, AudioTranscriptionResponse, AudioTranslationResponse, AudioUsage};
pub use chat::{ChatChoice, ChatChunkChoice, ChatCompletionChunk, ChatCompletionResponse, ChatDelta, ChatMessage, Role};
pub use completion::{CompletionChoice, CompletionChunk, CompletionChunkChoice, CompletionResponse};
pub use embedding::{EmbeddingData, EmbeddingInput, EmbeddingResponse, EmbeddingUsage};
pub use error::ApiError;
pub use model::{ModelInfo, ModelsListResponse};
pub use rerank::{RerankDocument, RerankInput, RerankResponse};
pub use usage::{ChatUsage, CompletionUsage, Usage};
