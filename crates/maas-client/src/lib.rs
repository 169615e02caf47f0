#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Typed async client for the MaaS inference API
//!
//! Covers chat, text completion, embeddings, rerank, model listing and the
//! audio endpoints. Chat and completion can stream. Every call is traced
//! through [`Observability`]; tracing failures never surface here.

mod client;
pub mod error;
mod options;
pub mod sse;
mod stream;
pub mod types;

pub use client::{MaasClient, MaasClientBuilder};
pub use error::{MaasError, Result};
pub use options::RequestOptions;
pub use stream::{ChatCompletionStream, ChunkStream, CompletionStream, StreamedChunk};
pub use types::*;

pub use maas_config::{ClientConfig, ResolvedClientConfig};
pub use maas_observability::{Identity, Observability};
