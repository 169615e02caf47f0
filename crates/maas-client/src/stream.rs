use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::stream::{FusedStream, Stream, StreamExt};
use maas_observability::{GenerationEnd, Span};
use serde::de::DeserializeOwned;

use crate::error::{MaasError, Result};
use crate::sse::FrameStream;
use crate::types::{ChatCompletionChunk, CompletionChunk, Usage};

/// Chunk type of a streamed operation
pub trait StreamedChunk: DeserializeOwned {
    /// Incremental text carried by this chunk
    fn delta_text(&self) -> Option<&str>;

    /// Usage reported by this chunk, if any
    fn usage(&self) -> Option<Usage>;
}

impl StreamedChunk for ChatCompletionChunk {
    fn delta_text(&self) -> Option<&str> {
        self.content()
    }

    fn usage(&self) -> Option<Usage> {
        self.usage
    }
}

impl StreamedChunk for CompletionChunk {
    fn delta_text(&self) -> Option<&str> {
        self.text()
    }

    fn usage(&self) -> Option<Usage> {
        self.usage
    }
}

/// Streamed chat completion
pub type ChatCompletionStream = ChunkStream<ChatCompletionChunk>;

/// Streamed text completion
pub type CompletionStream = ChunkStream<CompletionChunk>;

/// Lazily decoded chunks of a streamed response
///
/// Owns the operation's span with its open generation. Reaching the end of
/// the stream closes the generation with the concatenated text and ends the
/// span. An error ends the span as failed and terminates the stream.
/// Dropping the stream early closes the generation with the text received
/// so far and ends the span with a warning.
pub struct ChunkStream<T> {
    /// `None` once the stream terminated
    frames: Option<FrameStream>,
    span: Span,
    collected: String,
    usage: Option<Usage>,
    _chunk: PhantomData<fn() -> T>,
}

impl<T: StreamedChunk> ChunkStream<T> {
    pub(crate) fn new(frames: FrameStream, span: Span) -> Self {
        Self {
            frames: Some(frames),
            span,
            collected: String::new(),
            usage: None,
            _chunk: PhantomData,
        }
    }

    /// Text received so far
    pub fn collected_text(&self) -> &str {
        &self.collected
    }

    /// Latest usage reported by the server
    pub const fn usage(&self) -> Option<Usage> {
        self.usage
    }

    /// Drain the stream and return the full text
    ///
    /// # Errors
    ///
    /// Returns the first error raised while streaming
    pub async fn into_text(mut self) -> Result<String> {
        while let Some(chunk) = self.next().await {
            chunk?;
        }

        Ok(std::mem::take(&mut self.collected))
    }

    fn accept(&mut self, chunk: &T) {
        if let Some(text) = chunk.delta_text() {
            self.collected.push_str(text);
        }
        if let Some(usage) = chunk.usage() {
            self.usage = Some(usage);
        }
    }

    fn close_generation(&mut self) {
        let usage = self.usage.as_ref().map(Usage::details);
        self.span
            .end_generation(GenerationEnd::new(self.collected.clone(), usage));
    }

    fn complete(&mut self) {
        self.frames = None;
        self.close_generation();
        self.span.end();
    }

    fn fail(&mut self, error: &MaasError) {
        tracing::error!(span = %self.span.name(), "stream failed: {error}");

        self.frames = None;
        self.span.set_error(error.to_string());
        self.close_generation();
        self.span.end();
    }
}

impl<T: StreamedChunk> Stream for ChunkStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(frames) = this.frames.as_mut() else {
            return Poll::Ready(None);
        };

        let item = match ready!(frames.poll_next_unpin(cx)) {
            Some(Ok(frame)) => match serde_json::from_value::<T>(frame) {
                Ok(chunk) => {
                    this.accept(&chunk);
                    Ok(chunk)
                }
                Err(e) => Err(MaasError::StreamDecode(e.to_string())),
            },
            Some(Err(e)) => Err(e),
            None => {
                this.complete();
                return Poll::Ready(None);
            }
        };

        if let Err(e) = &item {
            this.fail(e);
        }

        Poll::Ready(Some(item))
    }
}

impl<T: StreamedChunk> FusedStream for ChunkStream<T> {
    fn is_terminated(&self) -> bool {
        self.frames.is_none()
    }
}

impl<T> Drop for ChunkStream<T> {
    fn drop(&mut self) {
        if self.frames.take().is_none() {
            return;
        }

        self.span.set_warning("stream dropped before completion");
        let usage = self.usage.as_ref().map(Usage::details);
        self.span
            .end_generation(GenerationEnd::new(std::mem::take(&mut self.collected), usage));
        self.span.end();
    }
}

impl<T> fmt::Debug for ChunkStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkStream")
            .field("span", &self.span)
            .field("terminated", &self.frames.is_none())
            .field("collected", &self.collected.len())
            .finish_non_exhaustive()
    }
}
