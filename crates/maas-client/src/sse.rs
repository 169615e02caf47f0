//! Server-sent-events frame decoder
//!
//! Only `data: ` lines matter. Each carries one complete JSON document; the
//! `[DONE]` sentinel ends the stream. Comments, keep-alives, `event:`/`id:`
//! fields and blank lines are skipped.

use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;

use crate::error::{MaasError, Result};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Lazily decoded frames of a streamed response
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Value>> + Send>>;

/// Turn a chunked response body into a stream of JSON frames
///
/// Lines may be split across network chunks. A malformed frame yields one
/// [`MaasError::StreamDecode`] and ends the stream. The body is dropped as
/// soon as the stream finishes, releasing the connection.
pub fn decode_frames<S>(body: S) -> FrameStream
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let decoder = FrameDecoder {
        body: Some(body.boxed()),
        buffer: Vec::new(),
    };

    Box::pin(stream::unfold(decoder, |mut decoder| async move {
        let frame = decoder.next_frame().await?;
        Some((frame, decoder))
    }))
}

struct FrameDecoder {
    /// `None` once the body is exhausted or the stream was cut short
    body: Option<BoxStream<'static, std::result::Result<Bytes, reqwest::Error>>>,
    buffer: Vec<u8>,
}

enum Line {
    Skip,
    Done,
    Frame(Value),
    Malformed(String),
}

impl FrameDecoder {
    async fn next_frame(&mut self) -> Option<Result<Value>> {
        loop {
            let line = match self.next_line().await? {
                Ok(line) => line,
                Err(e) => {
                    self.finish();
                    return Some(Err(MaasError::Transport(e)));
                }
            };

            match classify(&line) {
                Line::Skip => {}
                Line::Done => {
                    self.finish();
                    return None;
                }
                Line::Frame(value) => return Some(Ok(value)),
                Line::Malformed(message) => {
                    self.finish();
                    return Some(Err(MaasError::StreamDecode(message)));
                }
            }
        }
    }

    async fn next_line(&mut self) -> Option<std::result::Result<Vec<u8>, reqwest::Error>> {
        loop {
            if let Some(line) = self.take_line() {
                return Some(Ok(line));
            }

            let Some(body) = self.body.as_mut() else {
                // Unterminated last line
                return (!self.buffer.is_empty()).then(|| Ok(std::mem::take(&mut self.buffer)));
            };

            match body.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Some(Err(e)),
                None => self.body = None,
            }
        }
    }

    /// Next complete line from the buffer, without its terminator
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();

        Some(line)
    }

    fn finish(&mut self) {
        self.body = None;
        self.buffer.clear();
    }
}

fn classify(raw: &[u8]) -> Line {
    let line = raw.strip_suffix(b"\r").unwrap_or(raw);

    let Some(data) = line.strip_prefix(DATA_PREFIX.as_bytes()) else {
        return Line::Skip;
    };

    let data = data.trim_ascii();
    if data.is_empty() {
        return Line::Skip;
    }
    if data == DONE_SENTINEL.as_bytes() {
        return Line::Done;
    }

    match serde_json::from_slice(data) {
        Ok(value) => Line::Frame(value),
        Err(e) => Line::Malformed(format!("{e} in frame `{}`", String::from_utf8_lossy(data))),
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use serde_json::json;

    use super::*;

    fn body(chunks: &[&str]) -> FrameStream {
        let chunks: Vec<_> = chunks
            .iter()
            .map(|c| Ok::<_, reqwest::Error>(Bytes::from((*c).to_owned())))
            .collect();
        decode_frames(stream::iter(chunks))
    }

    #[tokio::test]
    async fn yields_frames_until_done() {
        let frames: Vec<Value> = body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            "data: [DONE]\n",
            "data: {\"after\":\"done\"}\n",
        ])
        .try_collect()
        .await
        .unwrap();

        assert_eq!(
            frames,
            [
                json!({"choices":[{"delta":{"content":"Hel"}}]}),
                json!({"choices":[{"delta":{"content":"lo"}}]}),
            ]
        );
    }

    #[tokio::test]
    async fn skips_insignificant_lines() {
        let frames: Vec<Value> = body(&[": keep-alive\n\nevent: message\r\ndata:   \r\ndata: {\"n\":1}\r\n\n"])
            .try_collect()
            .await
            .unwrap();

        assert_eq!(frames, [json!({"n": 1})]);
    }

    #[tokio::test]
    async fn reassembles_lines_split_across_chunks() {
        let frames: Vec<Value> = body(&["da", "ta: {\"n\":", "1}\ndata: {\"n\":2}", "\n"])
            .try_collect()
            .await
            .unwrap();

        assert_eq!(frames, [json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn trailing_line_without_newline_is_processed() {
        let frames: Vec<Value> = body(&["data: {\"n\":1}\ndata: {\"n\":2}"]).try_collect().await.unwrap();

        assert_eq!(frames, [json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn malformed_frame_fails_when_reached() {
        let mut frames = body(&["data: {\"n\":1}\n", "data: {not json\n", "data: {\"n\":3}\n"]);

        assert_eq!(frames.next().await.unwrap().unwrap(), json!({"n": 1}));
        assert!(matches!(frames.next().await, Some(Err(MaasError::StreamDecode(_)))));
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_frame_is_malformed() {
        let chunks = vec![
            Ok::<_, reqwest::Error>(Bytes::from_static(b"data: {\"text\":\"caf\xe9\"}\n")),
            Ok(Bytes::from_static(b"data: {\"n\":2}\n")),
        ];
        let mut frames = decode_frames(stream::iter(chunks));

        assert!(matches!(frames.next().await, Some(Err(MaasError::StreamDecode(_)))));
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_body_yields_nothing() {
        assert!(body(&[]).next().await.is_none());
    }
}
