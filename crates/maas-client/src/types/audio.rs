use std::path::Path;

use bytes::Bytes;
use maas_observability::UsageDetails;
use serde::Deserialize;
use serde_with::{DefaultOnNull, serde_as};

/// Audio upload for transcription and translation
#[derive(Debug, Clone)]
pub struct AudioFile {
    /// Raw audio data
    pub data: Bytes,
    /// Filename sent with the multipart part
    pub filename: String,
    /// MIME type of the audio data
    pub content_type: String,
}

impl AudioFile {
    /// Wrap in-memory audio, guessing the MIME type from the filename
    pub fn new(data: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename).to_owned();

        Self {
            data: data.into(),
            filename,
            content_type,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Read an audio file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read
    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map_or_else(|| "audio".to_owned(), |name| name.to_string_lossy().into_owned());

        Ok(Self::new(data, filename))
    }

    /// Whether the upload carries no audio
    pub(crate) fn is_blank(&self) -> bool {
        self.data.is_empty() || self.filename.trim().is_empty()
    }
}

fn guess_content_type(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3" | "mpga" | "mpeg") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("mp4") => "video/mp4",
        Some("ogg" | "oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// Transcription response
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioTranscriptionResponse {
    /// Transcribed text
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub text: String,
    /// Detected language
    #[serde(default)]
    pub language: Option<String>,
    /// Audio duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Timed segments (verbose formats only)
    #[serde(default)]
    pub segments: Vec<AudioSegment>,
    #[serde(default)]
    pub usage: Option<AudioUsage>,
}

/// Translation response; same shape as a transcription
pub type AudioTranslationResponse = AudioTranscriptionResponse;

/// Timed segment of a transcription
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioSegment {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub text: String,
}

/// Audio usage, either token counts or billed seconds
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AudioUsage {
    /// `"tokens"` or `"duration"`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub seconds: Option<f64>,
}

impl AudioUsage {
    pub(crate) const fn details(&self) -> UsageDetails {
        UsageDetails {
            input: self.input_tokens,
            output: self.output_tokens,
            total: self.total_tokens,
        }
    }
}
