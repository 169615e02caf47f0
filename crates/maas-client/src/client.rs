use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use maas_config::ResolvedClientConfig;
use maas_config::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use maas_observability::{GenerationEnd, GenerationStart, Identity, Observability, Span, UsageDetails};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use url::Url;

use crate::error::{MaasError, Result};
use crate::options::{RequestOptions, form_text, required_items, required_text};
use crate::sse::decode_frames;
use crate::stream::{ChatCompletionStream, ChunkStream, CompletionStream};
use crate::types::{
    ApiError, AudioFile, AudioTranscriptionResponse, AudioTranslationResponse, ChatCompletionResponse, ChatMessage,
    CompletionResponse, EmbeddingInput, EmbeddingResponse, ModelsListResponse, RerankInput, RerankResponse,
};

const CHAT_COMPLETIONS: &str = "v1/chat/completions";
const COMPLETIONS: &str = "v1/completions";
const EMBEDDINGS: &str = "v1/embeddings";
const RERANK: &str = "v1/rerank";
const MODELS: &str = "v1/models";
const TRANSCRIPTIONS: &str = "v1/audio/transcriptions";
const TRANSLATIONS: &str = "v1/audio/translations";
const SPEECH: &str = "v1/audio/speech";

/// Typed client for the MaaS inference API
///
/// Every operation validates its parameters before any I/O, issues exactly
/// one request and records one span on the configured tracer.
#[derive(Clone)]
pub struct MaasClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    model: Option<String>,
    identity: Identity,
    observability: Arc<Observability>,
}

/// Builder for [`MaasClient`]
#[derive(Debug)]
pub struct MaasClientBuilder {
    api_key: SecretString,
    base_url: String,
    model: Option<String>,
    timeout: Duration,
    user_id: Option<String>,
    session_id: Option<String>,
    observability: Option<Arc<Observability>>,
}

impl MaasClientBuilder {
    /// Default model used when a call does not override `model`
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Connect timeout and longest silence tolerated while reading a response
    ///
    /// A stream that keeps delivering frames is never cut off.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Tracing context shared with other clients
    #[must_use]
    pub fn observability(mut self, observability: Arc<Observability>) -> Self {
        self.observability = Some(observability);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is blank, the base URL is invalid or
    /// the HTTP client cannot be built
    pub fn build(self) -> Result<MaasClient> {
        let api_key = self.api_key.expose_secret().trim();
        if api_key.is_empty() {
            return Err(MaasError::Configuration(
                "API key must be provided and cannot be empty".to_owned(),
            ));
        }

        let base_url = parse_base_url(&self.base_url)?;

        let http = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .read_timeout(self.timeout)
            .build()
            .map_err(|e| MaasError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let model = self
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(ToOwned::to_owned);

        let identity = Identity::new(self.user_id.as_deref(), self.session_id.as_deref());

        Ok(MaasClient {
            http,
            base_url,
            api_key: SecretString::from(api_key.to_owned()),
            model,
            identity,
            observability: self.observability.unwrap_or_default(),
        })
    }
}

impl MaasClient {
    /// Client with default settings and tracing disabled
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is blank
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> MaasClientBuilder {
        MaasClientBuilder {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: None,
            timeout: DEFAULT_TIMEOUT,
            user_id: None,
            session_id: None,
            observability: None,
        }
    }

    /// Client from resolved configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured API key is blank
    pub fn from_config(config: &ResolvedClientConfig, observability: Arc<Observability>) -> Result<Self> {
        let mut builder = Self::builder(config.api_key.expose_secret())
            .base_url(config.base_url.as_str())
            .timeout(config.timeout)
            .observability(observability);

        if let Some(model) = &config.model {
            builder = builder.model(model.clone());
        }

        builder.build()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Identity layered over the ambient one for this client's spans
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn observability(&self) -> &Arc<Observability> {
        &self.observability
    }

    /// Deliver pending traces
    pub async fn flush(&self) {
        self.observability.flush().await;
    }

    // -- Chat --

    /// Chat completion
    ///
    /// POST `/v1/chat/completions` with `stream: false`
    ///
    /// # Errors
    ///
    /// Returns an error if `messages` is empty, an option is blank, the
    /// request fails or the response carries no choices
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &RequestOptions,
    ) -> Result<ChatCompletionResponse> {
        required_items("messages", messages)?;
        options.validate()?;

        let payload = self.chat_payload(messages, options, false)?;
        let model = model_of(&payload);
        let mut span = self.start_span("maas.chat_completion", Value::Object(payload.clone()));

        let response: ChatCompletionResponse = match self.post_json(CHAT_COMPLETIONS, &payload).await {
            Ok(response) => response,
            Err(e) => return Err(fail(span, e)),
        };

        let Some(content) = response.content().map(ToOwned::to_owned) else {
            return Err(fail(span, MaasError::Decode("chat completion has no choices".to_owned())));
        };

        record(
            &mut span,
            GenerationStart::new(model.as_deref(), json!(messages)),
            content,
            response.usage.as_ref().map(crate::types::Usage::details),
        );

        Ok(response)
    }

    /// Streamed chat completion
    ///
    /// POST `/v1/chat/completions` with `stream: true`, overriding any
    /// `stream` option. The span stays open until the returned stream ends
    /// or is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `messages` is empty, an option is blank or the
    /// server rejects the request
    pub async fn chat_completion_stream(
        &self,
        messages: &[ChatMessage],
        options: &RequestOptions,
    ) -> Result<ChatCompletionStream> {
        required_items("messages", messages)?;
        options.validate()?;

        let payload = self.chat_payload(messages, options, true)?;
        let start = GenerationStart::new(model_of(&payload).as_deref(), json!(messages));
        let span = self.start_span("maas.chat_completion", Value::Object(payload.clone()));

        self.open_stream(CHAT_COMPLETIONS, &payload, span, start).await
    }

    // -- Completion --

    /// Text completion
    ///
    /// POST `/v1/completions` with `stream: false`
    ///
    /// # Errors
    ///
    /// Returns an error if `prompt` is blank, an option is blank, the
    /// request fails or the response carries no choices
    pub async fn completion(&self, prompt: &str, options: &RequestOptions) -> Result<CompletionResponse> {
        required_text("prompt", prompt)?;
        options.validate()?;

        let payload = self.completion_payload(prompt, options, false);
        let model = model_of(&payload);
        let mut span = self.start_span("maas.completion", Value::Object(payload.clone()));

        let response: CompletionResponse = match self.post_json(COMPLETIONS, &payload).await {
            Ok(response) => response,
            Err(e) => return Err(fail(span, e)),
        };

        let Some(text) = response.text().map(ToOwned::to_owned) else {
            return Err(fail(span, MaasError::Decode("completion has no choices".to_owned())));
        };

        record(
            &mut span,
            GenerationStart::new(model.as_deref(), prompt),
            text,
            response.usage.as_ref().map(crate::types::Usage::details),
        );

        Ok(response)
    }

    /// Streamed text completion
    ///
    /// POST `/v1/completions` with `stream: true`
    ///
    /// # Errors
    ///
    /// Returns an error if `prompt` is blank, an option is blank or the
    /// server rejects the request
    pub async fn completion_stream(&self, prompt: &str, options: &RequestOptions) -> Result<CompletionStream> {
        required_text("prompt", prompt)?;
        options.validate()?;

        let payload = self.completion_payload(prompt, options, true);
        let start = GenerationStart::new(model_of(&payload).as_deref(), prompt);
        let span = self.start_span("maas.completion", Value::Object(payload.clone()));

        self.open_stream(COMPLETIONS, &payload, span, start).await
    }

    // -- Embeddings --

    /// Embed one text or a batch
    ///
    /// POST `/v1/embeddings`
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or an empty batch, an option
    /// is blank or the request fails
    pub async fn create_embeddings(
        &self,
        input: impl Into<EmbeddingInput>,
        options: &RequestOptions,
    ) -> Result<EmbeddingResponse> {
        let input = input.into();
        if input.is_blank() {
            return Err(MaasError::validation("input"));
        }
        options.validate()?;

        let mut payload = self.base_payload();
        payload.insert("input".to_owned(), json!(input));
        options.merge_into(&mut payload);

        let model = model_of(&payload);
        let mut span = self.start_span("maas.embeddings", json!({ "model": model }));

        let response: EmbeddingResponse = match self.post_json(EMBEDDINGS, &payload).await {
            Ok(response) => response,
            Err(e) => return Err(fail(span, e)),
        };

        record(
            &mut span,
            GenerationStart::new(model.as_deref(), json!(input)),
            "embedding_vectors",
            response.usage.as_ref().map(crate::types::EmbeddingUsage::details),
        );

        Ok(response)
    }

    // -- Rerank --

    /// Order documents by relevance to a query
    ///
    /// POST `/v1/rerank`
    ///
    /// # Errors
    ///
    /// Returns an error if the query is blank, `documents` is empty, an
    /// option is blank or the request fails
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[RerankInput],
        options: &RequestOptions,
    ) -> Result<RerankResponse> {
        required_text("query", query)?;
        required_items("documents", documents)?;
        options.validate()?;

        let mut payload = self.base_payload();
        payload.insert("query".to_owned(), json!(query));
        payload.insert("documents".to_owned(), json!(documents));
        options.merge_into(&mut payload);

        let model = model_of(&payload);
        let mut span = self.start_span("maas.rerank", json!({ "model": model }));

        let response: RerankResponse = match self.post_json(RERANK, &payload).await {
            Ok(response) => response,
            Err(e) => return Err(fail(span, e)),
        };

        let ranking: Vec<Value> = response
            .results
            .iter()
            .map(|r| json!({ "index": r.index, "relevance_score": r.relevance_score }))
            .collect();

        record(
            &mut span,
            GenerationStart::new(model.as_deref(), json!({ "query": query, "documents": documents.len() })),
            ranking,
            response.usage.as_ref().map(crate::types::Usage::details),
        );

        Ok(response)
    }

    // -- Models --

    /// Models available to this API key
    ///
    /// GET `/v1/models`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn list_models(&self) -> Result<ModelsListResponse> {
        let mut span = self.start_span("maas.list_models", json!({ "model": self.model }));

        let request = match self.request(Method::GET, MODELS) {
            Ok(request) => request,
            Err(e) => return Err(fail(span, e)),
        };

        let models: ModelsListResponse = match send(request).await {
            Ok(response) => match decode(response).await {
                Ok(models) => models,
                Err(e) => return Err(fail(span, e)),
            },
            Err(e) => return Err(fail(span, e)),
        };

        span.set_output(json!({ "models": models.data.len() }));
        span.end();

        Ok(models)
    }

    // -- Audio --

    /// Transcribe speech in its spoken language
    ///
    /// POST `/v1/audio/transcriptions` as multipart; options become form fields
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, an option is blank or the
    /// request fails
    pub async fn speech_to_text(
        &self,
        file: &AudioFile,
        options: &RequestOptions,
    ) -> Result<AudioTranscriptionResponse> {
        self.upload_audio("maas.speech_to_text", TRANSCRIPTIONS, file, options).await
    }

    /// Translate speech into English text
    ///
    /// POST `/v1/audio/translations` as multipart; options become form fields
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, an option is blank or the
    /// request fails
    pub async fn audio_translation(
        &self,
        file: &AudioFile,
        options: &RequestOptions,
    ) -> Result<AudioTranslationResponse> {
        self.upload_audio("maas.audio_translation", TRANSLATIONS, file, options).await
    }

    /// Synthesize speech
    ///
    /// POST `/v1/audio/speech`; returns the raw audio bytes
    ///
    /// # Errors
    ///
    /// Returns an error if `input_text` or `voice` is blank, an option is
    /// blank or the request fails
    pub async fn text_to_speech(&self, input_text: &str, voice: &str, options: &RequestOptions) -> Result<Bytes> {
        required_text("input_text", input_text)?;
        required_text("voice", voice)?;
        options.validate()?;

        let mut payload = self.base_payload();
        payload.insert("input".to_owned(), json!(input_text));
        payload.insert("voice".to_owned(), json!(voice));
        options.merge_into(&mut payload);

        let model = model_of(&payload);
        let mut span = self.start_span("maas.text_to_speech", json!({ "model": model }));

        let request = match self.request(Method::POST, SPEECH) {
            Ok(request) => request.json(&payload),
            Err(e) => return Err(fail(span, e)),
        };

        let audio = match send(request).await {
            Ok(response) => match response.bytes().await {
                Ok(audio) => audio,
                Err(e) => return Err(fail(span, e.into())),
            },
            Err(e) => return Err(fail(span, e)),
        };

        record(
            &mut span,
            GenerationStart::new(model.as_deref(), input_text),
            "binary_audio",
            None,
        );

        Ok(audio)
    }

    async fn upload_audio(
        &self,
        span_name: &str,
        path: &str,
        file: &AudioFile,
        options: &RequestOptions,
    ) -> Result<AudioTranscriptionResponse> {
        if file.is_blank() {
            return Err(MaasError::validation("file"));
        }
        options.validate()?;

        let part = Part::bytes(file.data.to_vec())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| MaasError::Configuration(format!("invalid content type `{}`: {e}", file.content_type)))?;

        let mut fields = self.base_payload();
        options.merge_into(&mut fields);

        let model = model_of(&fields);
        let form = fields
            .iter()
            .fold(Form::new(), |form, (key, value)| form.text(key.clone(), form_text(value)))
            .part("file", part);

        let mut span = self.start_span(span_name, json!({ "model": model }));

        let request = match self.request(Method::POST, path) {
            Ok(request) => request.multipart(form),
            Err(e) => return Err(fail(span, e)),
        };

        let response: AudioTranscriptionResponse = match send(request).await {
            Ok(response) => match decode(response).await {
                Ok(response) => response,
                Err(e) => return Err(fail(span, e)),
            },
            Err(e) => return Err(fail(span, e)),
        };

        record(
            &mut span,
            GenerationStart::new(model.as_deref(), "audio_file"),
            response.text.clone(),
            response.usage.as_ref().map(crate::types::AudioUsage::details),
        );

        Ok(response)
    }

    // -- Request plumbing --

    fn start_span(&self, name: &str, input: Value) -> Span {
        self.observability.start_span_with(name, input, &self.identity)
    }

    /// Payload seeded with the default model, if any
    fn base_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        if let Some(model) = &self.model {
            payload.insert("model".to_owned(), json!(model));
        }

        payload
    }

    fn chat_payload(
        &self,
        messages: &[ChatMessage],
        options: &RequestOptions,
        stream: bool,
    ) -> Result<Map<String, Value>> {
        let messages = serde_json::to_value(messages).map_err(|e| MaasError::Decode(e.to_string()))?;

        let mut payload = self.base_payload();
        payload.insert("messages".to_owned(), messages);
        options.merge_into(&mut payload);
        payload.insert("stream".to_owned(), json!(stream));

        Ok(payload)
    }

    fn completion_payload(&self, prompt: &str, options: &RequestOptions, stream: bool) -> Map<String, Value> {
        let mut payload = self.base_payload();
        payload.insert("prompt".to_owned(), json!(prompt));
        options.merge_into(&mut payload);
        payload.insert("stream".to_owned(), json!(stream));

        payload
    }

    /// Authenticated request to an endpoint below the base URL
    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| MaasError::Configuration(format!("invalid endpoint `{path}`: {e}")))?;

        tracing::debug!(%method, %url, "sending MaaS request");

        Ok(self.http.request(method, url).bearer_auth(self.api_key.expose_secret()))
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, payload: &Map<String, Value>) -> Result<T> {
        let request = self.request(Method::POST, path)?.json(payload);
        decode(send(request).await?).await
    }

    async fn open_stream<T>(
        &self,
        path: &str,
        payload: &Map<String, Value>,
        mut span: Span,
        start: GenerationStart,
    ) -> Result<ChunkStream<T>>
    where
        T: crate::stream::StreamedChunk,
    {
        let request = match self.request(Method::POST, path) {
            Ok(request) => request.json(payload),
            Err(e) => return Err(fail(span, e)),
        };

        let response = match send(request).await {
            Ok(response) => response,
            Err(e) => return Err(fail(span, e)),
        };

        span.start_generation(start);

        Ok(ChunkStream::new(decode_frames(response.bytes_stream()), span))
    }
}

impl fmt::Debug for MaasClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaasClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Base URL with a trailing slash so endpoint paths join below it
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|e| MaasError::Configuration(format!("invalid base URL `{raw}`: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(MaasError::Configuration(format!("invalid base URL `{raw}`")));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Send and turn error statuses into [`ApiError`]s
async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = request.send().await?;

    let status = response.status();
    if status.as_u16() < 400 {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(status = status.as_u16(), "MaaS API request failed: {body}");

    Err(ApiError::new(status.as_u16(), body).into())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| MaasError::Decode(e.to_string()))
}

fn model_of(payload: &Map<String, Value>) -> Option<String> {
    payload.get("model").and_then(Value::as_str).map(ToOwned::to_owned)
}

/// Record the generation and end the span
fn record(span: &mut Span, start: GenerationStart, output: impl Into<Value>, usage: Option<UsageDetails>) {
    let output = output.into();
    span.generation(start, GenerationEnd::new(output.clone(), usage));
    span.set_output(output);
    span.end();
}

/// Mark the span failed, end it and hand the error back
fn fail(mut span: Span, error: MaasError) -> MaasError {
    span.set_error(error.to_string());
    span.end();
    error
}
