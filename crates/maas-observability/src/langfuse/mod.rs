//! Langfuse tracer backed by the public ingestion API
//!
//! Observations are buffered in memory and posted in batches, either on an
//! explicit [`Tracer::flush`] or in the background once `flush_at` events
//! have accumulated after a span ends.

mod event;
mod recorder;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use maas_config::TracingConfig;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use crate::error::{ObservabilityError, Result};
use crate::identity::Identity;
use crate::span::Span;
use crate::tracer::Tracer;

pub use event::{EventBody, IngestionEvent};
use event::{IngestionBatch, IngestionResponse, SpanCreateBody, TraceBody};
use recorder::LangfuseRecorder;

const INGESTION_PATH: &str = "api/public/ingestion";
const INGESTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Tracer shipping spans and generations to Langfuse
#[derive(Clone)]
pub struct LangfuseTracer {
    shared: Arc<Shared>,
}

pub(crate) struct Shared {
    http: reqwest::Client,
    endpoint: Url,
    public_key: String,
    secret_key: SecretString,
    pub(crate) environment: String,
    pub(crate) release: Option<String>,
    flush_at: usize,
    buffer: Mutex<Vec<IngestionEvent>>,
}

impl LangfuseTracer {
    /// Build a tracer from resolved settings
    ///
    /// The `enabled` flag is not consulted here; choosing between this and
    /// the no-op tracer is up to [`Observability`](crate::Observability).
    ///
    /// # Errors
    ///
    /// Returns an error if either credential is missing, the host is not a
    /// valid URL, or the HTTP client cannot be built
    pub fn new(config: &TracingConfig) -> Result<Self> {
        let public_key = config
            .public_key
            .clone()
            .ok_or_else(|| ObservabilityError::Config("missing Langfuse public key".to_owned()))?;

        let secret_key = config
            .secret_key
            .clone()
            .ok_or_else(|| ObservabilityError::Config("missing Langfuse secret key".to_owned()))?;

        let endpoint = ingestion_url(&config.host)?;

        let http = reqwest::Client::builder()
            .timeout(INGESTION_TIMEOUT)
            .build()?;

        Ok(Self {
            shared: Arc::new(Shared {
                http,
                endpoint,
                public_key,
                secret_key,
                environment: config.environment.clone(),
                release: config.release.clone(),
                flush_at: config.flush_at.max(1),
                buffer: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Number of events waiting for the next flush
    pub fn pending(&self) -> usize {
        self.shared.lock_buffer().len()
    }

    /// Copy of the events waiting for the next flush
    pub fn pending_events(&self) -> Vec<IngestionEvent> {
        self.shared.lock_buffer().clone()
    }
}

#[async_trait]
impl Tracer for LangfuseTracer {
    fn start_span(&self, name: &str, input: Value, identity: &Identity) -> Span {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let span_id = uuid::Uuid::new_v4().to_string();
        let started = event::now();

        // identity goes on the trace first so every nested observation inherits it
        self.shared.push(EventBody::TraceCreate(TraceBody {
            id: trace_id.clone(),
            name: name.to_owned(),
            timestamp: started.clone(),
            user_id: identity.user_id.clone(),
            session_id: identity.session_id.clone(),
            input: Some(input.clone()),
            output: None,
            environment: self.shared.environment.clone(),
            release: self.shared.release.clone(),
        }));

        self.shared.push(EventBody::SpanCreate(SpanCreateBody {
            id: span_id.clone(),
            trace_id: trace_id.clone(),
            name: name.to_owned(),
            start_time: started.clone(),
            input,
            environment: self.shared.environment.clone(),
        }));

        tracing::debug!(span = name, trace_id = %trace_id, "langfuse span started");

        let recorder = LangfuseRecorder::new(
            Arc::clone(&self.shared),
            name,
            trace_id,
            span_id,
            started,
            identity.clone(),
        );

        Span::new(name, Box::new(recorder))
    }

    async fn flush(&self) -> Result<()> {
        self.shared.flush().await
    }
}

impl Shared {
    fn lock_buffer(&self) -> std::sync::MutexGuard<'_, Vec<IngestionEvent>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, body: EventBody) {
        self.lock_buffer().push(IngestionEvent::new(body));
    }

    /// Spawn a background flush when the buffer is full and a runtime exists
    pub(crate) fn maybe_flush(self: &Arc<Self>) {
        if self.lock_buffer().len() < self.flush_at {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let shared = Arc::clone(self);
        handle.spawn(async move {
            if let Err(e) = shared.flush().await {
                tracing::warn!("background langfuse flush failed: {e}");
            }
        });
    }

    /// Post the buffered events as one batch
    ///
    /// The buffer is drained before sending; a failed batch is dropped.
    async fn flush(&self) -> Result<()> {
        let batch = std::mem::take(&mut *self.lock_buffer());
        if batch.is_empty() {
            return Ok(());
        }

        tracing::debug!(events = batch.len(), "flushing langfuse batch");

        let response = self
            .http
            .post(self.endpoint.clone())
            .basic_auth(&self.public_key, Some(self.secret_key.expose_secret()))
            .json(&IngestionBatch { batch: &batch })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ObservabilityError::Ingestion {
                status: status.as_u16(),
                body,
            });
        }

        let reply: IngestionResponse = serde_json::from_str(&body).unwrap_or_default();
        for failure in &reply.errors {
            tracing::warn!(
                event_id = %failure.id,
                status = failure.status,
                "langfuse rejected event: {}",
                failure.message.as_deref().unwrap_or("no message")
            );
        }

        Ok(())
    }
}

impl std::fmt::Debug for LangfuseTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LangfuseTracer")
            .field("endpoint", &self.shared.endpoint)
            .field("environment", &self.shared.environment)
            .finish_non_exhaustive()
    }
}

/// Resolve the ingestion endpoint below the configured host
fn ingestion_url(host: &str) -> Result<Url> {
    let mut base =
        Url::parse(host.trim()).map_err(|e| ObservabilityError::Config(format!("invalid Langfuse host `{host}`: {e}")))?;

    if base.cannot_be_a_base() {
        return Err(ObservabilityError::Config(format!("invalid Langfuse host `{host}`")));
    }

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(INGESTION_PATH)
        .map_err(|e| ObservabilityError::Config(format!("invalid Langfuse host `{host}`: {e}")))
}
