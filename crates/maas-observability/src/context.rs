use std::sync::{Arc, PoisonError, RwLock};

use maas_config::{TracingConfig, TracingSettings};
use serde_json::Value;

use crate::identity::Identity;
use crate::langfuse::LangfuseTracer;
use crate::span::Span;
use crate::tracer::{NoopTracer, Tracer};

/// Process-level tracing context
///
/// Built once at application start and shared (usually behind an `Arc`)
/// with every client. Holds the tracer variant chosen from configuration and
/// the ambient identity attached to spans started after it was set.
#[derive(Debug)]
pub struct Observability {
    tracer: Arc<dyn Tracer>,
    identity: RwLock<Identity>,
}

impl Observability {
    /// Choose the tracer variant for resolved settings
    ///
    /// Disabled settings select the no-op tracer. Enabled settings select
    /// the Langfuse tracer, falling back to the no-op tracer if it cannot be
    /// constructed.
    pub fn from_config(config: &TracingConfig) -> Self {
        if !config.enabled {
            tracing::debug!("langfuse tracing disabled");
            return Self::disabled();
        }

        match LangfuseTracer::new(config) {
            Ok(tracer) => {
                tracing::info!(host = %config.host, environment = %config.environment, "langfuse tracing enabled");
                Self::with_tracer(Arc::new(tracer))
            }
            Err(e) => {
                tracing::warn!("langfuse tracing unavailable, continuing without it: {e}");
                Self::disabled()
            }
        }
    }

    /// Resolve settings against the environment, then choose the tracer
    pub fn from_settings(settings: &TracingSettings) -> Self {
        Self::from_config(&settings.resolve())
    }

    /// Context whose spans record nothing
    pub fn disabled() -> Self {
        Self::with_tracer(Arc::new(NoopTracer))
    }

    pub fn with_tracer(tracer: Arc<dyn Tracer>) -> Self {
        Self {
            tracer,
            identity: RwLock::new(Identity::default()),
        }
    }

    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    pub fn is_enabled(&self) -> bool {
        self.tracer.is_enabled()
    }

    /// Replace the ambient identity; spans already started keep theirs
    pub fn set_identity(&self, identity: Identity) {
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = identity;
    }

    pub fn identity(&self) -> Identity {
        self.identity.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Start a span under the ambient identity
    pub fn start_span(&self, name: &str, input: Value) -> Span {
        self.start_span_with(name, input, &Identity::default())
    }

    /// Start a span with `overlay` ids taking precedence over the ambient ones
    pub fn start_span_with(&self, name: &str, input: Value, overlay: &Identity) -> Span {
        let identity = overlay.merged_over(&self.identity());
        self.tracer.start_span(name, input, &identity)
    }

    /// Deliver pending observations, logging any failure
    pub async fn flush(&self) {
        if let Err(e) = self.tracer.flush().await {
            tracing::warn!("failed to flush traces: {e}");
        }
    }
}

impl Default for Observability {
    fn default() -> Self {
        Self::disabled()
    }
}
