use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identity::Identity;
use crate::span::Span;

/// Opens spans for API calls and ships what they record
#[async_trait]
pub trait Tracer: Send + Sync + std::fmt::Debug {
    /// Open a span named after the operation, carrying its input payload
    ///
    /// `identity` is attached to the span and every observation nested in it.
    fn start_span(&self, name: &str, input: Value, identity: &Identity) -> Span;

    /// Deliver everything recorded so far
    async fn flush(&self) -> Result<()>;

    /// Whether spans from this tracer leave the process
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Tracer used when tracing is disabled or could not be set up
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

#[async_trait]
impl Tracer for NoopTracer {
    fn start_span(&self, name: &str, _input: Value, _identity: &Identity) -> Span {
        Span::noop(name)
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
