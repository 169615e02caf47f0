#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Best-effort tracing for MaaS API calls
//!
//! A [`Tracer`] opens one [`Span`] per API call and records at most one open
//! generation inside it. The Langfuse variant ships observations to the
//! Langfuse ingestion API; the no-op variant does nothing. Tracing failures
//! are logged and never reach the caller of the API.

mod context;
pub mod error;
mod identity;
pub mod langfuse;
pub mod logging;
mod span;
mod tracer;

pub use context::Observability;
pub use error::{ObservabilityError, Result};
pub use identity::Identity;
pub use langfuse::LangfuseTracer;
pub use span::{GenerationEnd, GenerationStart, Level, Span, SpanOutcome, SpanRecorder, UsageDetails};
pub use tracer::{NoopTracer, Tracer};

pub use maas_config::{TracingConfig, TracingSettings};
