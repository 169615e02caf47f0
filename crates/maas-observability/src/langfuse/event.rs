//! Langfuse ingestion API payloads
//!
//! Only the event types and fields the tracer emits are modelled.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::span::{Level, UsageDetails};

/// Request body of `POST /api/public/ingestion`
#[derive(Debug, Serialize)]
pub struct IngestionBatch<'a> {
    pub batch: &'a [IngestionEvent],
}

/// One entry of an ingestion batch
#[derive(Debug, Clone, Serialize)]
pub struct IngestionEvent {
    pub id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub body: EventBody,
}

impl IngestionEvent {
    pub fn new(body: EventBody) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now(),
            body,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self.body {
            EventBody::TraceCreate(_) => "trace-create",
            EventBody::SpanCreate(_) => "span-create",
            EventBody::SpanUpdate(_) => "span-update",
            EventBody::GenerationCreate(_) => "generation-create",
            EventBody::GenerationUpdate(_) => "generation-update",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "kebab-case")]
pub enum EventBody {
    TraceCreate(TraceBody),
    SpanCreate(SpanCreateBody),
    SpanUpdate(SpanUpdateBody),
    GenerationCreate(GenerationCreateBody),
    GenerationUpdate(GenerationUpdateBody),
}

/// Trace upsert; sent on span start and again with the output on span end
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBody {
    pub id: String,
    pub name: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanCreateBody {
    pub id: String,
    pub trace_id: String,
    pub name: String,
    pub start_time: String,
    pub input: Value,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanUpdateBody {
    pub id: String,
    pub trace_id: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub level: WireLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationCreateBody {
    pub id: String,
    pub trace_id: String,
    pub parent_observation_id: String,
    pub name: String,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub input: Value,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationUpdateBody {
    pub id: String,
    pub trace_id: String,
    pub end_time: String,
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_details: Option<UsageDetails>,
}

/// Observation level as spelled on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WireLevel {
    Default,
    Warning,
    Error,
}

impl From<Level> for WireLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Default => Self::Default,
            Level::Warning => Self::Warning,
            Level::Error => Self::Error,
        }
    }
}

/// Ingestion endpoint reply (HTTP 207 multi-status)
#[derive(Debug, Default, Deserialize)]
pub struct IngestionResponse {
    #[serde(default)]
    pub errors: Vec<IngestionFailure>,
}

#[derive(Debug, Deserialize)]
pub struct IngestionFailure {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
}

/// Current time as an RFC 3339 timestamp
pub fn now() -> String {
    jiff::Timestamp::now().to_string()
}
