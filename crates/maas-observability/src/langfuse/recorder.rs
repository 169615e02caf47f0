use std::sync::Arc;

use super::Shared;
use super::event::{self, EventBody, GenerationCreateBody, GenerationUpdateBody, SpanUpdateBody, TraceBody};
use crate::error::Result;
use crate::identity::Identity;
use crate::span::{GenerationEnd, GenerationStart, SpanOutcome, SpanRecorder};

const GENERATION_NAME: &str = "model-generation";

/// Turns span guard calls into buffered ingestion events
pub(super) struct LangfuseRecorder {
    shared: Arc<Shared>,
    name: String,
    trace_id: String,
    span_id: String,
    started: String,
    identity: Identity,
    generation_id: Option<String>,
}

impl LangfuseRecorder {
    pub(super) fn new(
        shared: Arc<Shared>,
        name: &str,
        trace_id: String,
        span_id: String,
        started: String,
        identity: Identity,
    ) -> Self {
        Self {
            shared,
            name: name.to_owned(),
            trace_id,
            span_id,
            started,
            identity,
            generation_id: None,
        }
    }
}

impl SpanRecorder for LangfuseRecorder {
    fn open_generation(&mut self, start: GenerationStart) -> Result<()> {
        let id = uuid::Uuid::new_v4().to_string();

        self.shared.push(EventBody::GenerationCreate(GenerationCreateBody {
            id: id.clone(),
            trace_id: self.trace_id.clone(),
            parent_observation_id: self.span_id.clone(),
            name: GENERATION_NAME.to_owned(),
            start_time: event::now(),
            model: start.model,
            input: start.input,
            environment: self.shared.environment.clone(),
        }));

        self.generation_id = Some(id);
        Ok(())
    }

    fn close_generation(&mut self, end: GenerationEnd) -> Result<()> {
        let Some(id) = self.generation_id.take() else {
            return Ok(());
        };

        self.shared.push(EventBody::GenerationUpdate(GenerationUpdateBody {
            id,
            trace_id: self.trace_id.clone(),
            end_time: event::now(),
            output: serde_json::json!({
                "role": "assistant",
                "content": end.output,
            }),
            usage_details: end.usage,
        }));

        Ok(())
    }

    fn close_span(&mut self, outcome: SpanOutcome) -> Result<()> {
        self.shared.push(EventBody::SpanUpdate(SpanUpdateBody {
            id: self.span_id.clone(),
            trace_id: self.trace_id.clone(),
            end_time: event::now(),
            output: outcome.output.clone(),
            level: outcome.level.into(),
            status_message: outcome.status_message,
        }));

        // trace upsert last, releasing the identity scope
        self.shared.push(EventBody::TraceCreate(TraceBody {
            id: self.trace_id.clone(),
            name: self.name.clone(),
            timestamp: self.started.clone(),
            user_id: self.identity.user_id.clone(),
            session_id: self.identity.session_id.clone(),
            input: None,
            output: outcome.output,
            environment: self.shared.environment.clone(),
            release: self.shared.release.clone(),
        }));

        tracing::debug!(span = %self.name, trace_id = %self.trace_id, "langfuse span ended");

        self.shared.maybe_flush();
        Ok(())
    }
}
