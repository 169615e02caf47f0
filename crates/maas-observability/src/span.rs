use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Token accounting attached to a generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Opening half of a generation: which model was invoked with what
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStart {
    pub model: Option<String>,
    pub input: Value,
}

impl GenerationStart {
    pub fn new(model: Option<&str>, input: impl Into<Value>) -> Self {
        Self {
            model: model.map(ToOwned::to_owned),
            input: input.into(),
        }
    }
}

/// Closing half of a generation: what came back
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationEnd {
    pub output: Value,
    pub usage: Option<UsageDetails>,
}

impl GenerationEnd {
    pub fn new(output: impl Into<Value>, usage: Option<UsageDetails>) -> Self {
        Self {
            output: output.into(),
            usage,
        }
    }
}

/// Severity reported for a finished span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Level {
    #[default]
    Default,
    Warning,
    Error,
}

/// Final state of a span handed to the recorder on close
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanOutcome {
    pub output: Option<Value>,
    pub level: Level,
    pub status_message: Option<String>,
}

/// Backend seam behind a [`Span`]
///
/// The span guard owns the state machine, so implementations only ever see
/// well-ordered calls: `open_generation`/`close_generation` pairs, then a
/// single `close_span`.
pub trait SpanRecorder: Send {
    fn open_generation(&mut self, start: GenerationStart) -> Result<()>;

    fn close_generation(&mut self, end: GenerationEnd) -> Result<()>;

    fn close_span(&mut self, outcome: SpanOutcome) -> Result<()>;
}

/// Recorder that drops everything
#[derive(Debug, Default)]
pub(crate) struct NoopRecorder;

impl SpanRecorder for NoopRecorder {
    fn open_generation(&mut self, _start: GenerationStart) -> Result<()> {
        Ok(())
    }

    fn close_generation(&mut self, _end: GenerationEnd) -> Result<()> {
        Ok(())
    }

    fn close_span(&mut self, _outcome: SpanOutcome) -> Result<()> {
        Ok(())
    }
}

/// One traced API call
///
/// Lifecycle: created, then any number of generation open/close pairs (at
/// most one open at a time), then ended. Ending is idempotent and happens on
/// drop at the latest, so every exit path releases the span. Calls after the
/// span ended are ignored. Recorder failures are logged, never returned.
pub struct Span {
    name: String,
    recorder: Box<dyn SpanRecorder>,
    generation_open: bool,
    ended: bool,
    outcome: SpanOutcome,
}

impl Span {
    pub fn new(name: impl Into<String>, recorder: Box<dyn SpanRecorder>) -> Self {
        Self {
            name: name.into(),
            recorder,
            generation_open: false,
            ended: false,
            outcome: SpanOutcome::default(),
        }
    }

    /// Span that records nothing
    pub fn noop(name: impl Into<String>) -> Self {
        Self::new(name, Box::new(NoopRecorder))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    pub const fn has_open_generation(&self) -> bool {
        self.generation_open
    }

    /// Open a generation, closing a still-open previous one first
    pub fn start_generation(&mut self, start: GenerationStart) {
        if self.ended {
            return;
        }

        if self.generation_open {
            self.close_open_generation(GenerationEnd::new(Value::Null, None));
        }

        match self.recorder.open_generation(start) {
            Ok(()) => self.generation_open = true,
            Err(e) => tracing::warn!(span = %self.name, "failed to open generation: {e}"),
        }
    }

    /// Close the open generation, if any
    pub fn end_generation(&mut self, end: GenerationEnd) {
        if self.ended || !self.generation_open {
            return;
        }

        self.close_open_generation(end);
    }

    /// Record a complete generation in one step
    pub fn generation(&mut self, start: GenerationStart, end: GenerationEnd) {
        self.start_generation(start);
        self.end_generation(end);
    }

    pub fn set_output(&mut self, output: impl Into<Value>) {
        self.outcome.output = Some(output.into());
    }

    /// Mark the span as failed
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.outcome.level = Level::Error;
        self.outcome.status_message = Some(message.into());
    }

    /// Flag the span without failing it; an earlier error is kept
    pub fn set_warning(&mut self, message: impl Into<String>) {
        if self.outcome.level == Level::Error {
            return;
        }

        self.outcome.level = Level::Warning;
        self.outcome.status_message = Some(message.into());
    }

    /// Close the open generation, then the span
    pub fn end(&mut self) {
        if self.ended {
            return;
        }

        if self.generation_open {
            self.close_open_generation(GenerationEnd::new(Value::Null, None));
        }

        self.ended = true;

        let outcome = std::mem::take(&mut self.outcome);
        if let Err(e) = self.recorder.close_span(outcome) {
            tracing::warn!(span = %self.name, "failed to close span: {e}");
        }
    }

    fn close_open_generation(&mut self, end: GenerationEnd) {
        self.generation_open = false;

        if let Err(e) = self.recorder.close_generation(end) {
            tracing::warn!(span = %self.name, "failed to close generation: {e}");
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.end();
    }
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Span")
            .field("name", &self.name)
            .field("generation_open", &self.generation_open)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}
