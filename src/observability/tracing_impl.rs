//! `Tracer` contract plus a `tracing`-backed default implementation, and
//! the correlation id that flows through one scheduling request (§4.12).

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single trace span handle, closed by dropping it or calling `close`.
pub trait Span: Send {
    fn set_attribute(&mut self, key: &str, value: &str);
    fn record_exception(&mut self, message: &str);
    fn close(self: Box<Self>);
}

pub trait Tracer: Send + Sync {
    fn start_span(&self, name: &str, correlation_id: CorrelationId) -> Box<dyn Span>;
}

struct TracingSpan {
    span: tracing::Span,
    _entered_guard: Option<tracing::span::EnteredSpan>,
}

impl Span for TracingSpan {
    fn set_attribute(&mut self, key: &str, value: &str) {
        self.span.record(key, tracing::field::display(value.to_string()));
    }

    fn record_exception(&mut self, message: &str) {
        tracing::error!(parent: &self.span, exception = %message);
    }

    fn close(self: Box<Self>) {
        drop(self);
    }
}

/// Default `Tracer` backed by the `tracing` crate; the core never talks to
/// a trace-collection backend directly, only to whatever subscriber the
/// host process installs (§4.12).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTracer;

impl Tracer for TracingTracer {
    fn start_span(&self, name: &str, correlation_id: CorrelationId) -> Box<dyn Span> {
        let span = tracing::info_span!("scheduler_operation", operation = %name, correlation_id = %correlation_id);
        let entered = span.clone().entered();
        Box::new(TracingSpan {
            span,
            _entered_guard: Some(entered),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_distinct() {
        assert_ne!(CorrelationId::new(), CorrelationId::new());
    }

    #[test]
    fn tracing_tracer_produces_closable_span() {
        let tracer = TracingTracer;
        let mut span = tracer.start_span("solve", CorrelationId::new());
        span.set_attribute("status", "optimal");
        span.close();
    }
}
