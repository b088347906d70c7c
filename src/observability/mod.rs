//! Observability contracts (C15, §4.12): metrics, structured logs, traces,
//! and the correlation id that threads through one scheduling request.

pub mod sinks;
pub mod tracing_impl;

pub use sinks::{Labels, LogLevel, LogRecord, LogSink, MetricsSink, NoopMetricsSink, TracingLogSink};
pub use tracing_impl::{CorrelationId, Span, Tracer, TracingTracer};
