//! Observability contracts the core emits against but never implements a
//! backend for (§4.12, §6.1 "Observability sinks (injected)").

use std::collections::HashMap;

pub type Labels = HashMap<String, String>;

/// Counters, histograms, and gauges with stable names (§4.12 "Metrics").
pub trait MetricsSink: Send + Sync {
    fn increment_counter(&self, name: &str, labels: &Labels, value: u64);
    fn observe_histogram(&self, name: &str, labels: &Labels, value: f64);
    fn set_gauge(&self, name: &str, labels: &Labels, value: f64);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn increment_counter(&self, _name: &str, _labels: &Labels, _value: u64) {}
    fn observe_histogram(&self, _name: &str, _labels: &Labels, _value: f64) {}
    fn set_gauge(&self, _name: &str, _labels: &Labels, _value: f64) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One structured log record (§4.12 "Structured log records").
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub operation: String,
    pub correlation_id: String,
    pub fields: HashMap<String, String>,
}

pub trait LogSink: Send + Sync {
    fn record(&self, record: LogRecord);
}

/// Writes records to stdout via `tracing`, routed by level, so a caller
/// who never injects a sink still sees output through the same subscriber
/// the rest of the crate's spans go to.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn record(&self, record: LogRecord) {
        match record.level {
            LogLevel::Debug => tracing::debug!(
                operation = %record.operation,
                correlation_id = %record.correlation_id,
                fields = ?record.fields,
            ),
            LogLevel::Info => tracing::info!(
                operation = %record.operation,
                correlation_id = %record.correlation_id,
                fields = ?record.fields,
            ),
            LogLevel::Warn => tracing::warn!(
                operation = %record.operation,
                correlation_id = %record.correlation_id,
                fields = ?record.fields,
            ),
            LogLevel::Error => tracing::error!(
                operation = %record.operation,
                correlation_id = %record.correlation_id,
                fields = ?record.fields,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_any_call_without_panicking() {
        let sink = NoopMetricsSink;
        sink.increment_counter("scheduler_solver_solve_time_seconds", &Labels::new(), 1);
        sink.set_gauge("scheduler_circuit_breaker_state", &Labels::new(), 0.0);
    }

    #[test]
    fn tracing_log_sink_routes_by_level() {
        let sink = TracingLogSink;
        sink.record(LogRecord {
            level: LogLevel::Info,
            operation: "solve".to_string(),
            correlation_id: "cid-1".to_string(),
            fields: HashMap::new(),
        });
    }
}
