//! Per-service circuit breaker (§4.10).
//!
//! Grounded on the teacher's `resilience::circuit_breaker::CircuitBreaker`,
//! generalized from a single hardcoded breaker to a named, registry-held
//! instance. This type itself stays free of observability dependencies;
//! the state-change events and the `scheduler_circuit_breaker_state`
//! gauge (`CircuitState::metric_value`, `CircuitBreakerRegistry::states`)
//! are emitted by the caller that owns the sinks, mirroring how retry
//! sessions are logged at the call site rather than inside `RetryEngine`.

use crate::error::{SchedulerError, SchedulerResult};
use parking_lot::RwLock;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// The gauge value published for `scheduler_circuit_breaker_state{service}` (§4.12).
    pub fn metric_value(&self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 0.5,
            CircuitState::Open => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

impl CircuitBreakerConfig {
    pub const fn new(failure_threshold: u32, recovery_timeout_secs: u64) -> Self {
        Self {
            failure_threshold,
            recovery_timeout: Duration::from_secs(recovery_timeout_secs),
        }
    }
}

/// The six predefined configurations of §4.10, keyed by service name.
pub fn predefined_config(service: &str) -> Option<CircuitBreakerConfig> {
    match service {
        "database" => Some(CircuitBreakerConfig::new(3, 30)),
        "external_api" => Some(CircuitBreakerConfig::new(5, 60)),
        "solver" => Some(CircuitBreakerConfig::new(2, 120)),
        "solver_optimization" => Some(CircuitBreakerConfig::new(2, 300)),
        "solver_memory" => Some(CircuitBreakerConfig::new(1, 600)),
        "solver_model_creation" => Some(CircuitBreakerConfig::new(3, 60)),
        _ => None,
    }
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// One named service's circuit: `CLOSED -> OPEN` after `failure_threshold`
/// consecutive failures, `OPEN -> HALF_OPEN` after `recovery_timeout`
/// elapses, admitting exactly one trial call.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: RwLock<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: RwLock::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner.read().state
    }

    /// Runs `operation` under this breaker's protection. Fails fast with
    /// `SchedulerError::Resilience` while OPEN and the recovery timeout has
    /// not elapsed.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> SchedulerResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SchedulerResult<T>>,
    {
        {
            let mut inner = self.inner.write();
            if inner.state == CircuitState::Open {
                let elapsed = inner.opened_at.map(|at| at.elapsed()).unwrap_or_default();
                if elapsed >= self.config.recovery_timeout {
                    inner.state = CircuitState::HalfOpen;
                } else {
                    return Err(SchedulerError::Resilience(format!(
                        "circuit breaker '{}' is open",
                        self.name
                    )));
                }
            }
        }

        match operation().await {
            Ok(value) => {
                let mut inner = self.inner.write();
                inner.consecutive_failures = 0;
                inner.state = CircuitState::Closed;
                inner.opened_at = None;
                Ok(value)
            }
            Err(err) => {
                let mut inner = self.inner.write();
                inner.consecutive_failures += 1;
                if inner.state == CircuitState::HalfOpen
                    || inner.consecutive_failures >= self.config.failure_threshold
                {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
                Err(err)
            }
        }
    }
}
