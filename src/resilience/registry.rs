//! Process-global circuit breaker registry (§5 "Shared-resource policy":
//! "the circuit breaker registry ... must use interior synchronization").

use crate::resilience::circuit_breaker::{predefined_config, CircuitBreaker, CircuitBreakerConfig};
use dashmap::DashMap;
use std::sync::Arc;

/// Keyed by service name; breakers are created lazily on first lookup
/// using the predefined configuration, or a caller-supplied one.
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named breaker, creating it from the predefined
    /// configuration (§4.10) on first access. Panics if the service name
    /// has neither a predefined configuration nor a prior registration --
    /// callers needing a custom config must use `register`.
    pub fn get_or_default(&self, service: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(service) {
            return Arc::clone(&existing);
        }
        let config = predefined_config(service).unwrap_or(CircuitBreakerConfig::new(5, 60));
        let breaker = Arc::new(CircuitBreaker::new(service, config));
        self.breakers.insert(service.to_string(), Arc::clone(&breaker));
        breaker
    }

    pub fn register(&self, service: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        let breaker = Arc::new(CircuitBreaker::new(service, config));
        self.breakers.insert(service.to_string(), Arc::clone(&breaker));
        breaker
    }

    /// Current state of every registered breaker, for the
    /// `scheduler_circuit_breaker_state{service}` gauge (§4.12).
    pub fn states(&self) -> Vec<(String, f64)> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().state().metric_value()))
            .collect()
    }
}
