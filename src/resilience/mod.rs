//! Timeouts, memory limits, circuit breakers, retry, and graceful
//! degradation (C11, C13, C14; §4.10, §4.11, §5).

pub mod circuit_breaker;
pub mod degradation;
pub mod registry;
pub mod resource_manager;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use degradation::{DegradationLevel, DegradedResult, QualityAssessment, QualityAssessor, QualitySignals};
pub use registry::CircuitBreakerRegistry;
pub use resource_manager::{ManagedSolverOutcome, ResourceManagerConfig, SolverResourceManager};
pub use retry::{BackoffStrategy, RetryConfig, RetryEngine, RetrySession};
