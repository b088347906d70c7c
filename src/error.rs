//! Error taxonomy for the scheduler core.

use std::collections::HashMap;
use thiserror::Error;

/// Result type used throughout the scheduler core.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Stable discriminator for an error kind, independent of its message.
///
/// The out-of-scope API layer maps these onto HTTP-style statuses; the
/// core only guarantees this discriminator plus a serializable details map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    BusinessRule,
    ResourceConflict,
    ConstraintViolation,
    Optimization,
    Resilience,
    Concurrency,
}

/// Comprehensive error type for the scheduler core.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Invalid input shape or domain invariant violation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Entity lookup missed.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation forbidden in the aggregate's current state.
    #[error("business rule violated: {0}")]
    BusinessRule(String),

    /// Machine/operator double-booking detected at publish time.
    #[error("resource conflict: {0}")]
    ResourceConflict(String),

    /// A schedule failed independent constraint validation.
    #[error("constraint violations present: {count}")]
    ConstraintViolation { count: usize },

    /// No feasible solution, solver timeout/crash/memory exceeded, or bad config.
    #[error("optimization failed: {0}")]
    Optimization(String),

    /// Circuit-breaker-open, retry-exhausted, or system resource exhaustion.
    #[error("resilience failure: {0}")]
    Resilience(String),

    /// Optimistic-concurrency collision in a repository.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),
}

impl SchedulerError {
    /// Stable kind discriminator, independent of the message text.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::Validation(_) => ErrorKind::Validation,
            SchedulerError::NotFound { .. } => ErrorKind::NotFound,
            SchedulerError::BusinessRule(_) => ErrorKind::BusinessRule,
            SchedulerError::ResourceConflict(_) => ErrorKind::ResourceConflict,
            SchedulerError::ConstraintViolation { .. } => ErrorKind::ConstraintViolation,
            SchedulerError::Optimization(_) => ErrorKind::Optimization,
            SchedulerError::Resilience(_) => ErrorKind::Resilience,
            SchedulerError::Concurrency(_) => ErrorKind::Concurrency,
        }
    }

    /// Serializable details map for the caller-facing boundary.
    pub fn details(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), self.to_string());
        if let SchedulerError::NotFound { entity, id } = self {
            map.insert("entity".to_string(), entity.to_string());
            map.insert("id".to_string(), id.clone());
        }
        if let SchedulerError::ConstraintViolation { count } = self {
            map.insert("count".to_string(), count.to_string());
        }
        map
    }

    /// Whether this error kind is eligible for retry by default (§5, §7).
    ///
    /// Resilience (circuit-breaker-open) and Concurrency errors are
    /// non-retryable by default per the concurrency model.
    pub fn is_retryable_by_default(&self) -> bool {
        !matches!(
            self,
            SchedulerError::Resilience(_) | SchedulerError::Concurrency(_)
        )
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        SchedulerError::NotFound {
            entity,
            id: id.into(),
        }
    }
}
