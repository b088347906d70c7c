//! Constraint-programming production scheduler with resilient fallback
//! execution: CP-based assignment of multi-operation jobs to machines and
//! operators over a planning horizon, wrapped in timeouts, circuit
//! breakers, retries, and graceful degradation.

pub mod allocation;
pub mod clock;
pub mod concurrency;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod observability;
pub mod optimization;
pub mod repository;
pub mod resilience;
pub mod scheduling_service;
pub mod validation;
pub mod workflow;

pub use error::{ErrorKind, SchedulerError, SchedulerResult};
pub use scheduling_service::{
    OptimizationResult, OptimizationStatus, ScheduleRequest, ScheduleService, ScheduleServiceConfig,
    SchedulingMetrics, SchedulingResult,
};
