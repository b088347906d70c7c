//! Heuristic fallback schedulers and the reason-to-strategy orchestrator
//! (C12, §4.9).

pub mod orchestrator;
pub mod strategies;

pub use orchestrator::{FailureReason, FallbackOrchestrator};
pub use strategies::{FallbackInput, FallbackResult, FallbackStrategy};
