//! Constraint validation service (C5, §4.3).

pub mod service;
pub mod violation;

pub use service::{CheckToggles, ConstraintValidationService, CriticalSequenceDefinition, ValidationConfig, ZoneDefinition};
pub use violation::Violation;
