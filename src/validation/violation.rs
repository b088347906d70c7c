//! Violation descriptors produced by the constraint validation service (§4.3).

use serde::{Deserialize, Serialize};

/// A single constraint violation, carrying a stable code and the entity
/// ids involved, independent of any particular message wording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub code: &'static str,
    pub message: String,
    pub entity_ids: Vec<String>,
}

impl Violation {
    pub fn new(code: &'static str, message: impl Into<String>, entity_ids: Vec<String>) -> Self {
        Self {
            code,
            message: message.into(),
            entity_ids,
        }
    }
}

pub const RESOURCE_DOUBLE_BOOKING: &str = "RESOURCE_DOUBLE_BOOKING";
pub const PRECEDENCE_VIOLATION: &str = "PRECEDENCE_VIOLATION";
pub const WIP_LIMIT_EXCEEDED: &str = "WIP_LIMIT_EXCEEDED";
pub const CRITICAL_SEQUENCE_OVERLAP: &str = "CRITICAL_SEQUENCE_OVERLAP";
pub const BUSINESS_HOURS_VIOLATION: &str = "BUSINESS_HOURS_VIOLATION";
pub const MACHINE_CAPABILITY_MISMATCH: &str = "MACHINE_CAPABILITY_MISMATCH";
pub const OPERATOR_SKILL_MISMATCH: &str = "OPERATOR_SKILL_MISMATCH";
pub const OPERATOR_COUNT_MISMATCH: &str = "OPERATOR_COUNT_MISMATCH";
