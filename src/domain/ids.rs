//! Opaque 128-bit identifiers for every aggregate (§3 "Identifiers").
//!
//! Grounded on the teacher's `CaseId` (`case.rs`): a UUID newtype with
//! compact serde representation, `Display`, and a fallible string parser.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! opaque_id {
    ($name:ident, $entity:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "uuid::serde::compact")] pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from its string form.
            pub fn parse_str(s: &str) -> crate::error::SchedulerResult<Self> {
                Uuid::parse_str(s).map(Self).map_err(|e| {
                    crate::error::SchedulerError::Validation(format!(
                        "invalid {} id {:?}: {}",
                        $entity, s, e
                    ))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

opaque_id!(JobId, "job");
opaque_id!(TaskId, "task");
opaque_id!(MachineId, "machine");
opaque_id!(OperatorId, "operator");
opaque_id!(ScheduleId, "schedule");
opaque_id!(ZoneId, "production zone");
