//! Skill, proficiency levels, and the `RoleRequirement` value object (§3, §4.1).

use serde::{Deserialize, Serialize};

/// A skill/operation category an operator can be certified in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillType(pub String);

impl SkillType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for SkillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proficiency level, 1 (basic) through 3 (expert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProficiencyLevel(u8);

impl ProficiencyLevel {
    pub fn new(level: u8) -> crate::error::SchedulerResult<Self> {
        if !(1..=3).contains(&level) {
            return Err(crate::error::SchedulerError::Validation(format!(
                "proficiency level must be in 1..=3, got {level}"
            )));
        }
        Ok(Self(level))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Whether an operator role is required only during setup, or for the
/// full task duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attendance {
    SetupOnly,
    FullDuration,
}

/// A skilled-operator slot required on a task (§3 `RoleRequirement`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRequirement {
    pub skill_type: SkillType,
    pub minimum_level: ProficiencyLevel,
    pub count: u32,
    pub attendance: Attendance,
}

impl RoleRequirement {
    pub fn new(
        skill_type: SkillType,
        minimum_level: ProficiencyLevel,
        count: u32,
        attendance: Attendance,
    ) -> crate::error::SchedulerResult<Self> {
        if count == 0 {
            return Err(crate::error::SchedulerError::Validation(
                "role requirement count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            skill_type,
            minimum_level,
            count,
            attendance,
        })
    }
}
