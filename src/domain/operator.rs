//! The `Operator` entity (§3, §4.1).

use crate::domain::value_objects::{ProficiencyLevel, SkillType};
use crate::domain::ids::OperatorId;
use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorStatus {
    Available,
    Assigned,
    OnBreak,
    OffShift,
    Absent,
}

/// A single skill certification held by an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCertification {
    pub level: ProficiencyLevel,
    pub certified_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
}

impl SkillCertification {
    pub fn new(
        level: ProficiencyLevel,
        certified_date: NaiveDate,
        expiry_date: Option<NaiveDate>,
    ) -> SchedulerResult<Self> {
        if let Some(expiry) = expiry_date {
            if expiry <= certified_date {
                return Err(SchedulerError::Validation(
                    "skill expiry_date must be after certified_date".to_string(),
                ));
            }
        }
        Ok(Self {
            level,
            certified_date,
            expiry_date,
        })
    }

    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        date >= self.certified_date && self.expiry_date.map_or(true, |e| date < e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// A per-date exception to an operator's default working hours (leave,
/// overtime, shift swap).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AvailabilityOverride {
    Unavailable,
    Hours(WorkingHours),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub contact_email: Option<String>,
    pub status: OperatorStatus,
    pub default_hours: WorkingHours,
    skills: HashMap<SkillType, SkillCertification>,
    availability_overrides: HashMap<NaiveDate, AvailabilityOverride>,
    pub is_active: bool,
    pub hire_date: NaiveDate,
}

impl Operator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        employee_id: String,
        first_name: String,
        last_name: String,
        department: String,
        default_hours: WorkingHours,
        hire_date: NaiveDate,
    ) -> SchedulerResult<Self> {
        if employee_id.trim().is_empty() {
            return Err(SchedulerError::Validation(
                "employee_id must not be empty".to_string(),
            ));
        }
        if default_hours.end <= default_hours.start {
            return Err(SchedulerError::Validation(
                "default working hours end must be after start".to_string(),
            ));
        }
        Ok(Self {
            id: OperatorId::new(),
            employee_id,
            first_name,
            last_name,
            department,
            contact_email: None,
            status: OperatorStatus::Available,
            default_hours,
            skills: HashMap::new(),
            availability_overrides: HashMap::new(),
            is_active: true,
            hire_date,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn skills(&self) -> &HashMap<SkillType, SkillCertification> {
        &self.skills
    }

    pub fn add_skill(&mut self, skill: SkillType, certification: SkillCertification) {
        self.skills.insert(skill, certification);
    }

    /// Whether this operator holds `skill` at or above `minimum_level`,
    /// valid as of `date` (§4.3 operator-skill constraint check).
    pub fn has_skill_at(&self, skill: &SkillType, minimum_level: ProficiencyLevel, date: NaiveDate) -> bool {
        self.skills
            .get(skill)
            .is_some_and(|cert| cert.level >= minimum_level && cert.is_valid_on(date))
    }

    pub fn set_availability_override(&mut self, date: NaiveDate, override_: AvailabilityOverride) {
        self.availability_overrides.insert(date, override_);
    }

    /// Working hours in effect on `date`: an override if one exists for
    /// that date, otherwise the operator's default hours.
    pub fn hours_on(&self, date: NaiveDate) -> Option<WorkingHours> {
        match self.availability_overrides.get(&date) {
            Some(AvailabilityOverride::Unavailable) => None,
            Some(AvailabilityOverride::Hours(hours)) => Some(*hours),
            None => Some(self.default_hours),
        }
    }

    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.hours_on(date).is_some()
    }
}
