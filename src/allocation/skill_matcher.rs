//! Skill matcher (C7, §4.6).

use crate::domain::value_objects::{ProficiencyLevel, SkillType};
use crate::domain::{Machine, Operator, OperatorStatus};
use chrono::NaiveDate;

/// Unmet skill requirement for a machine, with the operator's current
/// level if any (§4.6 `get_skill_gap_analysis`).
#[derive(Debug, Clone)]
pub struct SkillGap {
    pub skill: SkillType,
    pub required_level: ProficiencyLevel,
    pub current_level: Option<ProficiencyLevel>,
}

pub struct SkillMatcher;

impl SkillMatcher {
    /// Operators holding a valid, sufficiently-leveled certification for
    /// every skill the machine's capabilities require.
    pub fn find_qualified_operators<'a>(machine: &Machine, operators: &'a [Operator], date: NaiveDate) -> Vec<&'a Operator> {
        let required_skills: Vec<&SkillType> = machine
            .capabilities()
            .iter()
            .flat_map(|c| c.required_skills.iter())
            .collect();
        operators
            .iter()
            .filter(|op| {
                required_skills.iter().all(|skill| {
                    op.skills()
                        .get(skill)
                        .is_some_and(|cert| cert.is_valid_on(date))
                })
            })
            .collect()
    }

    /// Ranks qualified operators by `(is_available, max_level_among_required_skills)`
    /// descending, returning the best match if any.
    pub fn find_best_operator<'a>(machine: &Machine, operators: &'a [Operator], date: NaiveDate) -> Option<&'a Operator> {
        let required_skills: Vec<&SkillType> = machine
            .capabilities()
            .iter()
            .flat_map(|c| c.required_skills.iter())
            .collect();
        Self::find_qualified_operators(machine, operators, date)
            .into_iter()
            .max_by_key(|op| {
                let available = op.status == OperatorStatus::Available;
                let max_level = required_skills
                    .iter()
                    .filter_map(|s| op.skills().get(*s).map(|c| c.level.value()))
                    .max()
                    .unwrap_or(0);
                (available, max_level)
            })
    }

    /// Unmet requirements for `operator` against `machine`'s capability
    /// skill set, each with the operator's current level if they hold it.
    pub fn get_skill_gap_analysis(machine: &Machine, operator: &Operator, required_level: ProficiencyLevel, date: NaiveDate) -> Vec<SkillGap> {
        machine
            .capabilities()
            .iter()
            .flat_map(|c| c.required_skills.iter())
            .filter_map(|skill| {
                let current = operator
                    .skills()
                    .get(skill)
                    .filter(|cert| cert.is_valid_on(date))
                    .map(|cert| cert.level);
                let met = current.is_some_and(|level| level >= required_level);
                if met {
                    None
                } else {
                    Some(SkillGap {
                        skill: skill.clone(),
                        required_level,
                        current_level: current,
                    })
                }
            })
            .collect()
    }
}
