//! Resource allocation service (C6, §4.4): a non-optimal heuristic
//! alternative to the CP solver, used by fallback strategies and direct
//! `allocate_resources_for_job` calls.

use crate::domain::value_objects::TimeWindow;
use crate::domain::{Machine, MachineId, MachineStatus, Operator, OperatorId, OperatorStatus, Task};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Default)]
pub struct AllocatorOptions {
    pub load_balancing: bool,
    pub prefer_lowest_cost: bool,
}

/// Per-resource cost/load inputs the allocator needs but that live
/// outside the domain model proper (cost rate, current load).
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorCostAndLoad {
    pub cost_per_minute_cents: i64,
    pub concurrent_assignments: u32,
}

pub struct ResourceAllocator {
    pub options: AllocatorOptions,
}

impl ResourceAllocator {
    pub fn new(options: AllocatorOptions) -> Self {
        Self { options }
    }

    /// Machine selection score: base 10 if capable of the task's
    /// operation; +2x a speed multiplier above 1.0; +5 if the machine's
    /// attendedness matches the task's attendance requirement; +3x
    /// (1 - utilization) when load balancing is enabled (§4.4).
    pub fn score_machine(&self, machine: &Machine, task: &Task, task_is_attended: bool, utilization: f64) -> f64 {
        if !machine.can_perform(&task.operation_code) {
            return f64::MIN;
        }
        let mut score = 10.0;
        if machine.efficiency_factor > 1.0 {
            score += 2.0 * machine.efficiency_factor;
        }
        let machine_attended = machine.automation_level == crate::domain::AutomationLevel::Attended;
        if machine_attended == task_is_attended {
            score += 5.0;
        }
        if self.options.load_balancing {
            score += 3.0 * (1.0 - utilization.clamp(0.0, 1.0));
        }
        score
    }

    /// Operator score against one role requirement (§4.4).
    #[allow(clippy::too_many_arguments)]
    pub fn score_operator(
        &self,
        operator: &Operator,
        requirement: &crate::domain::value_objects::RoleRequirement,
        as_of: chrono::NaiveDate,
        cost_and_load: OperatorCostAndLoad,
        max_cost_per_minute_cents: i64,
    ) -> f64 {
        let Some(cert) = operator.skills().get(&requirement.skill_type) else {
            return f64::MIN;
        };
        if !cert.is_valid_on(as_of) || cert.level < requirement.minimum_level {
            return f64::MIN;
        }
        let mut score = 3.0 * cert.level.value() as f64;
        score += 2.0 * (cert.level.value() as i32 - requirement.minimum_level.value() as i32).max(0) as f64;
        if self.options.prefer_lowest_cost && max_cost_per_minute_cents > 0 {
            let ratio = (max_cost_per_minute_cents - cost_and_load.cost_per_minute_cents) as f64
                / max_cost_per_minute_cents as f64;
            score += 5.0 * ratio;
        }
        let highest_level = operator
            .skills()
            .values()
            .map(|c| c.level.value())
            .max()
            .unwrap_or(0);
        score += 1.0 * highest_level as f64;
        if cost_and_load.concurrent_assignments <= 1 {
            score += 2.0;
        }
        score
    }

    /// Filter machines by availability (status + the given window), sort by
    /// score descending, and return them in ranked order.
    pub fn rank_machines<'a>(
        &self,
        candidates: &'a [Machine],
        task: &Task,
        task_is_attended: bool,
        utilization_by_machine: &HashMap<MachineId, f64>,
        window: TimeWindow,
    ) -> Vec<&'a Machine> {
        let mut scored: Vec<(&Machine, f64)> = candidates
            .iter()
            .filter(|m| {
                m.status == MachineStatus::Available
                    && !m.is_under_maintenance(window.start)
                    && !m.is_under_maintenance(window.end)
            })
            .map(|m| {
                let util = utilization_by_machine.get(&m.id).copied().unwrap_or(0.0);
                (m, self.score_machine(m, task, task_is_attended, util))
            })
            .filter(|(_, score)| *score > f64::MIN)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(m, _)| m).collect()
    }

    /// Rank operators against one role requirement, filtered to those
    /// available on `date` and not in `excluded`.
    pub fn rank_operators<'a>(
        &self,
        candidates: &'a [Operator],
        requirement: &crate::domain::value_objects::RoleRequirement,
        date: chrono::NaiveDate,
        excluded: &HashSet<OperatorId>,
        loads: &HashMap<OperatorId, OperatorCostAndLoad>,
    ) -> Vec<&'a Operator> {
        let max_cost = loads
            .values()
            .map(|l| l.cost_per_minute_cents)
            .max()
            .unwrap_or(0);
        let mut scored: Vec<(&Operator, f64)> = candidates
            .iter()
            .filter(|o| {
                o.status == OperatorStatus::Available && o.is_available_on(date) && !excluded.contains(&o.id)
            })
            .map(|o| {
                let load = loads.get(&o.id).copied().unwrap_or_default();
                (o, self.score_operator(o, requirement, date, load, max_cost))
            })
            .filter(|(_, score)| *score > f64::MIN)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(o, _)| o).collect()
    }

    /// Per-resource availability booleans for a time window (§4.4
    /// `validate_resource_availability`).
    pub fn validate_resource_availability(
        &self,
        machines: &[Machine],
        operators: &[Operator],
        window: TimeWindow,
    ) -> (HashMap<MachineId, bool>, HashMap<OperatorId, bool>) {
        let machine_avail = machines
            .iter()
            .map(|m| {
                let ok = m.status == MachineStatus::Available
                    && !m.is_under_maintenance(window.start)
                    && !m.is_under_maintenance(window.end);
                (m.id, ok)
            })
            .collect();
        let operator_avail = operators
            .iter()
            .map(|o| (o.id, o.is_available_on(window.start.date_naive())))
            .collect();
        (machine_avail, operator_avail)
    }
}
