//! The CP model as pure data (§4.8), independent of any solver.

use crate::domain::value_objects::{BusinessCalendar, ProficiencyLevel, RoleRequirement, SkillType};
use crate::domain::{Job, JobId, Machine, MachineId, Operator, OperatorId, TaskId};
use crate::validation::{CriticalSequenceDefinition, ZoneDefinition};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A flattened view of one operator's skills, for the solver's role
/// matching; avoids handing the whole `Operator` aggregate to the solver.
#[derive(Debug, Clone)]
pub struct OperatorSummary {
    pub operator_id: OperatorId,
    pub department: String,
    pub skills: Vec<(SkillType, ProficiencyLevel)>,
}

/// One candidate (task, routing option) pair, with duration already
/// scaled by the machine's `efficiency_factor` (§4.8 "Variables").
#[derive(Debug, Clone)]
pub struct TaskOption {
    pub task_id: TaskId,
    pub job_id: JobId,
    pub sequence_in_job: u32,
    pub machine_id: MachineId,
    pub setup_minutes: i64,
    pub processing_minutes: i64,
    pub role_requirements: Vec<RoleRequirement>,
    pub attended: bool,
    pub department: Option<String>,
}

impl TaskOption {
    pub fn total_minutes(&self) -> i64 {
        self.setup_minutes + self.processing_minutes
    }
}

/// The variable/constraint/objective model built for one scheduling
/// request, handed to a `CpSolver` implementation.
#[derive(Debug, Clone)]
pub struct CpModel {
    pub horizon_minutes: i64,
    pub base_time: DateTime<Utc>,
    /// All qualifying task options, grouped by `task_id` via `options_for`.
    pub task_options: Vec<TaskOption>,
    /// `(predecessor_task_id, successor_task_id)` pairs, one per
    /// consecutive sequence pair within a job.
    pub precedence: Vec<(TaskId, TaskId)>,
    pub due_minutes: HashMap<JobId, i64>,
    pub job_priority_rank: HashMap<JobId, u8>,
    pub wip_zones: Vec<ZoneDefinition>,
    pub critical_sequences: Vec<CriticalSequenceDefinition>,
    pub w_primary: f64,
    pub calendar: BusinessCalendar,
    pub operators: Vec<OperatorSummary>,
    pub operator_cost_cents_per_minute: HashMap<OperatorId, i64>,
}

impl CpModel {
    pub fn options_for(&self, task_id: TaskId) -> impl Iterator<Item = &TaskOption> {
        self.task_options.iter().filter(move |o| o.task_id == task_id)
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut seen = Vec::new();
        for opt in &self.task_options {
            if !seen.contains(&opt.task_id) {
                seen.push(opt.task_id);
            }
        }
        seen
    }
}

/// Inputs to `ModelBuilder::build`: the scope of one scheduling request.
pub struct SchedulingRequest {
    pub job_ids: Vec<JobId>,
    pub horizon_days: u32,
    pub horizon_start: DateTime<Utc>,
    pub w_primary: f64,
    /// Operator cost rates, in cents per minute, when known (§4.8 objective
    /// "when available"). Operators absent from this map contribute 0 to
    /// `operator_cost`.
    pub operator_cost_cents_per_minute: HashMap<OperatorId, i64>,
}

/// Read-only view of the aggregates a model is built against.
pub struct Entities<'a> {
    pub jobs: &'a HashMap<JobId, Job>,
    pub machines: &'a HashMap<MachineId, Machine>,
    pub operators: &'a HashMap<OperatorId, Operator>,
}

pub struct ModelBuilder;

impl ModelBuilder {
    /// Flattens the requested jobs' tasks into qualifying task options and
    /// precedence edges, scaling each option's duration by the assigned
    /// machine's `efficiency_factor` (round half-to-even), per §4.8.
    pub fn build(request: &SchedulingRequest, entities: &Entities<'_>) -> CpModel {
        let horizon_minutes = request.horizon_days as i64 * 24 * 60;
        let mut task_options = Vec::new();
        let mut precedence = Vec::new();
        let mut due_minutes = HashMap::new();
        let mut job_priority_rank = HashMap::new();

        for job_id in &request.job_ids {
            let Some(job) = entities.jobs.get(job_id) else {
                continue;
            };
            due_minutes.insert(
                *job_id,
                (job.due_date - request.horizon_start).num_minutes(),
            );
            job_priority_rank.insert(*job_id, job.priority.rank());

            let tasks: Vec<_> = job.tasks().collect();
            for window in tasks.windows(2) {
                precedence.push((window[0].id, window[1].id));
            }

            for task in &tasks {
                for option in &task.machine_options {
                    let Some(machine) = entities.machines.get(&option.machine_id) else {
                        continue;
                    };
                    if !machine.can_perform(&task.operation_code) {
                        continue;
                    }
                    let setup = scale_by_efficiency(
                        option.setup_duration.to_minutes_round_half_even(),
                        machine.efficiency_factor,
                    );
                    let processing = scale_by_efficiency(
                        option.processing_duration.to_minutes_round_half_even(),
                        machine.efficiency_factor,
                    );
                    task_options.push(TaskOption {
                        task_id: task.id,
                        job_id: *job_id,
                        sequence_in_job: task.sequence_in_job,
                        machine_id: option.machine_id,
                        setup_minutes: setup,
                        processing_minutes: processing,
                        role_requirements: task.effective_role_requirements(),
                        attended: matches!(
                            machine.automation_level,
                            crate::domain::AutomationLevel::Attended
                        ),
                        department: task.department.clone(),
                    });
                }
            }
        }

        let operators = entities
            .operators
            .values()
            .filter(|op| op.is_active)
            .map(|op| OperatorSummary {
                operator_id: op.id,
                department: op.department.clone(),
                skills: op
                    .skills()
                    .iter()
                    .map(|(skill, cert)| (skill.clone(), cert.level))
                    .collect(),
            })
            .collect();

        CpModel {
            horizon_minutes,
            base_time: request.horizon_start,
            task_options,
            precedence,
            due_minutes,
            job_priority_rank,
            wip_zones: crate::validation::ValidationConfig::default().zones,
            critical_sequences: crate::validation::ValidationConfig::default().critical_sequences,
            w_primary: request.w_primary,
            calendar: BusinessCalendar::default_calendar(),
            operators,
            operator_cost_cents_per_minute: request.operator_cost_cents_per_minute.clone(),
        }
    }
}

/// Divide a minute count by the machine's efficiency (values above 1.0
/// make the machine faster), rounding half-to-even.
fn scale_by_efficiency(minutes: i64, efficiency_factor: f64) -> i64 {
    let scaled = minutes as f64 / efficiency_factor;
    let whole = scaled.trunc();
    let remainder = scaled - whole;
    let rounded = if (remainder.abs() - 0.5).abs() < 1e-9 {
        if (whole as i64) % 2 == 0 {
            whole
        } else {
            whole + remainder.signum()
        }
    } else {
        scaled.round()
    };
    rounded as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Duration, MachineOption};
    use crate::domain::{AutomationLevel, JobPriority, Machine, Task};

    fn machine(efficiency: f64, op_code: &str) -> Machine {
        let mut m = Machine::new(
            "M1".to_string(),
            "Mill".to_string(),
            AutomationLevel::Attended,
            None,
            efficiency,
        )
        .unwrap();
        m.add_capability(crate::domain::machine::MachineCapability {
            operation_code: op_code.to_string(),
            required_skills: vec![],
        })
        .unwrap();
        m
    }

    #[test]
    fn scale_by_efficiency_divides_and_rounds() {
        assert_eq!(scale_by_efficiency(100, 2.0), 50);
        assert_eq!(scale_by_efficiency(100, 1.0), 100);
    }

    #[test]
    fn build_flattens_qualifying_options_and_precedence() {
        let job_id = JobId::new();
        let mut job = Job::new(
            "J1".to_string(),
            "C".to_string(),
            "P".to_string(),
            1,
            JobPriority::Normal,
            Utc::now() + chrono::Duration::days(3),
            Utc::now(),
        )
        .unwrap();
        let m = machine(1.0, "GENERAL");
        for seq in 1..=2u32 {
            let task = Task::new(
                job.id,
                seq,
                vec![MachineOption {
                    machine_id: m.id,
                    setup_duration: Duration::from_minutes(10).unwrap(),
                    processing_duration: Duration::from_minutes(50).unwrap(),
                    requires_operator_full_duration: false,
                }],
            )
            .unwrap();
            job.add_task(task).unwrap();
        }
        let _ = job_id;

        let mut jobs = HashMap::new();
        let job_id = job.id;
        jobs.insert(job_id, job);
        let mut machines = HashMap::new();
        machines.insert(m.id, m);
        let operators = HashMap::new();

        let request = SchedulingRequest {
            job_ids: vec![job_id],
            horizon_days: 7,
            horizon_start: Utc::now(),
            w_primary: 2.0,
            operator_cost_cents_per_minute: HashMap::new(),
        };
        let entities = Entities {
            jobs: &jobs,
            machines: &machines,
            operators: &operators,
        };
        let model = ModelBuilder::build(&request, &entities);
        assert_eq!(model.task_options.len(), 2);
        assert_eq!(model.precedence.len(), 1);
        assert_eq!(model.task_options[0].total_minutes(), 60);
    }
}
