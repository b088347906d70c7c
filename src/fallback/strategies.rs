//! Heuristic fallback schedulers (C12, §4.9).
//!
//! Grounded on the resource allocation service's scoring shape
//! (`allocation::resource_allocator`) but simplified to the flat,
//! duration-agnostic placement the spec calls for: every fallback sorts
//! tasks or jobs by one key and assigns to the earliest-free resource.

use crate::domain::{Job, JobId, Machine, MachineId, Operator, OperatorId, TaskId};
use crate::optimization::solver::TaskAssignment;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
    Greedy,
    PriorityBased,
    EarliestDueDate,
    ShortestProcessingTime,
    PartialSolution,
}

impl std::fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FallbackStrategy::Greedy => "GREEDY",
            FallbackStrategy::PriorityBased => "PRIORITY_BASED",
            FallbackStrategy::EarliestDueDate => "EARLIEST_DUE_DATE",
            FallbackStrategy::ShortestProcessingTime => "SHORTEST_PROCESSING_TIME",
            FallbackStrategy::PartialSolution => "PARTIAL_SOLUTION",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct FallbackResult {
    pub schedule: Option<Vec<TaskAssignment>>,
    pub strategy: FallbackStrategy,
    pub reason: String,
    pub execution_time: std::time::Duration,
    pub quality_score: f64,
    pub makespan_minutes: i64,
    pub total_tardiness_minutes: i64,
    pub jobs_scheduled: usize,
    pub tasks_scheduled: usize,
    pub warnings: Vec<String>,
}

/// The default flat task duration fallbacks use in place of real machine
/// option durations (§4.9 "GREEDY ... default 60-minute duration").
const DEFAULT_TASK_MINUTES: i64 = 60;

pub struct FallbackInput<'a> {
    pub jobs: Vec<&'a Job>,
    pub machines: &'a HashMap<MachineId, Machine>,
    pub operators: &'a HashMap<OperatorId, Operator>,
    pub horizon_start: DateTime<Utc>,
    /// Pre-existing partial assignments to complete (PARTIAL_SOLUTION only).
    pub partial_assignments: Vec<TaskAssignment>,
}

struct PlacementCursors {
    machine: HashMap<MachineId, i64>,
    operator: HashMap<OperatorId, i64>,
}

impl PlacementCursors {
    fn new() -> Self {
        Self {
            machine: HashMap::new(),
            operator: HashMap::new(),
        }
    }

    fn earliest_machine(&self, candidates: &[MachineId]) -> Option<MachineId> {
        candidates
            .iter()
            .copied()
            .min_by_key(|m| self.machine.get(m).copied().unwrap_or(0))
    }

    fn earliest_operator(&self, candidates: &[OperatorId]) -> Option<OperatorId> {
        candidates
            .iter()
            .copied()
            .min_by_key(|o| self.operator.get(o).copied().unwrap_or(0))
    }
}

/// Places a flat list of `(job_id, task_id, machine_candidates)` in order,
/// using `DEFAULT_TASK_MINUTES` per task and the earliest-free machine;
/// assigns the single earliest-free active operator when any exist.
fn place_in_order(
    input: &FallbackInput<'_>,
    order: &[(JobId, TaskId, Vec<MachineId>)],
) -> Vec<TaskAssignment> {
    let mut cursors = PlacementCursors::new();
    let active_operators: Vec<OperatorId> = input
        .operators
        .values()
        .filter(|op| op.is_active)
        .map(|op| op.id)
        .collect();

    let mut assignments = Vec::new();
    for (job_id, task_id, candidates) in order {
        let Some(machine_id) = cursors.earliest_machine(candidates) else {
            continue;
        };
        let start_minutes = cursors.machine.get(&machine_id).copied().unwrap_or(0);
        let end_minutes = start_minutes + DEFAULT_TASK_MINUTES;
        cursors.machine.insert(machine_id, end_minutes);

        let operator_ids = if let Some(operator_id) = cursors.earliest_operator(&active_operators) {
            let op_start = cursors.operator.get(&operator_id).copied().unwrap_or(0);
            cursors
                .operator
                .insert(operator_id, op_start.max(end_minutes));
            vec![operator_id]
        } else {
            Vec::new()
        };

        assignments.push(TaskAssignment {
            task_id: *task_id,
            job_id: *job_id,
            machine_id,
            operator_ids,
            start: input.horizon_start + chrono::Duration::minutes(start_minutes),
            end: input.horizon_start + chrono::Duration::minutes(end_minutes),
        });
    }
    assignments
}

fn task_order(jobs: &[&Job]) -> Vec<(JobId, TaskId, Vec<MachineId>, u32)> {
    let mut order = Vec::new();
    for job in jobs {
        for task in job.tasks() {
            let candidates = task.machine_options.iter().map(|o| o.machine_id).collect();
            order.push((job.id, task.id, candidates, task.sequence_in_job));
        }
    }
    order
}

fn summarize(
    strategy: FallbackStrategy,
    reason: impl Into<String>,
    input: &FallbackInput<'_>,
    assignments: Vec<TaskAssignment>,
    execution_time: std::time::Duration,
) -> FallbackResult {
    let total_tasks: usize = input.jobs.iter().map(|j| j.tasks().count()).sum();
    let tasks_scheduled = assignments.len();
    let scheduled_jobs: std::collections::HashSet<_> = assignments.iter().map(|a| a.job_id).collect();
    let makespan_minutes = assignments
        .iter()
        .map(|a| (a.end - input.horizon_start).num_minutes())
        .max()
        .unwrap_or(0);

    let mut total_tardiness_minutes = 0i64;
    for job in &input.jobs {
        if let Some(completion) = assignments
            .iter()
            .filter(|a| a.job_id == job.id)
            .map(|a| a.end)
            .max()
        {
            total_tardiness_minutes += (completion - job.due_date).num_minutes().max(0);
        }
    }

    let completion_ratio = if total_tasks == 0 {
        0.0
    } else {
        tasks_scheduled as f64 / total_tasks as f64
    };
    let tardiness_fraction = (total_tardiness_minutes as f64 / (7.0 * 24.0 * 60.0)).min(1.0);
    let quality_score = completion_ratio * (1.0 - tardiness_fraction * 0.3);

    FallbackResult {
        schedule: if assignments.is_empty() { None } else { Some(assignments) },
        strategy,
        reason: reason.into(),
        execution_time,
        quality_score,
        makespan_minutes,
        total_tardiness_minutes,
        jobs_scheduled: scheduled_jobs.len(),
        tasks_scheduled,
        warnings: Vec::new(),
    }
}

/// Sorts by `(job_priority_rank, sequence_in_job)` and places greedily.
pub fn greedy(input: &FallbackInput<'_>, reason: impl Into<String>) -> FallbackResult {
    let started = std::time::Instant::now();
    let jobs_by_id: HashMap<JobId, &Job> = input.jobs.iter().map(|j| (j.id, *j)).collect();
    let mut order = task_order(&input.jobs);
    order.sort_by_key(|(job_id, _, _, seq)| {
        let rank = jobs_by_id.get(job_id).map(|j| j.priority.rank()).unwrap_or(2);
        (rank, *seq)
    });
    let flattened: Vec<_> = order.into_iter().map(|(j, t, m, _)| (j, t, m)).collect();
    let assignments = place_in_order(input, &flattened);
    summarize(FallbackStrategy::Greedy, reason, input, assignments, started.elapsed())
}

/// Sorts jobs by priority rank, then schedules each job's tasks in sequence.
pub fn priority_based(input: &FallbackInput<'_>, reason: impl Into<String>) -> FallbackResult {
    let started = std::time::Instant::now();
    let mut jobs = input.jobs.clone();
    jobs.sort_by_key(|j| j.priority.rank());
    let mut order = Vec::new();
    for job in &jobs {
        for task in job.tasks() {
            let candidates = task.machine_options.iter().map(|o| o.machine_id).collect();
            order.push((job.id, task.id, candidates));
        }
    }
    let assignments = place_in_order(input, &order);
    summarize(FallbackStrategy::PriorityBased, reason, input, assignments, started.elapsed())
}

/// Sorts jobs by due date ascending (no-due-date jobs would sort last, but
/// every `Job` has a mandatory due date per §3).
pub fn earliest_due_date(input: &FallbackInput<'_>, reason: impl Into<String>) -> FallbackResult {
    let started = std::time::Instant::now();
    let mut jobs = input.jobs.clone();
    jobs.sort_by_key(|j| j.due_date);
    let mut order = Vec::new();
    for job in &jobs {
        for task in job.tasks() {
            let candidates = task.machine_options.iter().map(|o| o.machine_id).collect();
            order.push((job.id, task.id, candidates));
        }
    }
    let assignments = place_in_order(input, &order);
    summarize(FallbackStrategy::EarliestDueDate, reason, input, assignments, started.elapsed())
}

/// Sorts tasks by their shortest routing option's total duration ascending.
pub fn shortest_processing_time(input: &FallbackInput<'_>, reason: impl Into<String>) -> FallbackResult {
    let started = std::time::Instant::now();
    let mut order: Vec<(JobId, TaskId, Vec<MachineId>, i64)> = Vec::new();
    for job in &input.jobs {
        for task in job.tasks() {
            let candidates = task.machine_options.iter().map(|o| o.machine_id).collect();
            let shortest = task
                .machine_options
                .iter()
                .map(|o| o.total_duration().to_minutes_round_half_even())
                .min()
                .unwrap_or(DEFAULT_TASK_MINUTES);
            order.push((job.id, task.id, candidates, shortest));
        }
    }
    order.sort_by_key(|(_, _, _, duration)| *duration);
    let flattened: Vec<_> = order.into_iter().map(|(j, t, m, _)| (j, t, m)).collect();
    let assignments = place_in_order(input, &flattened);
    summarize(
        FallbackStrategy::ShortestProcessingTime,
        reason,
        input,
        assignments,
        started.elapsed(),
    )
}

/// Completes whatever `input.partial_assignments` left unscheduled using
/// GREEDY, then boosts the quality score by x1.1 (capped at 1.0).
pub fn partial_solution(input: &FallbackInput<'_>, reason: impl Into<String>) -> FallbackResult {
    let started = std::time::Instant::now();
    let already_assigned: std::collections::HashSet<TaskId> =
        input.partial_assignments.iter().map(|a| a.task_id).collect();

    let jobs_by_id: HashMap<JobId, &Job> = input.jobs.iter().map(|j| (j.id, *j)).collect();
    let mut order = task_order(&input.jobs);
    order.retain(|(_, task_id, _, _)| !already_assigned.contains(task_id));
    order.sort_by_key(|(job_id, _, _, seq)| {
        let rank = jobs_by_id.get(job_id).map(|j| j.priority.rank()).unwrap_or(2);
        (rank, *seq)
    });
    let flattened: Vec<_> = order.into_iter().map(|(j, t, m, _)| (j, t, m)).collect();

    let mut assignments = input.partial_assignments.clone();
    assignments.extend(place_in_order(input, &flattened));

    let mut result = summarize(
        FallbackStrategy::PartialSolution,
        reason,
        input,
        assignments,
        started.elapsed(),
    );
    result.quality_score = (result.quality_score * 1.1).min(1.0);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Duration, MachineOption};
    use crate::domain::{AutomationLevel, JobPriority, Task};

    fn sample_input() -> (HashMap<MachineId, Machine>, HashMap<OperatorId, Operator>) {
        let mut machines = HashMap::new();
        let machine = Machine::new(
            "M1".to_string(),
            "Universal".to_string(),
            AutomationLevel::Unattended,
            None,
            1.0,
        )
        .unwrap();
        machines.insert(machine.id, machine);
        (machines, HashMap::new())
    }

    fn make_job(number: &str, priority: JobPriority, due_offset_days: i64, machine_id: MachineId) -> Job {
        let now = Utc::now();
        let mut job = Job::new(
            number.to_string(),
            "C".to_string(),
            "P".to_string(),
            1,
            priority,
            now + chrono::Duration::days(due_offset_days),
            now,
        )
        .unwrap();
        let task = Task::new(
            job.id,
            1,
            vec![MachineOption {
                machine_id,
                setup_duration: Duration::from_minutes(5).unwrap(),
                processing_duration: Duration::from_minutes(55).unwrap(),
                requires_operator_full_duration: false,
            }],
        )
        .unwrap();
        job.add_task(task).unwrap();
        job
    }

    #[test]
    fn greedy_schedules_every_task_once() {
        let (machines, operators) = sample_input();
        let machine_id = *machines.keys().next().unwrap();
        let job_a = make_job("A", JobPriority::Low, 5, machine_id);
        let job_b = make_job("B", JobPriority::Critical, 5, machine_id);
        let jobs = vec![&job_a, &job_b];
        let input = FallbackInput {
            jobs,
            machines: &machines,
            operators: &operators,
            horizon_start: Utc::now(),
            partial_assignments: vec![],
        };
        let result = greedy(&input, "NO_FEASIBLE_SOLUTION");
        assert_eq!(result.tasks_scheduled, 2);
        assert_eq!(result.jobs_scheduled, 2);
        assert!(result.quality_score > 0.0 && result.quality_score <= 1.0);
    }

    #[test]
    fn partial_solution_boosts_quality_and_keeps_existing_assignments() {
        let (machines, operators) = sample_input();
        let machine_id = *machines.keys().next().unwrap();
        let job_a = make_job("A", JobPriority::Normal, 5, machine_id);
        let jobs = vec![&job_a];
        let existing_task_id = job_a.tasks().next().unwrap().id;
        let existing = TaskAssignment {
            task_id: existing_task_id,
            job_id: job_a.id,
            machine_id,
            operator_ids: vec![],
            start: Utc::now(),
            end: Utc::now() + chrono::Duration::minutes(60),
        };
        let input = FallbackInput {
            jobs,
            machines: &machines,
            operators: &operators,
            horizon_start: Utc::now(),
            partial_assignments: vec![existing],
        };
        let result = partial_solution(&input, "SOLVER_TIMEOUT");
        assert_eq!(result.tasks_scheduled, 1);
        assert!(result.schedule.unwrap()[0].task_id == existing_task_id);
    }
}
