//! Constraint validation service (C5, §4.3).
//!
//! Produces an ordered list of violation descriptors for a schedule,
//! independent of the solver that produced it. Each check class can be
//! independently enabled/disabled.

use super::violation::{
    Violation, BUSINESS_HOURS_VIOLATION, CRITICAL_SEQUENCE_OVERLAP, MACHINE_CAPABILITY_MISMATCH,
    OPERATOR_COUNT_MISMATCH, OPERATOR_SKILL_MISMATCH, PRECEDENCE_VIOLATION,
    RESOURCE_DOUBLE_BOOKING, WIP_LIMIT_EXCEEDED,
};
use crate::clock::Clock;
use crate::domain::value_objects::BusinessCalendar;
use crate::domain::{AutomationLevel, Job, Machine, MachineId, Operator, OperatorId, Schedule, Task};
use std::collections::HashMap;
use std::sync::Arc;

/// A configurable WIP zone (§3 `ProductionZone`, §4.3 item 3).
#[derive(Debug, Clone)]
pub struct ZoneDefinition {
    pub name: String,
    pub start_seq: u32,
    pub end_seq: u32,
    pub max_jobs: u32,
}

/// A configurable critical sequence range (§4.3 item 4).
#[derive(Debug, Clone)]
pub struct CriticalSequenceDefinition {
    pub name: String,
    pub start_seq: u32,
    pub end_seq: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CheckToggles {
    pub resource_non_overlap: bool,
    pub precedence: bool,
    pub wip_zones: bool,
    pub critical_sequences: bool,
    pub business_hours: bool,
    pub machine_capability: bool,
    pub operator_skills: bool,
    pub operator_count: bool,
}

impl Default for CheckToggles {
    fn default() -> Self {
        Self {
            resource_non_overlap: true,
            precedence: true,
            wip_zones: true,
            critical_sequences: true,
            business_hours: true,
            machine_capability: true,
            operator_skills: true,
            operator_count: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub zones: Vec<ZoneDefinition>,
    pub critical_sequences: Vec<CriticalSequenceDefinition>,
    pub toggles: CheckToggles,
}

impl Default for ValidationConfig {
    /// Default zones `(0,30,3)`, `(31,60,2)`, `(61,99,3)` and four
    /// critical sequence ranges, per §4.3 item 3/4.
    fn default() -> Self {
        Self {
            zones: vec![
                ZoneDefinition { name: "zone-a".to_string(), start_seq: 0, end_seq: 30, max_jobs: 3 },
                ZoneDefinition { name: "zone-b".to_string(), start_seq: 31, end_seq: 60, max_jobs: 2 },
                ZoneDefinition { name: "zone-c".to_string(), start_seq: 61, end_seq: 99, max_jobs: 3 },
            ],
            critical_sequences: vec![
                CriticalSequenceDefinition { name: "critical-1".to_string(), start_seq: 1, end_seq: 5 },
                CriticalSequenceDefinition { name: "critical-2".to_string(), start_seq: 20, end_seq: 25 },
                CriticalSequenceDefinition { name: "critical-3".to_string(), start_seq: 45, end_seq: 50 },
                CriticalSequenceDefinition { name: "critical-4".to_string(), start_seq: 80, end_seq: 85 },
            ],
            toggles: CheckToggles::default(),
        }
    }
}

pub struct ConstraintValidationService {
    config: ValidationConfig,
    calendar: BusinessCalendar,
    clock: Arc<dyn Clock>,
}

impl ConstraintValidationService {
    pub fn new(config: ValidationConfig, calendar: BusinessCalendar, clock: Arc<dyn Clock>) -> Self {
        Self { config, calendar, clock }
    }

    /// Run every enabled check and return the ordered violations found.
    pub fn validate(
        &self,
        schedule: &Schedule,
        jobs: &HashMap<crate::domain::JobId, Job>,
        tasks: &HashMap<crate::domain::TaskId, Task>,
        machines: &HashMap<MachineId, Machine>,
        operators: &HashMap<OperatorId, Operator>,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.config.toggles.resource_non_overlap {
            self.check_resource_non_overlap(schedule, &mut violations);
        }
        if self.config.toggles.precedence {
            self.check_precedence(schedule, jobs, &mut violations);
        }
        if self.config.toggles.wip_zones {
            self.check_wip_zones(schedule, tasks, &mut violations);
        }
        if self.config.toggles.critical_sequences {
            self.check_critical_sequences(schedule, tasks, &mut violations);
        }
        if self.config.toggles.business_hours {
            self.check_business_hours(schedule, machines, &mut violations);
        }
        if self.config.toggles.machine_capability {
            self.check_machine_capability(schedule, tasks, machines, &mut violations);
        }
        if self.config.toggles.operator_skills {
            self.check_operator_skills(schedule, tasks, operators, &mut violations);
        }
        if self.config.toggles.operator_count {
            self.check_operator_count(schedule, tasks, &mut violations);
        }
        violations
    }

    fn check_resource_non_overlap(&self, schedule: &Schedule, out: &mut Vec<Violation>) {
        let assignments: Vec<_> = schedule.assignments().collect();
        for i in 0..assignments.len() {
            for j in (i + 1)..assignments.len() {
                let a = assignments[i];
                let b = assignments[j];
                if !a.window.overlaps(&b.window) {
                    continue;
                }
                if a.machine_id == b.machine_id {
                    out.push(Violation::new(
                        RESOURCE_DOUBLE_BOOKING,
                        format!("machine {} double-booked", a.machine_id),
                        vec![a.task_id.to_string(), b.task_id.to_string(), a.machine_id.to_string()],
                    ));
                }
                for op in a.operator_ids.iter().filter(|o| b.operator_ids.contains(o)) {
                    out.push(Violation::new(
                        RESOURCE_DOUBLE_BOOKING,
                        format!("operator {op} double-booked"),
                        vec![a.task_id.to_string(), b.task_id.to_string(), op.to_string()],
                    ));
                }
            }
        }
    }

    /// Checks each job's own declared sequence, not the separately-passed
    /// `tasks` map: `Job::tasks` is the authoritative source for a job's
    /// task ordering.
    fn check_precedence(
        &self,
        schedule: &Schedule,
        jobs: &HashMap<crate::domain::JobId, Job>,
        out: &mut Vec<Violation>,
    ) {
        for job in jobs.values() {
            let mut in_job: Vec<&Task> = job.tasks().collect();
            in_job.sort_by_key(|t| t.sequence_in_job);
            for pair in in_job.windows(2) {
                let (pred, succ) = (pair[0], pair[1]);
                let (Some(pred_assign), Some(succ_assign)) =
                    (schedule.assignment_for(pred.id), schedule.assignment_for(succ.id))
                else {
                    continue;
                };
                if succ_assign.window.start < pred_assign.window.end {
                    out.push(Violation::new(
                        PRECEDENCE_VIOLATION,
                        format!(
                            "task {} starts before predecessor task {} ends",
                            succ.id, pred.id
                        ),
                        vec![pred.id.to_string(), succ.id.to_string()],
                    ));
                }
            }
        }
    }

    fn check_wip_zones(&self, schedule: &Schedule, tasks: &HashMap<crate::domain::TaskId, Task>, out: &mut Vec<Violation>) {
        for zone in &self.config.zones {
            let occupying: std::collections::HashSet<_> = schedule
                .assignments()
                .filter_map(|a| tasks.get(&a.task_id))
                .filter(|t| t.sequence_in_job >= zone.start_seq && t.sequence_in_job <= zone.end_seq)
                .map(|t| t.job_id)
                .collect();
            if occupying.len() as u32 > zone.max_jobs {
                out.push(Violation::new(
                    WIP_LIMIT_EXCEEDED,
                    format!(
                        "zone {} has {} jobs occupying, limit {}",
                        zone.name,
                        occupying.len(),
                        zone.max_jobs
                    ),
                    occupying.iter().map(|j| j.to_string()).collect(),
                ));
            }
        }
    }

    fn check_critical_sequences(
        &self,
        schedule: &Schedule,
        tasks: &HashMap<crate::domain::TaskId, Task>,
        out: &mut Vec<Violation>,
    ) {
        for range in &self.config.critical_sequences {
            // For each job, the span of its in-range assignments.
            let mut spans: HashMap<crate::domain::JobId, (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> = HashMap::new();
            for assignment in schedule.assignments() {
                let Some(task) = tasks.get(&assignment.task_id) else { continue };
                if task.sequence_in_job < range.start_seq || task.sequence_in_job > range.end_seq {
                    continue;
                }
                spans
                    .entry(task.job_id)
                    .and_modify(|(start, end)| {
                        *start = (*start).min(assignment.window.start);
                        *end = (*end).max(assignment.window.end);
                    })
                    .or_insert((assignment.window.start, assignment.window.end));
            }
            let entries: Vec<_> = spans.into_iter().collect();
            for i in 0..entries.len() {
                for j in (i + 1)..entries.len() {
                    let (job_a, (start_a, end_a)) = entries[i];
                    let (job_b, (start_b, end_b)) = entries[j];
                    if start_a < end_b && start_b < end_a {
                        out.push(Violation::new(
                            CRITICAL_SEQUENCE_OVERLAP,
                            format!("critical sequence {} overlapped by jobs {} and {}", range.name, job_a, job_b),
                            vec![job_a.to_string(), job_b.to_string()],
                        ));
                    }
                }
            }
        }
    }

    fn check_business_hours(&self, schedule: &Schedule, machines: &HashMap<MachineId, Machine>, out: &mut Vec<Violation>) {
        for assignment in schedule.assignments() {
            let Some(machine) = machines.get(&assignment.machine_id) else { continue };
            if machine.automation_level != AutomationLevel::Attended {
                continue;
            }
            if !self
                .calendar
                .is_working_interval(assignment.window.start, assignment.window.end)
            {
                out.push(Violation::new(
                    BUSINESS_HOURS_VIOLATION,
                    format!("task {} scheduled outside business hours", assignment.task_id),
                    vec![assignment.task_id.to_string()],
                ));
            }
        }
    }

    fn check_machine_capability(
        &self,
        schedule: &Schedule,
        tasks: &HashMap<crate::domain::TaskId, Task>,
        machines: &HashMap<MachineId, Machine>,
        out: &mut Vec<Violation>,
    ) {
        for assignment in schedule.assignments() {
            let (Some(task), Some(machine)) =
                (tasks.get(&assignment.task_id), machines.get(&assignment.machine_id))
            else {
                continue;
            };
            if !machine.can_perform(&task.operation_code) {
                out.push(Violation::new(
                    MACHINE_CAPABILITY_MISMATCH,
                    format!(
                        "machine {} lacks capability for operation {}",
                        machine.code, task.operation_code
                    ),
                    vec![task.id.to_string(), machine.id.to_string()],
                ));
            }
        }
    }

    fn check_operator_skills(
        &self,
        schedule: &Schedule,
        tasks: &HashMap<crate::domain::TaskId, Task>,
        operators: &HashMap<OperatorId, Operator>,
        out: &mut Vec<Violation>,
    ) {
        let today = self.clock.now().date_naive();
        for assignment in schedule.assignments() {
            let Some(task) = tasks.get(&assignment.task_id) else { continue };
            for requirement in task.effective_role_requirements() {
                let filled = assignment.operator_ids.iter().any(|id| {
                    operators.get(id).is_some_and(|op| {
                        (task.department.is_none() || task.department.as_deref() == Some(op.department.as_str()))
                            && op.has_skill_at(&requirement.skill_type, requirement.minimum_level, today)
                    })
                });
                if !filled {
                    out.push(Violation::new(
                        OPERATOR_SKILL_MISMATCH,
                        format!(
                            "task {} has no assigned operator meeting skill {}",
                            task.id, requirement.skill_type
                        ),
                        vec![task.id.to_string()],
                    ));
                }
            }
        }
    }

    fn check_operator_count(&self, schedule: &Schedule, tasks: &HashMap<crate::domain::TaskId, Task>, out: &mut Vec<Violation>) {
        for assignment in schedule.assignments() {
            let Some(task) = tasks.get(&assignment.task_id) else { continue };
            let required: u32 = task.effective_role_requirements().iter().map(|r| r.count).sum();
            let assigned = assignment.operator_ids.len() as u32;
            let mut seen = std::collections::HashSet::new();
            let has_duplicates = !assignment.operator_ids.iter().all(|id| seen.insert(*id));
            if assigned != required || has_duplicates {
                out.push(Violation::new(
                    OPERATOR_COUNT_MISMATCH,
                    format!(
                        "task {} expects {} operators, has {} (duplicates: {})",
                        task.id, required, assigned, has_duplicates
                    ),
                    vec![task.id.to_string()],
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::domain::value_objects::{Duration, MachineOption, TimeWindow};
    use crate::domain::{AutomationLevel, Job, JobPriority, MachineStatus, Schedule, ScheduleAssignment};
    use chrono::TimeZone;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn detects_precedence_violation_scenario_s2() {
        let mut job = Job::new(
            "JOB-S2".to_string(),
            "ACME".to_string(),
            "PN".to_string(),
            1,
            JobPriority::Normal,
            dt(2024, 1, 2, 16, 0),
            dt(2024, 1, 1, 0, 0),
        )
        .unwrap();
        let machine_id = MachineId::new();
        let opt = |minutes: i64| MachineOption {
            machine_id,
            setup_duration: Duration::ZERO,
            processing_duration: Duration::from_minutes(minutes).unwrap(),
            requires_operator_full_duration: false,
        };
        let task_a = Task::new(job.id, 1, vec![opt(60)]).unwrap();
        let task_b = Task::new(job.id, 2, vec![opt(30)]).unwrap();
        let (task_a_id, task_b_id) = (task_a.id, task_b.id);
        job.add_task(task_a).unwrap();
        job.add_task(task_b).unwrap();

        let horizon = TimeWindow::new(dt(2024, 1, 1, 7, 0), dt(2024, 1, 1, 16, 0)).unwrap();
        let mut schedule = Schedule::new("s2".to_string(), horizon, dt(2024, 1, 1, 0, 0));
        schedule
            .upsert_assignment(ScheduleAssignment {
                task_id: task_a_id,
                job_id: job.id,
                machine_id,
                operator_ids: vec![],
                window: TimeWindow::new(dt(2024, 1, 1, 7, 0), dt(2024, 1, 1, 8, 0)).unwrap(),
            })
            .unwrap();
        // B starts before A completes.
        schedule
            .upsert_assignment(ScheduleAssignment {
                task_id: task_b_id,
                job_id: job.id,
                machine_id: MachineId::new(),
                operator_ids: vec![],
                window: TimeWindow::new(dt(2024, 1, 1, 7, 30), dt(2024, 1, 1, 8, 0)).unwrap(),
            })
            .unwrap();

        let mut jobs = HashMap::new();
        jobs.insert(job.id, job.clone());
        let mut tasks = HashMap::new();
        for t in job.tasks() {
            tasks.insert(t.id, t.clone());
        }

        let service = ConstraintValidationService::new(
            ValidationConfig::default(),
            BusinessCalendar::default_calendar(),
            Arc::new(SystemClock),
        );
        let violations = service.validate(&schedule, &jobs, &tasks, &HashMap::new(), &HashMap::new());
        let precedence: Vec<_> = violations.iter().filter(|v| v.code == PRECEDENCE_VIOLATION).collect();
        assert_eq!(precedence.len(), 1);
    }

    #[test]
    fn detects_wip_limit_exceeded_scenario_s3() {
        let config = ValidationConfig {
            zones: vec![ZoneDefinition { name: "z".to_string(), start_seq: 0, end_seq: 30, max_jobs: 1 }],
            critical_sequences: vec![],
            toggles: CheckToggles { wip_zones: true, ..CheckToggles::default() },
        };
        let horizon = TimeWindow::new(dt(2024, 1, 1, 7, 0), dt(2024, 1, 1, 16, 0)).unwrap();
        let mut schedule = Schedule::new("s3".to_string(), horizon, dt(2024, 1, 1, 0, 0));

        let mut tasks = HashMap::new();
        for _ in 0..2 {
            let job_id = crate::domain::JobId::new();
            let task = Task::new(
                job_id,
                1,
                vec![MachineOption {
                    machine_id: MachineId::new(),
                    setup_duration: Duration::ZERO,
                    processing_duration: Duration::from_minutes(30).unwrap(),
                    requires_operator_full_duration: false,
                }],
            )
            .unwrap();
            schedule
                .upsert_assignment(ScheduleAssignment {
                    task_id: task.id,
                    job_id,
                    machine_id: MachineId::new(),
                    operator_ids: vec![],
                    window: TimeWindow::new(dt(2024, 1, 1, 7, 0), dt(2024, 1, 1, 7, 30)).unwrap(),
                })
                .unwrap();
            tasks.insert(task.id, task);
        }

        let service = ConstraintValidationService::new(
            config,
            BusinessCalendar::default_calendar(),
            Arc::new(SystemClock),
        );
        let violations = service.validate(&schedule, &HashMap::new(), &tasks, &HashMap::new(), &HashMap::new());
        let wip: Vec<_> = violations.iter().filter(|v| v.code == WIP_LIMIT_EXCEEDED).collect();
        assert_eq!(wip.len(), 1);
    }

    #[test]
    fn no_machine_capability_violation_when_capability_present() {
        let mut machine = Machine::new(
            "M1".to_string(),
            "Mill".to_string(),
            AutomationLevel::Unattended,
            None,
            1.0,
        )
        .unwrap();
        machine.status = MachineStatus::Available;
        machine
            .add_capability(crate::domain::MachineCapability {
                operation_code: "GENERAL".to_string(),
                required_skills: vec![],
            })
            .unwrap();
        let job_id = crate::domain::JobId::new();
        let task = Task::new(
            job_id,
            1,
            vec![MachineOption {
                machine_id: machine.id,
                setup_duration: Duration::ZERO,
                processing_duration: Duration::from_minutes(10).unwrap(),
                requires_operator_full_duration: false,
            }],
        )
        .unwrap();

        let horizon = TimeWindow::new(dt(2024, 1, 1, 7, 0), dt(2024, 1, 1, 16, 0)).unwrap();
        let mut schedule = Schedule::new("cap".to_string(), horizon, dt(2024, 1, 1, 0, 0));
        schedule
            .upsert_assignment(ScheduleAssignment {
                task_id: task.id,
                job_id,
                machine_id: machine.id,
                operator_ids: vec![],
                window: TimeWindow::new(dt(2024, 1, 1, 7, 0), dt(2024, 1, 1, 7, 10)).unwrap(),
            })
            .unwrap();

        let mut tasks = HashMap::new();
        tasks.insert(task.id, task);
        let mut machines = HashMap::new();
        machines.insert(machine.id, machine);

        let service = ConstraintValidationService::new(
            ValidationConfig::default(),
            BusinessCalendar::default_calendar(),
            Arc::new(SystemClock),
        );
        let violations = service.validate(&schedule, &HashMap::new(), &tasks, &machines, &HashMap::new());
        assert!(violations.iter().all(|v| v.code != MACHINE_CAPABILITY_MISMATCH));
    }
}
