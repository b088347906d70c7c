//! The `Task` entity and its state machine (§3, §4.2).

use crate::domain::events::DomainEvent;
use crate::domain::ids::{JobId, MachineId, OperatorId, TaskId};
use crate::domain::value_objects::{Duration, MachineOption, RoleRequirement, SkillType};
use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task lifecycle status (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Ready,
    Scheduled,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Whether `to` is a legal transition target from `self`.
    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        if *self == to {
            return true; // same-state transition is a no-op (§8 property 4)
        }
        matches!(
            (self, to),
            (Pending, Ready)
                | (Pending, Cancelled)
                | (Ready, Scheduled)
                | (Ready, Cancelled)
                | (Scheduled, InProgress)
                | (Scheduled, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (InProgress, Cancelled)
                | (Failed, Ready)
                | (Failed, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An operator assigned to fill one role slot on a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorAssignment {
    pub operator_id: OperatorId,
    pub skill_type: SkillType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub job_id: JobId,
    pub sequence_in_job: u32,
    pub operation_code: String,
    pub status: TaskStatus,
    pub machine_options: Vec<MachineOption>,
    pub role_requirements: Vec<RoleRequirement>,
    pub legacy_skill_requirements: Vec<SkillType>,
    pub predecessor_task_ids: Vec<TaskId>,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub planned_duration: Option<Duration>,
    pub actual_duration: Option<Duration>,
    pub planned_setup_duration: Option<Duration>,
    pub actual_setup_duration: Option<Duration>,
    pub assigned_machine_id: Option<MachineId>,
    pub operator_assignments: Vec<OperatorAssignment>,
    pub is_critical_path: bool,
    pub delay_minutes: i64,
    pub rework_count: u32,
    pub department: Option<String>,
    #[serde(skip)]
    pending_events: Vec<DomainEvent>,
}

impl Task {
    pub fn new(
        job_id: JobId,
        sequence_in_job: u32,
        machine_options: Vec<MachineOption>,
    ) -> SchedulerResult<Self> {
        Self::with_operation(job_id, sequence_in_job, "GENERAL".to_string(), machine_options)
    }

    pub fn with_operation(
        job_id: JobId,
        sequence_in_job: u32,
        operation_code: String,
        machine_options: Vec<MachineOption>,
    ) -> SchedulerResult<Self> {
        if !(1..=100).contains(&sequence_in_job) {
            return Err(SchedulerError::Validation(format!(
                "task sequence must be in 1..=100, got {sequence_in_job}"
            )));
        }
        if machine_options.is_empty() {
            return Err(SchedulerError::Validation(
                "a task must have at least one machine option (routing)".to_string(),
            ));
        }
        Ok(Self {
            id: TaskId::new(),
            job_id,
            sequence_in_job,
            operation_code,
            status: TaskStatus::Pending,
            machine_options,
            role_requirements: Vec::new(),
            legacy_skill_requirements: Vec::new(),
            predecessor_task_ids: Vec::new(),
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            planned_duration: None,
            actual_duration: None,
            planned_setup_duration: None,
            actual_setup_duration: None,
            assigned_machine_id: None,
            operator_assignments: Vec::new(),
            is_critical_path: false,
            delay_minutes: 0,
            rework_count: 0,
            department: None,
            pending_events: Vec::new(),
        })
    }

    /// Role requirements, defaulting to a single full-duration operator
    /// of unspecified skill when none were declared (§3 Task invariants).
    pub fn effective_role_requirements(&self) -> Vec<RoleRequirement> {
        if !self.role_requirements.is_empty() {
            return self.role_requirements.clone();
        }
        vec![RoleRequirement {
            skill_type: SkillType::new("GENERAL"),
            minimum_level: crate::domain::value_objects::skill::ProficiencyLevel::new(1)
                .expect("1 is a valid proficiency level"),
            count: 1,
            attendance: crate::domain::value_objects::Attendance::FullDuration,
        }]
    }

    fn transition(&mut self, to: TaskStatus, reason: Option<String>) -> SchedulerResult<()> {
        if self.status.is_terminal() && self.status != to {
            return Err(SchedulerError::BusinessRule(format!(
                "task {} is in terminal state {} and cannot transition",
                self.id, self.status
            )));
        }
        if !self.status.can_transition_to(to) {
            return Err(SchedulerError::BusinessRule(format!(
                "task {} cannot transition from {} to {}",
                self.id, self.status, to
            )));
        }
        let old = self.status;
        self.status = to;
        if old != to {
            self.pending_events.push(DomainEvent::TaskStatusChanged {
                task_id: self.id,
                job_id: self.job_id,
                old_status: old.to_string(),
                new_status: to.to_string(),
                reason,
                delay_minutes: if self.delay_minutes != 0 {
                    Some(self.delay_minutes)
                } else {
                    None
                },
                at: Utc::now(),
            });
        }
        Ok(())
    }

    /// Move to READY. Caller (job/workflow service) must have already
    /// verified all predecessors are COMPLETED.
    pub fn mark_ready(&mut self) -> SchedulerResult<()> {
        self.transition(TaskStatus::Ready, None)
    }

    pub fn schedule(
        &mut self,
        machine_id: MachineId,
        operator_assignments: Vec<OperatorAssignment>,
        planned_start: DateTime<Utc>,
        planned_end: DateTime<Utc>,
    ) -> SchedulerResult<()> {
        self.transition(TaskStatus::Scheduled, None)?;
        self.assigned_machine_id = Some(machine_id);
        self.operator_assignments = operator_assignments;
        self.planned_start = Some(planned_start);
        self.planned_end = Some(planned_end);
        Ok(())
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(TaskStatus::InProgress, None)?;
        self.actual_start = Some(at);
        Ok(())
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> SchedulerResult<()> {
        if let Some(start) = self.actual_start {
            if at <= start {
                return Err(SchedulerError::Validation(
                    "actual_end must be after actual_start".to_string(),
                ));
            }
        }
        self.transition(TaskStatus::Completed, None)?;
        self.actual_end = Some(at);
        Ok(())
    }

    pub fn fail(&mut self, reason: String) -> SchedulerResult<()> {
        self.transition(TaskStatus::Failed, Some(reason))
    }

    pub fn cancel(&mut self, reason: Option<String>) -> SchedulerResult<()> {
        self.transition(TaskStatus::Cancelled, reason)
    }

    /// Re-open a task from a terminal state (CANCELLED/COMPLETED) back to
    /// PENDING. This is a deliberate administrative action distinct from
    /// `transition()`: the ordinary state machine rejects every outbound
    /// edge from a terminal state (§8 property 4), so `reopen` bypasses
    /// it explicitly rather than adding a back-edge to the FSM table.
    pub fn reopen(&mut self) -> SchedulerResult<()> {
        if !self.status.is_terminal() {
            return Err(SchedulerError::BusinessRule(format!(
                "task {} is not in a terminal state and cannot be reopened",
                self.id
            )));
        }
        let old = self.status;
        self.status = TaskStatus::Pending;
        self.rework_count += 1;
        self.pending_events.push(DomainEvent::TaskStatusChanged {
            task_id: self.id,
            job_id: self.job_id,
            old_status: old.to_string(),
            new_status: self.status.to_string(),
            reason: Some("restarted".to_string()),
            delay_minutes: None,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Re-open a failed task back to READY.
    pub fn restart(&mut self) -> SchedulerResult<()> {
        self.transition(TaskStatus::Ready, None)?;
        self.rework_count += 1;
        Ok(())
    }

    pub fn take_pending_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
