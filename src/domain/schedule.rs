//! The `Schedule` aggregate root (§3, §4.2, §4.8).

use crate::domain::events::DomainEvent;
use crate::domain::ids::{JobId, MachineId, OperatorId, ScheduleId, TaskId};
use crate::domain::value_objects::TimeWindow;
use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Draft,
    Published,
    Active,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn can_transition_to(&self, to: ScheduleStatus) -> bool {
        use ScheduleStatus::*;
        if *self == to {
            return true;
        }
        matches!(
            (self, to),
            (Draft, Published)
                | (Draft, Cancelled)
                | (Published, Active)
                | (Published, Draft)
                | (Published, Cancelled)
                | (Active, Completed)
                | (Active, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScheduleStatus::Completed | ScheduleStatus::Cancelled)
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One task's placement within a schedule: the resources and window it
/// has been assigned (§4.8 solution shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub task_id: TaskId,
    pub job_id: JobId,
    pub machine_id: MachineId,
    pub operator_ids: Vec<OperatorId>,
    pub window: TimeWindow,
}

/// Cached aggregate metrics, recomputed on publish (§4.8).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScheduleMetrics {
    pub total_tardiness_minutes: i64,
    pub makespan_minutes: i64,
    pub total_operator_cost_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub planning_horizon: TimeWindow,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    job_ids: HashSet<JobId>,
    assignments: HashMap<TaskId, ScheduleAssignment>,
    pub metrics: ScheduleMetrics,
    #[serde(skip)]
    pending_events: Vec<DomainEvent>,
}

impl Schedule {
    pub fn new(name: String, planning_horizon: TimeWindow, now: DateTime<Utc>) -> Self {
        Self {
            id: ScheduleId::new(),
            name,
            planning_horizon,
            status: ScheduleStatus::Draft,
            created_at: now,
            updated_at: now,
            job_ids: HashSet::new(),
            assignments: HashMap::new(),
            metrics: ScheduleMetrics::default(),
            pending_events: Vec::new(),
        }
    }

    pub fn job_ids(&self) -> impl Iterator<Item = &JobId> {
        self.job_ids.iter()
    }

    pub fn assignments(&self) -> impl Iterator<Item = &ScheduleAssignment> {
        self.assignments.values()
    }

    pub fn assignment_for(&self, task_id: TaskId) -> Option<&ScheduleAssignment> {
        self.assignments.get(&task_id)
    }

    fn ensure_mutable(&self) -> SchedulerResult<()> {
        if self.status != ScheduleStatus::Draft {
            return Err(SchedulerError::BusinessRule(format!(
                "schedule {} assignments are only mutable in DRAFT, currently {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    pub fn upsert_assignment(&mut self, assignment: ScheduleAssignment) -> SchedulerResult<()> {
        self.ensure_mutable()?;
        self.job_ids.insert(assignment.job_id);
        self.assignments.insert(assignment.task_id, assignment);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn remove_assignment(&mut self, task_id: TaskId) -> SchedulerResult<()> {
        self.ensure_mutable()?;
        self.assignments.remove(&task_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Two assignments conflict when they share a machine or an operator
    /// and their windows overlap (§4.3 resource non-overlap check).
    fn resource_conflicts(&self) -> Vec<(TaskId, TaskId)> {
        let mut conflicts = Vec::new();
        let items: Vec<&ScheduleAssignment> = self.assignments.values().collect();
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let a = items[i];
                let b = items[j];
                if !a.window.overlaps(&b.window) {
                    continue;
                }
                let shares_machine = a.machine_id == b.machine_id;
                let shares_operator = a.operator_ids.iter().any(|o| b.operator_ids.contains(o));
                if shares_machine || shares_operator {
                    conflicts.push((a.task_id, b.task_id));
                }
            }
        }
        conflicts
    }

    /// Minimal self-contained resource-conflict check (§8 property 3 uses
    /// the full `validation` service; this is the cheap aggregate-local
    /// guard exercised before publish).
    pub fn has_resource_conflicts(&self) -> bool {
        !self.resource_conflicts().is_empty()
    }

    fn transition(&mut self, to: ScheduleStatus, now: DateTime<Utc>) -> SchedulerResult<()> {
        if self.status.is_terminal() && self.status != to {
            return Err(SchedulerError::BusinessRule(format!(
                "schedule {} is in terminal state {} and cannot transition",
                self.id, self.status
            )));
        }
        if !self.status.can_transition_to(to) {
            return Err(SchedulerError::BusinessRule(format!(
                "schedule {} cannot transition from {} to {}",
                self.id, self.status, to
            )));
        }
        let old = self.status;
        self.status = to;
        self.updated_at = now;
        if old != to {
            self.pending_events.push(DomainEvent::ScheduleStatusChanged {
                schedule_id: self.id,
                old_status: old.to_string(),
                new_status: to.to_string(),
                at: now,
            });
        }
        Ok(())
    }

    /// Publish requires no resident resource conflicts (§8 property 3:
    /// a published schedule has zero constraint violations).
    pub fn publish(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        if self.has_resource_conflicts() {
            return Err(SchedulerError::ConstraintViolation {
                count: self.resource_conflicts().len(),
            });
        }
        self.transition(ScheduleStatus::Published, now)?;
        self.pending_events.push(DomainEvent::SchedulePublished {
            schedule_id: self.id,
            at: now,
        });
        Ok(())
    }

    pub fn activate(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(ScheduleStatus::Active, now)
    }

    pub fn revert_to_draft(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(ScheduleStatus::Draft, now)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(ScheduleStatus::Completed, now)
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(ScheduleStatus::Cancelled, now)
    }

    pub fn take_pending_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
