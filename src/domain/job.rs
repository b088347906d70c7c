//! The `Job` aggregate root (§3, §4.2).

use crate::domain::events::DomainEvent;
use crate::domain::ids::JobId;
use crate::domain::task::{Task, TaskStatus};
use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPriority {
    Low,
    Normal,
    High,
    Critical,
}

impl JobPriority {
    /// Lower rank sorts first (used for priority-based ordering, §4.5, §4.9).
    pub fn rank(&self) -> u8 {
        match self {
            JobPriority::Critical => 0,
            JobPriority::High => 1,
            JobPriority::Normal => 2,
            JobPriority::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Planned,
    Released,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        use JobStatus::*;
        if *self == to {
            return true;
        }
        matches!(
            (self, to),
            (Planned, Released)
                | (Planned, Cancelled)
                | (Released, InProgress)
                | (Released, OnHold)
                | (Released, Cancelled)
                | (InProgress, Completed)
                | (InProgress, OnHold)
                | (InProgress, Cancelled)
                | (OnHold, Released)
                | (OnHold, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn validate_job_number(job_number: &str) -> SchedulerResult<()> {
    let len_ok = (3..=50).contains(&job_number.len());
    let chars_ok = job_number
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !len_ok || !chars_ok {
        return Err(SchedulerError::Validation(format!(
            "job_number {job_number:?} must be 3-50 chars of [A-Z0-9_-]"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_number: String,
    pub customer: String,
    pub part_number: String,
    pub quantity: u32,
    pub priority: JobPriority,
    pub due_date: DateTime<Utc>,
    pub release_date: Option<DateTime<Utc>>,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub current_operation_sequence: u32,
    pub status: JobStatus,
    tasks: BTreeMap<u32, Task>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pending_events: Vec<DomainEvent>,
}

impl Job {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_number: String,
        customer: String,
        part_number: String,
        quantity: u32,
        priority: JobPriority,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Self> {
        validate_job_number(&job_number)?;
        if quantity < 1 {
            return Err(SchedulerError::Validation(
                "job quantity must be at least 1".to_string(),
            ));
        }
        if due_date <= now {
            return Err(SchedulerError::Validation(
                "due_date must be in the future at creation".to_string(),
            ));
        }
        Ok(Self {
            id: JobId::new(),
            job_number,
            customer,
            part_number,
            quantity,
            priority,
            due_date,
            release_date: None,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            current_operation_sequence: 0,
            status: JobStatus::Planned,
            tasks: BTreeMap::new(),
            updated_at: now,
            pending_events: Vec::new(),
        })
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task(&self, sequence: u32) -> Option<&Task> {
        self.tasks.get(&sequence)
    }

    pub fn task_mut(&mut self, sequence: u32) -> Option<&mut Task> {
        self.tasks.get_mut(&sequence)
    }

    pub fn task_by_id_mut(&mut self, task_id: crate::domain::ids::TaskId) -> Option<&mut Task> {
        self.tasks.values_mut().find(|t| t.id == task_id)
    }

    pub fn add_task(&mut self, task: Task) -> SchedulerResult<()> {
        if self.status == JobStatus::Completed {
            return Err(SchedulerError::BusinessRule(
                "cannot add tasks to a completed job".to_string(),
            ));
        }
        if self.tasks.contains_key(&task.sequence_in_job) {
            return Err(SchedulerError::Validation(format!(
                "duplicate task sequence {} within job {}",
                task.sequence_in_job, self.id
            )));
        }
        self.tasks.insert(task.sequence_in_job, task);
        Ok(())
    }

    fn transition(&mut self, to: JobStatus, now: DateTime<Utc>) -> SchedulerResult<()> {
        if self.status.is_terminal() && self.status != to {
            return Err(SchedulerError::BusinessRule(format!(
                "job {} is in terminal state {} and cannot transition",
                self.id, self.status
            )));
        }
        if !self.status.can_transition_to(to) {
            return Err(SchedulerError::BusinessRule(format!(
                "job {} cannot transition from {} to {}",
                self.id, self.status, to
            )));
        }
        let old = self.status;
        self.status = to;
        self.updated_at = now;
        if old != to {
            self.pending_events.push(DomainEvent::JobStatusChanged {
                job_id: self.id,
                old_status: old.to_string(),
                new_status: to.to_string(),
                at: now,
            });
        }
        Ok(())
    }

    pub fn release(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(JobStatus::Released, now)?;
        if self.release_date.is_none() {
            self.release_date = Some(now);
        }
        Ok(())
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(JobStatus::InProgress, now)?;
        self.actual_start.get_or_insert(now);
        Ok(())
    }

    pub fn hold(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(JobStatus::OnHold, now)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(JobStatus::Completed, now)?;
        self.actual_end = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> SchedulerResult<()> {
        self.transition(JobStatus::Cancelled, now)
    }

    pub fn take_pending_events(&mut self) -> Vec<DomainEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        for task in self.tasks.values_mut() {
            events.extend(task.take_pending_events());
        }
        events
    }

    /// Is `sequence` immediately ready to start: all of its predecessors
    /// (every task with a strictly lower sequence, per the ordered-map
    /// invariant) are COMPLETED?
    pub fn predecessors_completed(&self, sequence: u32) -> bool {
        self.tasks
            .range(..sequence)
            .all(|(_, t)| t.status == TaskStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::MachineId;
    use crate::domain::value_objects::{Duration, MachineOption};

    fn future(days: i64) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::days(days)
    }

    fn sample_job() -> Job {
        Job::new(
            "JOB-001".to_string(),
            "ACME".to_string(),
            "PN-1".to_string(),
            10,
            JobPriority::Normal,
            future(5),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn validates_job_number_format() {
        assert!(Job::new(
            "ab".to_string(),
            "ACME".to_string(),
            "PN-1".to_string(),
            1,
            JobPriority::Normal,
            future(5),
            Utc::now()
        )
        .is_err());
    }

    #[test]
    fn rejects_past_due_date() {
        assert!(Job::new(
            "JOB-002".to_string(),
            "ACME".to_string(),
            "PN-1".to_string(),
            1,
            JobPriority::Normal,
            future(-1),
            Utc::now()
        )
        .is_err());
    }

    #[test]
    fn release_stamps_release_date_once() {
        let mut job = sample_job();
        let now = Utc::now();
        job.release(now).unwrap();
        assert_eq!(job.release_date, Some(now));
        let later = now + chrono::Duration::hours(1);
        job.hold(later).unwrap();
        job.release(later).unwrap();
        assert_eq!(job.release_date, Some(now));
    }

    #[test]
    fn add_task_rejected_once_completed() {
        let mut job = sample_job();
        job.release(Utc::now()).unwrap();
        job.start(Utc::now()).unwrap();
        job.complete(Utc::now()).unwrap();

        let opt = MachineOption {
            machine_id: MachineId::new(),
            setup_duration: Duration::ZERO,
            processing_duration: Duration::ZERO,
            requires_operator_full_duration: false,
        };
        let task = crate::domain::task::Task::new(job.id, 1, vec![opt]).unwrap();
        assert!(job.add_task(task).is_err());
    }

    #[test]
    fn duplicate_sequence_rejected() {
        let mut job = sample_job();
        let opt = MachineOption {
            machine_id: MachineId::new(),
            setup_duration: Duration::ZERO,
            processing_duration: Duration::ZERO,
            requires_operator_full_duration: false,
        };
        let t1 = crate::domain::task::Task::new(job.id, 1, vec![opt.clone()]).unwrap();
        let t2 = crate::domain::task::Task::new(job.id, 1, vec![opt]).unwrap();
        job.add_task(t1).unwrap();
        assert!(job.add_task(t2).is_err());
    }

    #[test]
    fn predecessors_completed_checks_lower_sequences() {
        let mut job = sample_job();
        let opt = MachineOption {
            machine_id: MachineId::new(),
            setup_duration: Duration::ZERO,
            processing_duration: Duration::ZERO,
            requires_operator_full_duration: false,
        };
        job.add_task(crate::domain::task::Task::new(job.id, 1, vec![opt.clone()]).unwrap())
            .unwrap();
        job.add_task(crate::domain::task::Task::new(job.id, 2, vec![opt]).unwrap())
            .unwrap();
        assert!(!job.predecessors_completed(2));
        job.task_mut(1).unwrap().mark_ready().unwrap();
        job.task_mut(1)
            .unwrap()
            .schedule(MachineId::new(), vec![], Utc::now(), Utc::now())
            .unwrap();
        job.task_mut(1).unwrap().start(Utc::now()).unwrap();
        job.task_mut(1)
            .unwrap()
            .complete(Utc::now() + chrono::Duration::minutes(1))
            .unwrap();
        assert!(job.predecessors_completed(2));
    }
}
