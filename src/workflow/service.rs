//! Workflow service implementation (§4.7).
//!
//! Keeps a bounded, instance-owned transition history rather than a
//! global log, per REDESIGN FLAGS ("no module-level mutation during
//! request handling").

use crate::domain::{Job, OperatorId, TaskId, TaskStatus};
use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub task_id: TaskId,
    pub from: String,
    pub to: String,
    pub at: DateTime<Utc>,
    pub operator_id: Option<OperatorId>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JobProgress {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub failed_tasks: u32,
    pub cancelled_tasks: u32,
}

impl JobProgress {
    pub fn completion_ratio(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.completed_tasks as f64 / self.total_tasks as f64
    }
}

pub struct WorkflowService {
    history: Vec<TransitionRecord>,
    max_history: usize,
    pub auto_start_next_task: bool,
}

impl WorkflowService {
    pub fn new(max_history: usize) -> Self {
        Self {
            history: Vec::new(),
            max_history,
            auto_start_next_task: true,
        }
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    fn record(&mut self, record: TransitionRecord) {
        self.history.push(record);
        if self.history.len() > self.max_history {
            let overflow = self.history.len() - self.max_history;
            self.history.drain(0..overflow);
        }
    }

    /// Requires the task be READY or SCHEDULED and all predecessors
    /// COMPLETED; emits `TaskStarted` (via the task's own event buffer).
    pub fn start_task(
        &mut self,
        job: &mut Job,
        task_id: TaskId,
        operator_id: Option<OperatorId>,
        at: DateTime<Utc>,
    ) -> SchedulerResult<()> {
        let sequence = job
            .task_by_id_mut(task_id)
            .ok_or_else(|| SchedulerError::not_found("task", task_id.to_string()))?
            .sequence_in_job;
        if !job.predecessors_completed(sequence) {
            return Err(SchedulerError::BusinessRule(format!(
                "task {task_id} has incomplete predecessors"
            )));
        }
        let task = job.task_by_id_mut(task_id).expect("looked up above");
        if !matches!(task.status, TaskStatus::Ready | TaskStatus::Scheduled) {
            return Err(SchedulerError::BusinessRule(format!(
                "task {task_id} must be READY or SCHEDULED to start, is {}",
                task.status
            )));
        }
        let from = task.status.to_string();
        task.start(at)?;
        self.record(TransitionRecord {
            task_id,
            from,
            to: task.status.to_string(),
            at,
            operator_id,
            note: None,
        });
        Ok(())
    }

    /// Requires IN_PROGRESS. `quality_passed=false` fails the task as a
    /// business rule rather than completing it. On success, optionally
    /// auto-starts the next sequential task, and completes the job if
    /// every task is now COMPLETED.
    pub fn complete_task(
        &mut self,
        job: &mut Job,
        task_id: TaskId,
        operator_id: Option<OperatorId>,
        at: DateTime<Utc>,
        quality_passed: bool,
    ) -> SchedulerResult<()> {
        let (sequence, from) = {
            let task = job
                .task_by_id_mut(task_id)
                .ok_or_else(|| SchedulerError::not_found("task", task_id.to_string()))?;
            if task.status != TaskStatus::InProgress {
                return Err(SchedulerError::BusinessRule(format!(
                    "task {task_id} must be IN_PROGRESS to complete, is {}",
                    task.status
                )));
            }
            (task.sequence_in_job, task.status.to_string())
        };

        if !quality_passed {
            let task = job.task_by_id_mut(task_id).expect("looked up above");
            task.fail("quality check failed".to_string())?;
            self.record(TransitionRecord {
                task_id,
                from,
                to: task.status.to_string(),
                at,
                operator_id,
                note: Some("quality check failed".to_string()),
            });
            return Err(SchedulerError::BusinessRule(format!(
                "task {task_id} failed quality check"
            )));
        }

        let task = job.task_by_id_mut(task_id).expect("looked up above");
        task.complete(at)?;
        self.record(TransitionRecord {
            task_id,
            from,
            to: task.status.to_string(),
            at,
            operator_id,
            note: None,
        });

        if self.auto_start_next_task {
            if let Some(next) = job.task(sequence + 1) {
                if next.status == TaskStatus::Pending {
                    let next_id = next.id;
                    let next_task = job.task_by_id_mut(next_id).expect("present above");
                    next_task.mark_ready()?;
                    // Best effort: if auto-start is rejected (e.g. another
                    // predecessor still open) the task just stays Ready.
                    let _ = self.start_task(job, next_id, None, at);
                }
            }
        }

        if job.tasks().all(|t| t.status == TaskStatus::Completed) {
            job.complete(at)?;
        }
        Ok(())
    }

    pub fn cancel_task(&mut self, job: &mut Job, task_id: TaskId, reason: Option<String>, at: DateTime<Utc>) -> SchedulerResult<()> {
        let task = job
            .task_by_id_mut(task_id)
            .ok_or_else(|| SchedulerError::not_found("task", task_id.to_string()))?;
        let from = task.status.to_string();
        task.cancel(reason.clone())?;
        self.record(TransitionRecord {
            task_id,
            from,
            to: task.status.to_string(),
            at,
            operator_id: None,
            note: reason,
        });
        Ok(())
    }

    /// Re-open a CANCELLED/COMPLETED task back to PENDING (§4.7).
    pub fn restart_task(&mut self, job: &mut Job, task_id: TaskId, at: DateTime<Utc>) -> SchedulerResult<()> {
        let task = job
            .task_by_id_mut(task_id)
            .ok_or_else(|| SchedulerError::not_found("task", task_id.to_string()))?;
        let from = task.status.to_string();
        task.reopen()?;
        self.record(TransitionRecord {
            task_id,
            from,
            to: task.status.to_string(),
            at,
            operator_id: None,
            note: Some("restarted".to_string()),
        });
        Ok(())
    }

    /// Starts every task currently eligible to run: PENDING tasks whose
    /// predecessors are all COMPLETED are marked READY then started.
    pub fn advance_job_workflow(&mut self, job: &mut Job, at: DateTime<Utc>) -> SchedulerResult<Vec<TaskId>> {
        let startable: Vec<TaskId> = job
            .tasks()
            .filter(|t| t.status == TaskStatus::Pending && job.predecessors_completed(t.sequence_in_job))
            .map(|t| t.id)
            .collect();
        let mut started = Vec::new();
        for task_id in startable {
            let task = job.task_by_id_mut(task_id).expect("collected above");
            task.mark_ready()?;
            self.start_task(job, task_id, None, at)?;
            started.push(task_id);
        }
        Ok(started)
    }

    pub fn get_job_progress(&self, job: &Job) -> JobProgress {
        let mut progress = JobProgress::default();
        for task in job.tasks() {
            progress.total_tasks += 1;
            match task.status {
                TaskStatus::Completed => progress.completed_tasks += 1,
                TaskStatus::Failed => progress.failed_tasks += 1,
                TaskStatus::Cancelled => progress.cancelled_tasks += 1,
                _ => {}
            }
        }
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::MachineOption;
    use crate::domain::JobPriority;

    fn sample_job_with_two_tasks() -> Job {
        let mut job = Job::new(
            "JOB-1".to_string(),
            "ACME".to_string(),
            "PN".to_string(),
            1,
            JobPriority::Normal,
            Utc::now() + chrono::Duration::days(2),
            Utc::now(),
        )
        .unwrap();
        for seq in 1..=2 {
            let task = new_task(job.id, seq);
            job.add_task(task).unwrap();
        }
        job
    }

    fn new_task(job_id: crate::domain::JobId, seq: u32) -> crate::domain::Task {
        crate::domain::Task::new(
            job_id,
            seq,
            vec![MachineOption {
                machine_id: crate::domain::MachineId::new(),
                setup_duration: crate::domain::value_objects::Duration::ZERO,
                processing_duration: crate::domain::value_objects::Duration::from_minutes(10).unwrap(),
                requires_operator_full_duration: false,
            }],
        )
        .unwrap()
    }

    #[test]
    fn start_task_rejects_incomplete_predecessors() {
        let mut job = sample_job_with_two_tasks();
        let mut svc = WorkflowService::new(100);
        let second = job.task(2).unwrap().id;
        job.task_mut(2).unwrap().mark_ready().unwrap();
        assert!(svc.start_task(&mut job, second, None, Utc::now()).is_err());
    }

    #[test]
    fn complete_task_auto_starts_next_and_completes_job() {
        let mut job = sample_job_with_two_tasks();
        let mut svc = WorkflowService::new(100);
        job.release(Utc::now()).unwrap();
        job.start(Utc::now()).unwrap();

        let first = job.task(1).unwrap().id;
        job.task_mut(1).unwrap().mark_ready().unwrap();
        svc.start_task(&mut job, first, None, Utc::now()).unwrap();
        svc.complete_task(&mut job, first, None, Utc::now() + chrono::Duration::minutes(10), true).unwrap();

        assert_eq!(job.task(2).unwrap().status, TaskStatus::InProgress);

        let second = job.task(2).unwrap().id;
        svc.complete_task(&mut job, second, None, Utc::now() + chrono::Duration::minutes(20), true).unwrap();
        assert_eq!(job.status, crate::domain::JobStatus::Completed);
    }

    #[test]
    fn complete_task_with_failed_quality_fails_task() {
        let mut job = sample_job_with_two_tasks();
        let mut svc = WorkflowService::new(100);
        let first = job.task(1).unwrap().id;
        job.task_mut(1).unwrap().mark_ready().unwrap();
        svc.start_task(&mut job, first, None, Utc::now()).unwrap();
        assert!(svc.complete_task(&mut job, first, None, Utc::now(), false).is_err());
        assert_eq!(job.task(1).unwrap().status, TaskStatus::Failed);
    }

    #[test]
    fn restart_task_reopens_cancelled_task() {
        let mut job = sample_job_with_two_tasks();
        let mut svc = WorkflowService::new(100);
        let first = job.task(1).unwrap().id;
        svc.cancel_task(&mut job, first, Some("changed plan".to_string()), Utc::now()).unwrap();
        svc.restart_task(&mut job, first, Utc::now()).unwrap();
        assert_eq!(job.task(1).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn job_progress_counts_statuses() {
        let mut job = sample_job_with_two_tasks();
        let svc = WorkflowService::new(100);
        job.task_mut(1).unwrap().mark_ready().unwrap();
        job.task_mut(1)
            .unwrap()
            .schedule(crate::domain::MachineId::new(), vec![], Utc::now(), Utc::now())
            .unwrap();
        job.task_mut(1).unwrap().start(Utc::now()).unwrap();
        job.task_mut(1).unwrap().complete(Utc::now() + chrono::Duration::minutes(5)).unwrap();
        let progress = svc.get_job_progress(&job);
        assert_eq!(progress.total_tasks, 2);
        assert_eq!(progress.completed_tasks, 1);
        assert!((progress.completion_ratio() - 0.5).abs() < 1e-9);
    }
}
