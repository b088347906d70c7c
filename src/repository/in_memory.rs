//! In-memory reference repository implementations (§6.1 SUPPLEMENT).
//!
//! Backed by `DashMap` for concurrent readers and serialized per-key
//! writers, matching the process-global-registry pattern the teacher uses
//! for its circuit breaker/session state, scoped here to one map per
//! repository instance rather than a global.

use super::{JobRepository, MachineRepository, OperatorRepository, ScheduleRepository, TaskRepository};
use crate::domain::value_objects::{ProficiencyLevel, SkillType, TimeWindow};
use crate::domain::{
    Job, JobId, Machine, MachineId, MachineStatus, Operator, OperatorId, Schedule, ScheduleId,
    ScheduleStatus, Task, TaskId,
};
use crate::error::{SchedulerError, SchedulerResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: DashMap<JobId, Job>,
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, job: &Job) -> SchedulerResult<()> {
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> SchedulerResult<Option<Job>> {
        Ok(self.jobs.get(&id).map(|r| r.clone()))
    }

    async fn find_all(&self) -> SchedulerResult<Vec<Job>> {
        Ok(self.jobs.iter().map(|r| r.value().clone()).collect())
    }

    async fn delete(&self, id: JobId) -> SchedulerResult<()> {
        self.jobs.remove(&id);
        Ok(())
    }

    async fn find_overdue(&self, as_of: DateTime<Utc>) -> SchedulerResult<Vec<Job>> {
        Ok(self
            .jobs
            .iter()
            .filter(|r| r.due_date < as_of && r.actual_end.is_none())
            .map(|r| r.value().clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: DashMap<TaskId, Task>,
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn save(&self, task: &Task) -> SchedulerResult<()> {
        self.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> SchedulerResult<Option<Task>> {
        Ok(self.tasks.get(&id).map(|r| r.clone()))
    }

    async fn find_all(&self) -> SchedulerResult<Vec<Task>> {
        Ok(self.tasks.iter().map(|r| r.value().clone()).collect())
    }

    async fn delete(&self, id: TaskId) -> SchedulerResult<()> {
        self.tasks.remove(&id);
        Ok(())
    }

    async fn find_by_job(&self, job_id: JobId) -> SchedulerResult<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|r| r.job_id == job_id)
            .map(|r| r.value().clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryMachineRepository {
    machines: DashMap<MachineId, Machine>,
}

#[async_trait]
impl MachineRepository for InMemoryMachineRepository {
    async fn save(&self, machine: &Machine) -> SchedulerResult<()> {
        self.machines.insert(machine.id, machine.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MachineId) -> SchedulerResult<Option<Machine>> {
        Ok(self.machines.get(&id).map(|r| r.clone()))
    }

    async fn find_all(&self) -> SchedulerResult<Vec<Machine>> {
        Ok(self.machines.iter().map(|r| r.value().clone()).collect())
    }

    async fn delete(&self, id: MachineId) -> SchedulerResult<()> {
        self.machines.remove(&id);
        Ok(())
    }

    async fn find_available(&self, window: TimeWindow) -> SchedulerResult<Vec<Machine>> {
        Ok(self
            .machines
            .iter()
            .filter(|r| {
                r.status == MachineStatus::Available
                    && !r.is_under_maintenance(window.start)
                    && !r.is_under_maintenance(window.end)
            })
            .map(|r| r.value().clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryOperatorRepository {
    operators: DashMap<OperatorId, Operator>,
}

#[async_trait]
impl OperatorRepository for InMemoryOperatorRepository {
    async fn save(&self, operator: &Operator) -> SchedulerResult<()> {
        self.operators.insert(operator.id, operator.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OperatorId) -> SchedulerResult<Option<Operator>> {
        Ok(self.operators.get(&id).map(|r| r.clone()))
    }

    async fn find_all(&self) -> SchedulerResult<Vec<Operator>> {
        Ok(self.operators.iter().map(|r| r.value().clone()).collect())
    }

    async fn delete(&self, id: OperatorId) -> SchedulerResult<()> {
        self.operators.remove(&id);
        Ok(())
    }

    async fn find_by_skill(&self, skill: &SkillType, min_level: ProficiencyLevel) -> SchedulerResult<Vec<Operator>> {
        let today = Utc::now().date_naive();
        Ok(self
            .operators
            .iter()
            .filter(|r| r.has_skill_at(skill, min_level, today))
            .map(|r| r.value().clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryScheduleRepository {
    schedules: DashMap<ScheduleId, Schedule>,
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn save(&self, schedule: &Schedule) -> SchedulerResult<()> {
        self.schedules.insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ScheduleId) -> SchedulerResult<Option<Schedule>> {
        Ok(self.schedules.get(&id).map(|r| r.clone()))
    }

    async fn find_all(&self) -> SchedulerResult<Vec<Schedule>> {
        Ok(self.schedules.iter().map(|r| r.value().clone()).collect())
    }

    async fn delete(&self, id: ScheduleId) -> SchedulerResult<()> {
        self.schedules.remove(&id);
        Ok(())
    }

    async fn find_active(&self, as_of: DateTime<Utc>) -> SchedulerResult<Vec<Schedule>> {
        Ok(self
            .schedules
            .iter()
            .filter(|r| r.status == ScheduleStatus::Active && r.planning_horizon.contains(as_of))
            .map(|r| r.value().clone())
            .collect())
    }

    async fn create_new_version(&self, base: ScheduleId) -> SchedulerResult<Schedule> {
        let base_schedule = self
            .schedules
            .get(&base)
            .ok_or_else(|| SchedulerError::not_found("schedule", base.to_string()))?;
        let new = Schedule::new(
            format!("{} (v2)", base_schedule.name),
            base_schedule.planning_horizon,
            Utc::now(),
        );
        Ok(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobPriority;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn save_and_find_roundtrip() {
        let repo = InMemoryJobRepository::default();
        let job = Job::new(
            "JOB-001".to_string(),
            "ACME".to_string(),
            "PN-1".to_string(),
            5,
            JobPriority::Normal,
            Utc::now() + ChronoDuration::days(3),
            Utc::now(),
        )
        .unwrap();
        repo.save(&job).await.unwrap();
        let found = repo.find_by_id(job.id).await.unwrap();
        assert_eq!(found.unwrap().job_number, "JOB-001");
    }

    #[tokio::test]
    async fn find_overdue_filters_by_due_date() {
        let repo = InMemoryJobRepository::default();
        let now = Utc::now();
        let job = Job::new(
            "JOB-002".to_string(),
            "ACME".to_string(),
            "PN-1".to_string(),
            5,
            JobPriority::Normal,
            now + ChronoDuration::hours(1),
            now,
        )
        .unwrap();
        repo.save(&job).await.unwrap();
        let overdue = repo.find_overdue(now + ChronoDuration::hours(2)).await.unwrap();
        assert_eq!(overdue.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let repo = InMemoryJobRepository::default();
        let job = Job::new(
            "JOB-003".to_string(),
            "ACME".to_string(),
            "PN-1".to_string(),
            5,
            JobPriority::Normal,
            Utc::now() + ChronoDuration::days(1),
            Utc::now(),
        )
        .unwrap();
        repo.save(&job).await.unwrap();
        repo.delete(job.id).await.unwrap();
        assert!(repo.find_by_id(job.id).await.unwrap().is_none());
    }
}
