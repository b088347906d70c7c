//! Repository contracts (C4): abstract CRUD + query surface.
//!
//! Only the contracts and an in-memory reference adapter are specified;
//! the relational persistence layer is an external collaborator (§1).
//! Grounded on the teacher's async-trait style
//! (`resourcing/resource_pool_impl.rs`), generalized to five
//! aggregate-specific traits.

pub mod in_memory;

use crate::domain::{Job, JobId, Machine, MachineId, Operator, OperatorId, Schedule, ScheduleId, Task, TaskId};
use crate::domain::value_objects::{ProficiencyLevel, SkillType, TimeWindow};
use crate::error::SchedulerResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn save(&self, job: &Job) -> SchedulerResult<()>;
    async fn find_by_id(&self, id: JobId) -> SchedulerResult<Option<Job>>;
    async fn find_all(&self) -> SchedulerResult<Vec<Job>>;
    async fn delete(&self, id: JobId) -> SchedulerResult<()>;
    async fn find_overdue(&self, as_of: DateTime<Utc>) -> SchedulerResult<Vec<Job>>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn save(&self, task: &Task) -> SchedulerResult<()>;
    async fn find_by_id(&self, id: TaskId) -> SchedulerResult<Option<Task>>;
    async fn find_all(&self) -> SchedulerResult<Vec<Task>>;
    async fn delete(&self, id: TaskId) -> SchedulerResult<()>;
    async fn find_by_job(&self, job_id: JobId) -> SchedulerResult<Vec<Task>>;
}

#[async_trait]
pub trait MachineRepository: Send + Sync {
    async fn save(&self, machine: &Machine) -> SchedulerResult<()>;
    async fn find_by_id(&self, id: MachineId) -> SchedulerResult<Option<Machine>>;
    async fn find_all(&self) -> SchedulerResult<Vec<Machine>>;
    async fn delete(&self, id: MachineId) -> SchedulerResult<()>;
    async fn find_available(&self, window: TimeWindow) -> SchedulerResult<Vec<Machine>>;
}

#[async_trait]
pub trait OperatorRepository: Send + Sync {
    async fn save(&self, operator: &Operator) -> SchedulerResult<()>;
    async fn find_by_id(&self, id: OperatorId) -> SchedulerResult<Option<Operator>>;
    async fn find_all(&self) -> SchedulerResult<Vec<Operator>>;
    async fn delete(&self, id: OperatorId) -> SchedulerResult<()>;
    async fn find_by_skill(&self, skill: &SkillType, min_level: ProficiencyLevel) -> SchedulerResult<Vec<Operator>>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn save(&self, schedule: &Schedule) -> SchedulerResult<()>;
    async fn find_by_id(&self, id: ScheduleId) -> SchedulerResult<Option<Schedule>>;
    async fn find_all(&self) -> SchedulerResult<Vec<Schedule>>;
    async fn delete(&self, id: ScheduleId) -> SchedulerResult<()>;
    async fn find_active(&self, as_of: DateTime<Utc>) -> SchedulerResult<Vec<Schedule>>;
    /// Clone `base` into a fresh DRAFT schedule sharing its planning horizon.
    async fn create_new_version(&self, base: ScheduleId) -> SchedulerResult<Schedule>;
}
