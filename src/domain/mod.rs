//! Domain model: aggregates, entities, and value objects (C1-C3).

pub mod events;
pub mod ids;
pub mod job;
pub mod machine;
pub mod operator;
pub mod production_zone;
pub mod schedule;
pub mod task;
pub mod value_objects;

pub use events::{DomainEvent, EventDispatcher, EventHandler};
pub use ids::{JobId, MachineId, OperatorId, ScheduleId, TaskId, ZoneId};
pub use job::{Job, JobPriority, JobStatus};
pub use machine::{AutomationLevel, Machine, MachineCapability, MachineStatus, MaintenanceWindow};
pub use operator::{AvailabilityOverride, Operator, OperatorStatus, SkillCertification, WorkingHours};
pub use production_zone::ProductionZone;
pub use schedule::{Schedule, ScheduleAssignment, ScheduleMetrics, ScheduleStatus};
pub use task::{OperatorAssignment, Task, TaskStatus};
