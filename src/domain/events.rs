//! Domain events and the in-process dispatcher (C3).
//!
//! Events carry only ids, never live references (§3 "Relationships").
//! Grounded on the teacher's event sidecar (`services/event_sidecar.rs`,
//! `events.rs`), but redesigned per REDESIGN FLAGS: the dispatcher is an
//! explicitly constructed/passed handle rather than a module-level
//! mutable singleton, and dispatch is synchronous/in-process rather than
//! channel-based, since handlers here are plain in-process subscribers.

use crate::domain::ids::{JobId, MachineId, OperatorId, ScheduleId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A domain event, tagged with the aggregate it originated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    JobStatusChanged {
        job_id: JobId,
        old_status: String,
        new_status: String,
        at: DateTime<Utc>,
    },
    TaskStatusChanged {
        task_id: TaskId,
        job_id: JobId,
        old_status: String,
        new_status: String,
        reason: Option<String>,
        delay_minutes: Option<i64>,
        at: DateTime<Utc>,
    },
    TaskScheduled {
        task_id: TaskId,
        job_id: JobId,
        machine_id: MachineId,
        operator_ids: Vec<OperatorId>,
        planned_start: DateTime<Utc>,
        planned_end: DateTime<Utc>,
    },
    TaskStarted {
        task_id: TaskId,
        job_id: JobId,
        operator_id: Option<OperatorId>,
        at: DateTime<Utc>,
    },
    SchedulePublished {
        schedule_id: ScheduleId,
        at: DateTime<Utc>,
    },
    ScheduleStatusChanged {
        schedule_id: ScheduleId,
        old_status: String,
        new_status: String,
        at: DateTime<Utc>,
    },
}

/// A subscriber to domain events.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &DomainEvent);
}

/// In-process pub/sub dispatcher for domain events.
///
/// Events for a single aggregate are dispatched in the order the
/// operations occurred on that aggregate (§5 "Ordering guarantees"),
/// since `dispatch` delivers a batch in the order it was drained from the
/// aggregate's pending-events buffer, and each handler is invoked
/// sequentially.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatch a batch of events, in order, to every handler in order.
    pub fn dispatch(&self, events: &[DomainEvent]) {
        for event in events {
            for handler in &self.handlers {
                handler.handle(event);
            }
        }
    }
}
