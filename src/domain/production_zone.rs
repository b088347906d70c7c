//! The `ProductionZone` entity and WIP-limit bookkeeping (§3, §4.3).
//!
//! Open Question resolved in SPEC_FULL.md: WIP occupancy is defined as the
//! count of jobs whose `current_operation_sequence` currently maps onto a
//! task located in this zone (a sequence-range occupancy model), tracked
//! here as an explicit membership set rather than derived per query.

use crate::domain::ids::{JobId, ZoneId};
use crate::error::{SchedulerError, SchedulerResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionZone {
    pub id: ZoneId,
    pub zone_code: String,
    pub name: String,
    pub wip_limit: u32,
    jobs_in_zone: HashSet<JobId>,
}

impl ProductionZone {
    pub fn new(zone_code: String, name: String, wip_limit: u32) -> SchedulerResult<Self> {
        if wip_limit == 0 {
            return Err(SchedulerError::Validation(
                "wip_limit must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            id: ZoneId::new(),
            zone_code,
            name,
            wip_limit,
            jobs_in_zone: HashSet::new(),
        })
    }

    pub fn current_wip(&self) -> u32 {
        self.jobs_in_zone.len() as u32
    }

    pub fn is_at_capacity(&self) -> bool {
        self.current_wip() >= self.wip_limit
    }

    /// Would admitting one more distinct job (beyond those already present)
    /// exceed the configured limit?
    pub fn would_exceed(&self, job_id: JobId) -> bool {
        if self.jobs_in_zone.contains(&job_id) {
            return false;
        }
        self.current_wip() + 1 > self.wip_limit
    }

    pub fn admit(&mut self, job_id: JobId) -> SchedulerResult<()> {
        if self.would_exceed(job_id) {
            return Err(SchedulerError::BusinessRule(format!(
                "zone {} is at its WIP limit of {}",
                self.zone_code, self.wip_limit
            )));
        }
        self.jobs_in_zone.insert(job_id);
        Ok(())
    }

    pub fn release(&mut self, job_id: JobId) {
        self.jobs_in_zone.remove(&job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_wip_limit() {
        assert!(ProductionZone::new("Z1".to_string(), "Zone 1".to_string(), 0).is_err());
    }

    #[test]
    fn admit_respects_limit() {
        let mut zone = ProductionZone::new("Z1".to_string(), "Zone 1".to_string(), 2).unwrap();
        zone.admit(JobId::new()).unwrap();
        zone.admit(JobId::new()).unwrap();
        assert!(zone.is_at_capacity());
        assert!(zone.admit(JobId::new()).is_err());
    }

    #[test]
    fn readmitting_same_job_is_idempotent() {
        let mut zone = ProductionZone::new("Z1".to_string(), "Zone 1".to_string(), 1).unwrap();
        let job = JobId::new();
        zone.admit(job).unwrap();
        assert!(zone.admit(job).is_ok());
    }

    #[test]
    fn release_frees_capacity() {
        let mut zone = ProductionZone::new("Z1".to_string(), "Zone 1".to_string(), 1).unwrap();
        let job = JobId::new();
        zone.admit(job).unwrap();
        zone.release(job);
        assert!(!zone.is_at_capacity());
    }
}
