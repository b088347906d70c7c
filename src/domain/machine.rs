//! The `Machine` entity (§3, §4.1).

use crate::domain::ids::{MachineId, ZoneId};
use crate::domain::value_objects::SkillType;
use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomationLevel {
    Attended,
    Unattended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Available,
    Busy,
    Maintenance,
    Offline,
}

/// A scheduled unavailability window for maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: String,
}

/// One operation this machine is capable of performing (keyed by an
/// operation code shared with `Task::machine_options`' routing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineCapability {
    pub operation_code: String,
    pub required_skills: Vec<SkillType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub code: String,
    pub name: String,
    pub automation_level: AutomationLevel,
    pub production_zone_id: Option<ZoneId>,
    pub status: MachineStatus,
    pub efficiency_factor: f64,
    pub is_bottleneck: bool,
    capabilities: Vec<MachineCapability>,
    maintenance_windows: Vec<MaintenanceWindow>,
}

fn validate_code(code: &str) -> SchedulerResult<()> {
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SchedulerError::Validation(format!(
            "machine code {code:?} must be non-empty uppercase alphanumeric"
        )));
    }
    Ok(())
}

impl Machine {
    pub fn new(
        code: String,
        name: String,
        automation_level: AutomationLevel,
        production_zone_id: Option<ZoneId>,
        efficiency_factor: f64,
    ) -> SchedulerResult<Self> {
        validate_code(&code)?;
        if !(0.1..=2.0).contains(&efficiency_factor) {
            return Err(SchedulerError::Validation(format!(
                "efficiency_factor must be in 0.1..=2.0, got {efficiency_factor}"
            )));
        }
        Ok(Self {
            id: MachineId::new(),
            code,
            name,
            automation_level,
            production_zone_id,
            status: MachineStatus::Available,
            efficiency_factor,
            is_bottleneck: false,
            capabilities: Vec::new(),
            maintenance_windows: Vec::new(),
        })
    }

    pub fn capabilities(&self) -> &[MachineCapability] {
        &self.capabilities
    }

    pub fn add_capability(&mut self, capability: MachineCapability) -> SchedulerResult<()> {
        if self
            .capabilities
            .iter()
            .any(|c| c.operation_code == capability.operation_code)
        {
            return Err(SchedulerError::Validation(format!(
                "machine {} already has a capability for operation {:?}",
                self.code, capability.operation_code
            )));
        }
        self.capabilities.push(capability);
        Ok(())
    }

    pub fn can_perform(&self, operation_code: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.operation_code == operation_code)
    }

    pub fn maintenance_windows(&self) -> &[MaintenanceWindow] {
        &self.maintenance_windows
    }

    pub fn add_maintenance_window(&mut self, window: MaintenanceWindow) -> SchedulerResult<()> {
        if window.end <= window.start {
            return Err(SchedulerError::Validation(
                "maintenance window end must be after start".to_string(),
            ));
        }
        if self
            .maintenance_windows
            .iter()
            .any(|w| w.start < window.end && window.start < w.end)
        {
            return Err(SchedulerError::Validation(format!(
                "maintenance window overlaps an existing window on machine {}",
                self.code
            )));
        }
        self.maintenance_windows.push(window);
        Ok(())
    }

    pub fn is_under_maintenance(&self, at: DateTime<Utc>) -> bool {
        self.maintenance_windows
            .iter()
            .any(|w| w.start <= at && at < w.end)
    }

    pub fn is_available_for_scheduling(&self) -> bool {
        matches!(self.status, MachineStatus::Available | MachineStatus::Busy)
    }
}
