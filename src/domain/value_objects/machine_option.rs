//! `MachineOption`: one valid (machine, setup, processing) routing choice (§3, §4.1).

use super::duration::Duration;
use super::skill::Attendance;
use crate::domain::ids::MachineId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineOption {
    pub machine_id: MachineId,
    pub setup_duration: Duration,
    pub processing_duration: Duration,
    pub requires_operator_full_duration: bool,
}

impl MachineOption {
    pub fn total_duration(&self) -> Duration {
        self.setup_duration + self.processing_duration
    }

    /// Minutes during which an operator must be present, for a role whose
    /// own attendance is given. The union-wins rule of §9 Open Questions:
    /// the operator is required for the full duration if EITHER the
    /// option says so OR the role's attendance says `FullDuration`.
    pub fn operator_required_duration(&self, role_attendance: Attendance) -> Duration {
        if self.requires_operator_full_duration || role_attendance == Attendance::FullDuration {
            self.total_duration()
        } else {
            self.setup_duration
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(setup: i64, processing: i64, full: bool) -> MachineOption {
        MachineOption {
            machine_id: MachineId::new(),
            setup_duration: Duration::from_minutes(setup).unwrap(),
            processing_duration: Duration::from_minutes(processing).unwrap(),
            requires_operator_full_duration: full,
        }
    }

    #[test]
    fn total_is_setup_plus_processing() {
        let o = opt(10, 60, false);
        assert_eq!(o.total_duration(), Duration::from_minutes(70).unwrap());
    }

    #[test]
    fn union_wins_for_full_duration_attendance() {
        let o = opt(10, 60, false);
        assert_eq!(
            o.operator_required_duration(Attendance::FullDuration),
            o.total_duration()
        );
        assert_eq!(
            o.operator_required_duration(Attendance::SetupOnly),
            o.setup_duration
        );
    }

    #[test]
    fn option_flag_forces_full_duration_even_for_setup_only_role() {
        let o = opt(10, 60, true);
        assert_eq!(
            o.operator_required_duration(Attendance::SetupOnly),
            o.total_duration()
        );
    }
}
