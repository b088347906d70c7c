//! Immutable value objects shared across the domain model (§4.1, C1).

pub mod calendar;
pub mod duration;
pub mod machine_option;
pub mod money;
pub mod skill;
pub mod time_window;

pub use calendar::{BusinessCalendar, DayHours};
pub use duration::Duration;
pub use machine_option::MachineOption;
pub use money::Money;
pub use skill::{Attendance, ProficiencyLevel, RoleRequirement, SkillType};
pub use time_window::TimeWindow;
