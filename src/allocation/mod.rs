//! Resource allocation, skill matching, and critical-sequence management (C6, C7).

pub mod critical_sequence;
pub mod resource_allocator;
pub mod skill_matcher;

pub use critical_sequence::{CriticalRun, CriticalSequenceManager};
pub use resource_allocator::{AllocatorOptions, OperatorCostAndLoad, ResourceAllocator};
pub use skill_matcher::{SkillGap, SkillMatcher};
