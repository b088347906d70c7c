//! Workflow service (C8, §4.7): post-publication task progression.

pub mod service;

pub use service::{JobProgress, TransitionRecord, WorkflowService};
