//! `SolverMetrics`: the statistics every solve emits (§4.8 "Solver adapter").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Timeout,
    Cancelled,
    MemoryExceeded,
    Error,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverMetrics {
    pub duration_seconds: f64,
    pub peak_memory_mb: f64,
    pub cpu_percent: f64,
    pub num_variables: usize,
    pub num_constraints: usize,
    pub objective_value: Option<f64>,
    pub best_bound: Option<f64>,
    pub gap_percent: Option<f64>,
    pub num_branches: u64,
    pub num_conflicts: u64,
    pub wall_time_seconds: f64,
    pub user_time_seconds: f64,
    pub partial_solution: bool,
    pub error_message: Option<String>,
}
