//! Maps a failure reason to a fallback strategy and runs it, with an
//! emergency fallback when the selected strategy itself fails (§4.9).

use crate::fallback::strategies::{self, FallbackInput, FallbackResult, FallbackStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    SolverTimeout,
    NoFeasibleSolution,
    MemoryExhaustion,
    CircuitBreakerOpen,
    Other,
}

impl FailureReason {
    pub fn strategy(&self) -> FallbackStrategy {
        match self {
            FailureReason::SolverTimeout => FallbackStrategy::PartialSolution,
            FailureReason::NoFeasibleSolution => FallbackStrategy::Greedy,
            FailureReason::MemoryExhaustion => FallbackStrategy::PriorityBased,
            FailureReason::CircuitBreakerOpen => FallbackStrategy::EarliestDueDate,
            FailureReason::Other => FallbackStrategy::Greedy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::SolverTimeout => "SOLVER_TIMEOUT",
            FailureReason::NoFeasibleSolution => "NO_FEASIBLE_SOLUTION",
            FailureReason::MemoryExhaustion => "MEMORY_EXHAUSTION",
            FailureReason::CircuitBreakerOpen => "CIRCUIT_BREAKER_OPEN",
            FailureReason::Other => "OTHER",
        }
    }
}

pub struct FallbackOrchestrator;

impl FallbackOrchestrator {
    /// Runs the strategy `reason` maps to; if it panics-free but still
    /// reports zero scheduled tasks while jobs were requested, returns an
    /// emergency fallback (quality_score 0.1) instead.
    pub fn run(input: &FallbackInput<'_>, reason: FailureReason) -> FallbackResult {
        let strategy = reason.strategy();
        let result = Self::run_strategy(input, strategy, reason.label());

        if !input.jobs.is_empty() && result.tasks_scheduled == 0 {
            return Self::emergency(reason.label());
        }
        result
    }

    fn run_strategy(
        input: &FallbackInput<'_>,
        strategy: FallbackStrategy,
        reason: &str,
    ) -> FallbackResult {
        match strategy {
            FallbackStrategy::Greedy => strategies::greedy(input, reason),
            FallbackStrategy::PriorityBased => strategies::priority_based(input, reason),
            FallbackStrategy::EarliestDueDate => strategies::earliest_due_date(input, reason),
            FallbackStrategy::ShortestProcessingTime => strategies::shortest_processing_time(input, reason),
            FallbackStrategy::PartialSolution => strategies::partial_solution(input, reason),
        }
    }

    fn emergency(reason: &str) -> FallbackResult {
        FallbackResult {
            schedule: None,
            strategy: FallbackStrategy::Greedy,
            reason: reason.to_string(),
            execution_time: std::time::Duration::from_secs(0),
            quality_score: 0.1,
            makespan_minutes: 0,
            total_tardiness_minutes: 0,
            jobs_scheduled: 0,
            tasks_scheduled: 0,
            warnings: vec!["emergency fallback".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_maps_to_strategy_per_spec() {
        assert_eq!(FailureReason::SolverTimeout.strategy(), FallbackStrategy::PartialSolution);
        assert_eq!(FailureReason::NoFeasibleSolution.strategy(), FallbackStrategy::Greedy);
        assert_eq!(FailureReason::MemoryExhaustion.strategy(), FallbackStrategy::PriorityBased);
        assert_eq!(FailureReason::CircuitBreakerOpen.strategy(), FallbackStrategy::EarliestDueDate);
        assert_eq!(FailureReason::Other.strategy(), FallbackStrategy::Greedy);
    }

    #[test]
    fn emergency_fallback_has_low_quality_score() {
        let result = FallbackOrchestrator::emergency("OTHER");
        assert_eq!(result.quality_score, 0.1);
        assert!(result.warnings.iter().any(|w| w == "emergency fallback"));
    }
}
