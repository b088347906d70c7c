//! Hierarchical two-phase solve driver (§4.8 "Hierarchical solve", §4.9).
//!
//! Phase 1 minimizes `primary` (weighted tardiness plus makespan). Phase 2
//! re-solves biased toward lower operator cost, accepted only if its
//! `primary` stays within `tolerance` of Phase 1's; otherwise Phase 1's
//! solution is kept.

use crate::optimization::model::CpModel;
use crate::optimization::solver::{CpSolver, SolveParams, SolverOutcome};
use crate::concurrency::CancelToken;

#[derive(Debug, Clone)]
pub struct HierarchicalSolveOutcome {
    pub phase1: SolverOutcome,
    /// Present when Phase 2 ran and its bound-check passed.
    pub phase2: Option<SolverOutcome>,
    pub accepted_phase: u8,
}

impl HierarchicalSolveOutcome {
    pub fn chosen(&self) -> &SolverOutcome {
        match (&self.phase2, self.accepted_phase) {
            (Some(outcome), 2) => outcome,
            _ => &self.phase1,
        }
    }
}

pub struct SolveOrchestrator<'a> {
    solver: &'a dyn CpSolver,
}

impl<'a> SolveOrchestrator<'a> {
    pub fn new(solver: &'a dyn CpSolver) -> Self {
        Self { solver }
    }

    /// Runs Phase 1, then attempts Phase 2 bounded by `params.tolerance` on
    /// top of Phase 1's `primary_objective`. Falls back to Phase 1 whenever
    /// Phase 2 is infeasible, times out, is cancelled, or regresses past
    /// the bound.
    pub fn solve_hierarchical(
        &self,
        model: &CpModel,
        params: &SolveParams,
        cancel: &CancelToken,
    ) -> HierarchicalSolveOutcome {
        let phase1 = self.solver.solve(model, params, cancel);

        if !matches!(
            phase1.status,
            crate::optimization::metrics::SolveStatus::Optimal
                | crate::optimization::metrics::SolveStatus::Feasible
        ) {
            return HierarchicalSolveOutcome {
                phase1,
                phase2: None,
                accepted_phase: 1,
            };
        }

        if cancel.is_cancelled() {
            return HierarchicalSolveOutcome {
                phase1,
                phase2: None,
                accepted_phase: 1,
            };
        }

        let bound = phase1.primary_objective * (1.0 + params.tolerance);
        let mut phase2_params = params.clone();
        phase2_params.prefer_low_cost_operators = true;

        let phase2 = self.solver.solve(model, &phase2_params, cancel);
        let phase2_ok = matches!(
            phase2.status,
            crate::optimization::metrics::SolveStatus::Optimal
                | crate::optimization::metrics::SolveStatus::Feasible
        ) && phase2.primary_objective <= bound
            && phase2.operator_cost_cents <= phase1.operator_cost_cents;

        if phase2_ok {
            HierarchicalSolveOutcome {
                phase1,
                phase2: Some(phase2),
                accepted_phase: 2,
            }
        } else {
            HierarchicalSolveOutcome {
                phase1,
                phase2: Some(phase2),
                accepted_phase: 1,
            }
        }
    }

    /// Single-phase mode: minimizes `w_primary * primary + operator_cost`
    /// directly in one solve, skipping the bounded second pass.
    pub fn solve_single_phase(
        &self,
        model: &CpModel,
        params: &SolveParams,
        cancel: &CancelToken,
    ) -> SolverOutcome {
        self.solver.solve(model, params, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::metrics::{SolveStatus, SolverMetrics};
    use crate::optimization::solver::TaskAssignment;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A stub solver returning a fixed primary/cost pair per call, used to
    /// exercise the orchestrator's accept/reject logic without a real model.
    struct StubSolver {
        calls: AtomicUsize,
        primaries: Vec<f64>,
        costs: Vec<i64>,
    }

    impl CpSolver for StubSolver {
        fn solve(&self, _model: &CpModel, _params: &SolveParams, _cancel: &CancelToken) -> SolverOutcome {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            SolverOutcome {
                status: SolveStatus::Optimal,
                assignments: Vec::<TaskAssignment>::new(),
                metrics: SolverMetrics::default(),
                primary_objective: self.primaries[call.min(self.primaries.len() - 1)],
                operator_cost_cents: self.costs[call.min(self.costs.len() - 1)],
            }
        }
    }

    fn empty_model() -> CpModel {
        use crate::domain::value_objects::BusinessCalendar;
        use std::collections::HashMap;
        CpModel {
            horizon_minutes: 0,
            base_time: chrono::Utc::now(),
            task_options: vec![],
            precedence: vec![],
            due_minutes: HashMap::new(),
            job_priority_rank: HashMap::new(),
            wip_zones: vec![],
            critical_sequences: vec![],
            w_primary: 2.0,
            calendar: BusinessCalendar::default_calendar(),
            operators: vec![],
            operator_cost_cents_per_minute: HashMap::new(),
        }
    }

    #[test]
    fn accepts_phase2_when_within_tolerance_and_cheaper() {
        let solver = StubSolver {
            calls: AtomicUsize::new(0),
            primaries: vec![100.0, 105.0],
            costs: vec![500, 300],
        };
        let orchestrator = SolveOrchestrator::new(&solver);
        let model = empty_model();
        let params = SolveParams::default();
        let cancel = CancelToken::new();

        let outcome = orchestrator.solve_hierarchical(&model, &params, &cancel);
        assert_eq!(outcome.accepted_phase, 2);
        assert_eq!(outcome.chosen().operator_cost_cents, 300);
    }

    #[test]
    fn falls_back_to_phase1_when_phase2_exceeds_bound() {
        let solver = StubSolver {
            calls: AtomicUsize::new(0),
            primaries: vec![100.0, 200.0],
            costs: vec![500, 100],
        };
        let orchestrator = SolveOrchestrator::new(&solver);
        let model = empty_model();
        let params = SolveParams::default();
        let cancel = CancelToken::new();

        let outcome = orchestrator.solve_hierarchical(&model, &params, &cancel);
        assert_eq!(outcome.accepted_phase, 1);
        assert_eq!(outcome.chosen().operator_cost_cents, 500);
    }
}
