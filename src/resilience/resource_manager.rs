//! Solver resource manager (C11, §4.8 "Solver adapter", §5 "Cancellation").
//!
//! Wraps a `CpSolver` invocation with an external timeout grace period, a
//! memory-monitor task that cancels the solve on breach, and a scoped temp
//! directory removed on every exit path. Grounded on the teacher's
//! `resilience::timeout::TimeoutManager` (external deadline enforcement)
//! and `concurrency::CancelToken` (cooperative cancellation).

use crate::concurrency::CancelToken;
use crate::optimization::metrics::SolveStatus;
use crate::optimization::model::CpModel;
use crate::optimization::solver::{CpSolver, SolveParams, SolverOutcome};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// How the resource manager's own limits were enforced, layered on top of
/// whatever `SolverOutcome::status` the solve itself reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLimitOutcome {
    WithinLimits,
    MemoryExceeded,
    ForceCancelledAfterGrace,
}

#[derive(Debug)]
pub struct ManagedSolverOutcome {
    pub outcome: SolverOutcome,
    pub resource_limit: ResourceLimitOutcome,
}

/// Samples resident memory; injected so tests don't depend on real process
/// memory and non-Linux hosts degrade gracefully to "unknown" (0.0).
pub trait MemoryProbe: Send + Sync {
    fn current_rss_mb(&self) -> f64;
}

/// Reads `/proc/self/statm` (Linux). Returns 0.0 where unavailable, which
/// the monitor treats as "never exceeds" rather than an error.
#[derive(Debug, Default)]
pub struct ProcessMemoryProbe;

impl MemoryProbe for ProcessMemoryProbe {
    fn current_rss_mb(&self) -> f64 {
        let Ok(contents) = std::fs::read_to_string("/proc/self/statm") else {
            return 0.0;
        };
        let Some(pages) = contents.split_whitespace().nth(1) else {
            return 0.0;
        };
        let Ok(pages) = pages.parse::<f64>() else {
            return 0.0;
        };
        pages * 4096.0 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceManagerConfig {
    pub max_time_seconds: u64,
    pub max_memory_mb: f64,
    /// §5: "after max_time_seconds + 10s grace, the solve is force-cancelled".
    pub grace_seconds: u64,
    pub monitor_interval: Duration,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            max_time_seconds: 300,
            max_memory_mb: 4096.0,
            grace_seconds: 10,
            monitor_interval: Duration::from_secs(1),
        }
    }
}

pub struct SolverResourceManager<P: MemoryProbe = ProcessMemoryProbe> {
    config: ResourceManagerConfig,
    probe: Arc<P>,
}

impl SolverResourceManager<ProcessMemoryProbe> {
    pub fn new(config: ResourceManagerConfig) -> Self {
        Self {
            config,
            probe: Arc::new(ProcessMemoryProbe),
        }
    }
}

impl<P: MemoryProbe + 'static> SolverResourceManager<P> {
    pub fn with_probe(config: ResourceManagerConfig, probe: Arc<P>) -> Self {
        Self { config, probe }
    }

    /// Runs `solver.solve(model, params, cancel)` under a scoped temp
    /// directory and a memory-monitor task, then awaits it with an outer
    /// deadline of `max_time_seconds + grace_seconds`. The temp directory
    /// is removed when it (and this function) goes out of scope,
    /// regardless of outcome.
    pub async fn run(
        &self,
        solver: Arc<dyn CpSolver>,
        model: Arc<CpModel>,
        params: SolveParams,
    ) -> ManagedSolverOutcome {
        let _scoped_temp_dir = TempDir::new().ok();
        let cancel = CancelToken::new();
        let probe = Arc::clone(&self.probe);
        let max_memory_mb = self.config.max_memory_mb;
        let monitor_interval = self.config.monitor_interval;
        let monitor_cancel = cancel.clone();

        let memory_exceeded = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let memory_exceeded_writer = Arc::clone(&memory_exceeded);

        let monitor = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = monitor_cancel.cancelled() => break,
                    _ = tokio::time::sleep(monitor_interval) => {
                        if probe.current_rss_mb() > max_memory_mb {
                            memory_exceeded_writer.store(true, std::sync::atomic::Ordering::SeqCst);
                            monitor_cancel.cancel();
                            break;
                        }
                    }
                }
            }
        });

        let solve_cancel = cancel.clone();
        let blocking = tokio::task::spawn_blocking(move || solver.solve(&model, &params, &solve_cancel));

        let deadline = Duration::from_secs(self.config.max_time_seconds + self.config.grace_seconds);
        let resource_limit;
        let outcome = match tokio::time::timeout(deadline, blocking).await {
            Ok(Ok(outcome)) => {
                resource_limit = if memory_exceeded.load(std::sync::atomic::Ordering::SeqCst) {
                    ResourceLimitOutcome::MemoryExceeded
                } else {
                    ResourceLimitOutcome::WithinLimits
                };
                outcome
            }
            Ok(Err(_join_error)) => {
                resource_limit = ResourceLimitOutcome::ForceCancelledAfterGrace;
                SolverOutcome {
                    status: SolveStatus::Error,
                    assignments: Vec::new(),
                    metrics: crate::optimization::metrics::SolverMetrics::default(),
                    primary_objective: 0.0,
                    operator_cost_cents: 0,
                }
            }
            Err(_elapsed) => {
                cancel.cancel();
                resource_limit = ResourceLimitOutcome::ForceCancelledAfterGrace;
                SolverOutcome {
                    status: SolveStatus::Timeout,
                    assignments: Vec::new(),
                    metrics: crate::optimization::metrics::SolverMetrics::default(),
                    primary_objective: 0.0,
                    operator_cost_cents: 0,
                }
            }
        };

        cancel.cancel();
        monitor.abort();

        let outcome = if memory_exceeded.load(std::sync::atomic::Ordering::SeqCst) {
            SolverOutcome {
                status: SolveStatus::MemoryExceeded,
                ..outcome
            }
        } else {
            outcome
        };

        ManagedSolverOutcome {
            outcome,
            resource_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::BusinessCalendar;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;

    struct FixedProbe(f64);
    impl MemoryProbe for FixedProbe {
        fn current_rss_mb(&self) -> f64 {
            self.0
        }
    }

    struct InstantSolver;
    impl CpSolver for InstantSolver {
        fn solve(&self, _model: &CpModel, _params: &SolveParams, _cancel: &CancelToken) -> SolverOutcome {
            SolverOutcome {
                status: SolveStatus::Optimal,
                assignments: Vec::new(),
                metrics: crate::optimization::metrics::SolverMetrics::default(),
                primary_objective: 0.0,
                operator_cost_cents: 0,
            }
        }
    }

    struct SpinningSolver {
        checks: AtomicU32,
    }
    impl CpSolver for SpinningSolver {
        fn solve(&self, _model: &CpModel, _params: &SolveParams, cancel: &CancelToken) -> SolverOutcome {
            loop {
                self.checks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if cancel.is_cancelled() {
                    return SolverOutcome {
                        status: SolveStatus::Cancelled,
                        assignments: Vec::new(),
                        metrics: crate::optimization::metrics::SolverMetrics::default(),
                        primary_objective: 0.0,
                        operator_cost_cents: 0,
                    };
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }
    }

    fn empty_model() -> Arc<CpModel> {
        Arc::new(CpModel {
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
        })
    }

    #[tokio::test]
    async fn returns_within_limits_when_probe_stays_low() {
        let manager = SolverResourceManager::with_probe(
            ResourceManagerConfig {
                monitor_interval: Duration::from_millis(20),
                ..ResourceManagerConfig::default()
            },
            Arc::new(FixedProbe(100.0)),
        );
        let result = manager
            .run(Arc::new(InstantSolver), empty_model(), SolveParams::default())
            .await;
        assert_eq!(result.resource_limit, ResourceLimitOutcome::WithinLimits);
        assert_eq!(result.outcome.status, SolveStatus::Optimal);
    }

    #[tokio::test]
    async fn cancels_spinning_solver_when_memory_exceeds_limit() {
        let manager = SolverResourceManager::with_probe(
            ResourceManagerConfig {
                max_memory_mb: 10.0,
                monitor_interval: Duration::from_millis(10),
                max_time_seconds: 5,
                grace_seconds: 5,
                ..ResourceManagerConfig::default()
            },
            Arc::new(FixedProbe(100.0)),
        );
        let result = manager
            .run(
                Arc::new(SpinningSolver {
                    checks: AtomicU32::new(0),
                }),
                empty_model(),
                SolveParams::default(),
            )
            .await;
        assert_eq!(result.outcome.status, SolveStatus::MemoryExceeded);
        assert_eq!(result.resource_limit, ResourceLimitOutcome::MemoryExceeded);
    }
}
