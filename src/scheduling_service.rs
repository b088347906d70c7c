//! The top-level scheduling façade (§2 "Flow", §6.2).
//!
//! Wires repositories (C4), the CP model/solver/orchestrator (C9/C10), the
//! solver resource manager (C11), the circuit breaker and retry engine
//! (C13), constraint validation (C5), and graceful degradation (C14) into
//! one `schedule()` entry point producing a `SchedulingResult`.

use crate::clock::Clock;
use crate::concurrency::CancelToken;
use crate::domain::value_objects::{BusinessCalendar, TimeWindow};
use crate::domain::{Machine, MachineId, Operator, OperatorId, Schedule, ScheduleAssignment};
use crate::error::{SchedulerError, SchedulerResult};
use crate::fallback::{FailureReason, FallbackInput, FallbackOrchestrator, FallbackResult};
use crate::observability::{CorrelationId, Labels, LogLevel, LogRecord, LogSink, MetricsSink, Tracer};
use crate::optimization::metrics::{SolveStatus, SolverMetrics};
use crate::optimization::model::{CpModel, Entities, ModelBuilder, SchedulingRequest};
use crate::optimization::orchestrator::SolveOrchestrator;
use crate::optimization::solver::{CpSolver, SolveParams, TaskAssignment};
use crate::repository::{JobRepository, MachineRepository, OperatorRepository};
use crate::resilience::{
    CircuitBreakerRegistry, DegradationLevel, QualityAssessor, QualitySignals, ResourceManagerConfig,
    RetryConfig, RetryEngine, SolverResourceManager,
};
use crate::validation::{ConstraintValidationService, ValidationConfig, Violation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Request scope for one `schedule()` call: which jobs, over what horizon.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub job_ids: Vec<crate::domain::JobId>,
    pub horizon_days: u32,
    pub horizon_start: DateTime<Utc>,
    pub w_primary: f64,
    pub operator_cost_cents_per_minute: HashMap<OperatorId, i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationStatus {
    Optimal,
    Feasible,
    Infeasible,
    Timeout,
    CircuitBreakerOpen,
    FallbackSuccess,
    FallbackFailed,
    DataLoadingFailed,
}

/// Report on how a scheduling run concluded (§6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub status: OptimizationStatus,
    pub solve_time_seconds: f64,
    pub makespan_minutes: i64,
    pub total_tardiness_minutes: i64,
    pub total_cost_cents: i64,
    pub job_completions: HashMap<crate::domain::JobId, DateTime<Utc>>,
    #[serde(skip)]
    pub solver_stats: SolverMetrics,
    pub fallback_used: bool,
    pub quality_score: f64,
    pub warnings: Vec<String>,
}

/// Cost/utilization summary over the produced schedule (§6.2 `metrics`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulingMetrics {
    pub total_assignments: usize,
    pub planning_horizon_days: u32,
    pub resource_utilization: f64,
    pub cost_estimate_cents: i64,
    pub makespan_hours: Option<f64>,
    pub total_tardiness_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingResult {
    #[serde(skip)]
    pub schedule: Option<Schedule>,
    pub optimization_result: OptimizationResult,
    pub violations: Vec<Violation>,
    pub metrics: SchedulingMetrics,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScheduleServiceConfig {
    pub validation: ValidationConfig,
    pub solve_params: SolveParams,
    pub resource_manager: ResourceManagerConfig,
    pub retry: RetryConfig,
}

impl Default for ScheduleServiceConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            solve_params: SolveParams::default(),
            resource_manager: ResourceManagerConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Wires every scheduling collaborator behind one `schedule()` call.
///
/// Repositories are held as `Arc<dyn _>` so the façade is agnostic to the
/// backing store (in-memory for tests/CLI, a real adapter in production).
pub struct ScheduleService {
    jobs: Arc<dyn JobRepository>,
    machines: Arc<dyn MachineRepository>,
    operators: Arc<dyn OperatorRepository>,
    solver: Arc<dyn CpSolver>,
    breakers: Arc<CircuitBreakerRegistry>,
    clock: Arc<dyn Clock>,
    metrics_sink: Arc<dyn MetricsSink>,
    log_sink: Arc<dyn LogSink>,
    tracer: Arc<dyn Tracer>,
    config: ScheduleServiceConfig,
}

impl ScheduleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        machines: Arc<dyn MachineRepository>,
        operators: Arc<dyn OperatorRepository>,
        solver: Arc<dyn CpSolver>,
        breakers: Arc<CircuitBreakerRegistry>,
        clock: Arc<dyn Clock>,
        metrics_sink: Arc<dyn MetricsSink>,
        log_sink: Arc<dyn LogSink>,
        tracer: Arc<dyn Tracer>,
        config: ScheduleServiceConfig,
    ) -> Self {
        Self {
            jobs,
            machines,
            operators,
            solver,
            breakers,
            clock,
            metrics_sink,
            log_sink,
            tracer,
            config,
        }
    }

    fn log(&self, correlation_id: CorrelationId, level: LogLevel, operation: &str, fields: HashMap<String, String>) {
        self.log_sink.record(LogRecord {
            level,
            operation: operation.to_string(),
            correlation_id: correlation_id.to_string(),
            fields,
        });
    }

    /// Runs one scheduling request end to end: load entities, build the CP
    /// model, solve under the circuit breaker + retry engine + resource
    /// manager, validate the result, and degrade gracefully on failure.
    pub async fn schedule(&self, request: ScheduleRequest) -> SchedulingResult {
        let correlation_id = CorrelationId::new();
        let started = std::time::Instant::now();
        let mut span = self.tracer.start_span("schedule", correlation_id);
        span.set_attribute("job_count", &request.job_ids.len().to_string());

        let loaded = self.load_entities(&request).await;
        let (jobs, machines, operators) = match loaded {
            Ok(entities) => entities,
            Err(err) => {
                self.log(
                    correlation_id,
                    LogLevel::Error,
                    "schedule.load_entities",
                    HashMap::from([("error".to_string(), err.to_string())]),
                );
                span.record_exception(&err.to_string());
                span.close();
                return data_loading_failed(&request, err);
            }
        };

        let model = ModelBuilder::build(
            &SchedulingRequest {
                job_ids: request.job_ids.clone(),
                horizon_days: request.horizon_days,
                horizon_start: request.horizon_start,
                w_primary: request.w_primary,
                operator_cost_cents_per_minute: request.operator_cost_cents_per_minute.clone(),
            },
            &Entities {
                jobs: &jobs,
                machines: &machines,
                operators: &operators,
            },
        );

        let solve_outcome = self.solve_under_resilience(&model, correlation_id).await;

        let result = match solve_outcome {
            Ok(outcome) if matches!(outcome.status, SolveStatus::Optimal | SolveStatus::Feasible) => {
                self.metrics_sink.increment_counter(
                    "scheduler_solves_total",
                    &Labels::from([("status".to_string(), outcome.status.to_string())]),
                    1,
                );
                self.succeed(&request, &jobs, &machines, &operators, outcome, started.elapsed())
            }
            Ok(outcome) => {
                self.log(
                    correlation_id,
                    LogLevel::Warn,
                    "schedule.solve_infeasible",
                    HashMap::from([("status".to_string(), outcome.status.to_string())]),
                );
                self.degrade(
                    &request,
                    &jobs,
                    &machines,
                    &operators,
                    failure_reason_for(outcome.status),
                    Vec::new(),
                    started.elapsed(),
                )
            }
            Err(err) => {
                self.log(
                    correlation_id,
                    LogLevel::Warn,
                    "schedule.circuit_breaker_open",
                    HashMap::from([("error".to_string(), err.to_string())]),
                );
                self.degrade(
                    &request,
                    &jobs,
                    &machines,
                    &operators,
                    FailureReason::CircuitBreakerOpen,
                    Vec::new(),
                    started.elapsed(),
                )
            }
        };

        span.set_attribute("status", &format!("{:?}", result.optimization_result.status));
        span.close();
        result
    }

    async fn load_entities(
        &self,
        request: &ScheduleRequest,
    ) -> SchedulerResult<(
        HashMap<crate::domain::JobId, crate::domain::Job>,
        HashMap<MachineId, Machine>,
        HashMap<OperatorId, Operator>,
    )> {
        let mut jobs = HashMap::new();
        for job_id in &request.job_ids {
            let job = self
                .jobs
                .find_by_id(*job_id)
                .await?
                .ok_or_else(|| SchedulerError::not_found("job", job_id.to_string()))?;
            jobs.insert(*job_id, job);
        }
        let machines = self
            .machines
            .find_all()
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let operators = self
            .operators
            .find_all()
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();
        Ok((jobs, machines, operators))
    }

    /// Runs the hierarchical solve behind the `solver` circuit breaker and
    /// retry engine, itself wrapped by the resource manager's outer
    /// deadline/memory enforcement (§4.10, §5, §4.8).
    async fn solve_under_resilience(
        &self,
        model: &CpModel,
        correlation_id: CorrelationId,
    ) -> SchedulerResult<crate::optimization::solver::SolverOutcome> {
        let breaker = self.breakers.get_or_default("solver");
        let state_before = breaker.state();
        let retry = RetryEngine::new(self.config.retry.clone());
        let resource_manager = SolverResourceManager::new(self.config.resource_manager.clone());
        let hierarchical_solver: Arc<dyn CpSolver> = Arc::new(HierarchicalSolver {
            inner: Arc::clone(&self.solver),
        });
        let params = self.config.solve_params.clone();
        let model = Arc::new(model.clone());

        let (result, session) = retry
            .execute(|| {
                let breaker = Arc::clone(&breaker);
                let solver = Arc::clone(&hierarchical_solver);
                let model = Arc::clone(&model);
                let params = params.clone();
                let resource_manager = &resource_manager;
                async move {
                    breaker
                        .execute(|| async move {
                            let managed = resource_manager.run(solver, model, params).await;
                            if matches!(
                                managed.outcome.status,
                                SolveStatus::Error | SolveStatus::MemoryExceeded
                            ) {
                                return Err(SchedulerError::Optimization(format!(
                                    "solver reported {}",
                                    managed.outcome.status
                                )));
                            }
                            Ok(managed.outcome)
                        })
                        .await
                }
            })
            .await;

        self.log(
            correlation_id,
            LogLevel::Info,
            "schedule.retry_session",
            HashMap::from([
                ("attempts".to_string(), session.attempts.len().to_string()),
                ("success_rate".to_string(), session.success_rate().to_string()),
            ]),
        );

        let state_after = breaker.state();
        if state_after != state_before {
            self.log(
                correlation_id,
                LogLevel::Warn,
                "schedule.circuit_breaker_state_change",
                HashMap::from([
                    ("service".to_string(), breaker.name().to_string()),
                    ("from".to_string(), format!("{state_before:?}")),
                    ("to".to_string(), format!("{state_after:?}")),
                ]),
            );
        }
        for (service, value) in self.breakers.states() {
            self.metrics_sink.set_gauge(
                "scheduler_circuit_breaker_state",
                &Labels::from([("service".to_string(), service)]),
                value,
            );
        }

        result
    }

    /// Builds and validates a DRAFT schedule from a successful solver
    /// outcome; returns OPTIMAL/FEASIBLE/INFEASIBLE per the validator.
    fn succeed(
        &self,
        request: &ScheduleRequest,
        jobs: &HashMap<crate::domain::JobId, crate::domain::Job>,
        machines: &HashMap<MachineId, Machine>,
        operators: &HashMap<OperatorId, Operator>,
        outcome: crate::optimization::solver::SolverOutcome,
        elapsed: std::time::Duration,
    ) -> SchedulingResult {
        let now = self.clock.now();
        let horizon = TimeWindow::new(
            request.horizon_start,
            request.horizon_start + chrono::Duration::days(request.horizon_days as i64),
        )
        .unwrap_or_else(|_| TimeWindow::new(request.horizon_start, request.horizon_start).expect("zero-length window"));
        let mut schedule = Schedule::new("scheduling-run".to_string(), horizon, now);
        apply_assignments(&mut schedule, &outcome.assignments);

        let tasks = task_lookup(jobs);
        let validator = ConstraintValidationService::new(
            self.config.validation.clone(),
            BusinessCalendar::default_calendar(),
            self.clock.clone(),
        );
        let violations = validator.validate(&schedule, jobs, &tasks, machines, operators);

        let status = if violations.is_empty() {
            if outcome.status == SolveStatus::Optimal {
                OptimizationStatus::Optimal
            } else {
                OptimizationStatus::Feasible
            }
        } else {
            OptimizationStatus::Infeasible
        };

        let job_completions = job_completion_times(jobs, &schedule);
        let (makespan, tardiness) = makespan_and_tardiness(request.horizon_start, jobs, &schedule);
        let utilization = resource_utilization(&schedule, machines, operators, request.horizon_days);
        let signals = QualitySignals {
            completion_rate: completion_rate(jobs, &schedule),
            makespan_score: 1.0 - (makespan as f64 / request.horizon_days.max(1) as f64 / (24.0 * 60.0)).min(1.0),
            tardiness_score: 1.0 - (tardiness as f64 / (7.0 * 24.0 * 60.0)).min(1.0),
            utilization_score: utilization,
            violation_score: if violations.is_empty() { 1.0 } else { 0.0 },
            response_time_seconds: elapsed.as_secs_f64(),
        };
        let assessment = QualityAssessor::assess(signals);

        SchedulingResult {
            metrics: SchedulingMetrics {
                total_assignments: schedule.assignments().count(),
                planning_horizon_days: request.horizon_days,
                resource_utilization: utilization,
                cost_estimate_cents: outcome.operator_cost_cents,
                makespan_hours: Some(makespan as f64 / 60.0),
                total_tardiness_hours: Some(tardiness as f64 / 60.0),
            },
            optimization_result: OptimizationResult {
                status,
                solve_time_seconds: elapsed.as_secs_f64(),
                makespan_minutes: makespan,
                total_tardiness_minutes: tardiness,
                total_cost_cents: outcome.operator_cost_cents,
                job_completions,
                solver_stats: outcome.metrics,
                fallback_used: false,
                quality_score: assessment.overall_score,
                warnings: Vec::new(),
            },
            recommendations: recommendations_for(status, &violations),
            violations,
            schedule: Some(schedule),
        }
    }

    /// Routes a solver failure through the fallback orchestrator, then
    /// scores and classifies the result via the degradation manager (§4.11).
    fn degrade(
        &self,
        request: &ScheduleRequest,
        jobs: &HashMap<crate::domain::JobId, crate::domain::Job>,
        machines: &HashMap<MachineId, Machine>,
        operators: &HashMap<OperatorId, Operator>,
        reason: FailureReason,
        partial_assignments: Vec<TaskAssignment>,
        elapsed: std::time::Duration,
    ) -> SchedulingResult {
        let job_refs: Vec<&crate::domain::Job> = jobs.values().collect();
        let input = FallbackInput {
            jobs: job_refs,
            machines,
            operators,
            horizon_start: request.horizon_start,
            partial_assignments,
        };
        let fallback = FallbackOrchestrator::run(&input, reason);

        let now = self.clock.now();
        let horizon = TimeWindow::new(
            request.horizon_start,
            request.horizon_start + chrono::Duration::days(request.horizon_days as i64),
        )
        .unwrap_or_else(|_| TimeWindow::new(request.horizon_start, request.horizon_start).expect("zero-length window"));
        let mut schedule = Schedule::new("scheduling-run-fallback".to_string(), horizon, now);
        if let Some(assignments) = &fallback.schedule {
            apply_assignments(&mut schedule, assignments);
        }

        let tasks = task_lookup(jobs);
        let validator = ConstraintValidationService::new(
            self.config.validation.clone(),
            BusinessCalendar::default_calendar(),
            self.clock.clone(),
        );
        let violations = validator.validate(&schedule, jobs, &tasks, machines, operators);

        let signals = QualitySignals {
            completion_rate: if jobs.is_empty() {
                0.0
            } else {
                fallback.jobs_scheduled as f64 / jobs.len() as f64
            },
            makespan_score: 1.0 - (fallback.makespan_minutes as f64 / (7.0 * 24.0 * 60.0)).min(1.0),
            tardiness_score: 1.0 - (fallback.total_tardiness_minutes as f64 / (7.0 * 24.0 * 60.0)).min(1.0),
            utilization_score: resource_utilization(&schedule, machines, operators, request.horizon_days),
            violation_score: if violations.is_empty() { 1.0 } else { 0.0 },
            response_time_seconds: elapsed.as_secs_f64(),
        };
        let assessment = QualityAssessor::assess(signals);
        let quality_score = fallback.quality_score.min(assessment.overall_score.max(fallback.quality_score));

        let status = if assessment.level == DegradationLevel::Unavailable || fallback.schedule.is_none() {
            OptimizationStatus::FallbackFailed
        } else if reason == FailureReason::CircuitBreakerOpen {
            OptimizationStatus::CircuitBreakerOpen
        } else {
            OptimizationStatus::FallbackSuccess
        };

        let job_completions = job_completion_times(jobs, &schedule);

        self.metrics_sink.increment_counter(
            "scheduler_fallbacks_total",
            &Labels::from([("strategy".to_string(), fallback.strategy.to_string())]),
            1,
        );

        SchedulingResult {
            metrics: SchedulingMetrics {
                total_assignments: schedule.assignments().count(),
                planning_horizon_days: request.horizon_days,
                resource_utilization: signals.utilization_score,
                cost_estimate_cents: 0,
                makespan_hours: Some(fallback.makespan_minutes as f64 / 60.0),
                total_tardiness_hours: Some(fallback.total_tardiness_minutes as f64 / 60.0),
            },
            optimization_result: OptimizationResult {
                status,
                solve_time_seconds: elapsed.as_secs_f64(),
                makespan_minutes: fallback.makespan_minutes,
                total_tardiness_minutes: fallback.total_tardiness_minutes,
                total_cost_cents: 0,
                job_completions,
                solver_stats: SolverMetrics::default(),
                fallback_used: true,
                quality_score,
                warnings: fallback.warnings.clone(),
            },
            recommendations: recommendations_for(status, &violations),
            violations,
            schedule: Some(schedule),
        }
    }
}

/// Adapts the hierarchical two-phase orchestrator to the plain `CpSolver`
/// seam the resource manager wraps, so timeout/memory enforcement covers
/// both phases as a single bounded unit.
struct HierarchicalSolver {
    inner: Arc<dyn CpSolver>,
}

impl CpSolver for HierarchicalSolver {
    fn solve(
        &self,
        model: &CpModel,
        params: &SolveParams,
        cancel: &CancelToken,
    ) -> crate::optimization::solver::SolverOutcome {
        SolveOrchestrator::new(self.inner.as_ref())
            .solve_hierarchical(model, params, cancel)
            .chosen()
            .clone()
    }
}

fn data_loading_failed(request: &ScheduleRequest, err: SchedulerError) -> SchedulingResult {
    SchedulingResult {
        schedule: None,
        optimization_result: OptimizationResult {
            status: OptimizationStatus::DataLoadingFailed,
            solve_time_seconds: 0.0,
            makespan_minutes: 0,
            total_tardiness_minutes: 0,
            total_cost_cents: 0,
            job_completions: HashMap::new(),
            solver_stats: SolverMetrics::default(),
            fallback_used: false,
            quality_score: 0.0,
            warnings: vec![err.to_string()],
        },
        violations: Vec::new(),
        metrics: SchedulingMetrics {
            total_assignments: 0,
            planning_horizon_days: request.horizon_days,
            resource_utilization: 0.0,
            cost_estimate_cents: 0,
            makespan_hours: None,
            total_tardiness_hours: None,
        },
        recommendations: vec!["resolve data loading error and retry".to_string()],
    }
}

fn failure_reason_for(status: SolveStatus) -> FailureReason {
    match status {
        SolveStatus::Timeout => FailureReason::SolverTimeout,
        SolveStatus::Infeasible => FailureReason::NoFeasibleSolution,
        SolveStatus::MemoryExceeded => FailureReason::MemoryExhaustion,
        SolveStatus::Cancelled => FailureReason::Other,
        _ => FailureReason::Other,
    }
}

fn apply_assignments(schedule: &mut Schedule, assignments: &[TaskAssignment]) {
    for assignment in assignments {
        let Ok(window) = TimeWindow::new(assignment.start, assignment.end) else {
            continue;
        };
        // schedule is always a fresh DRAFT here, so upsert cannot fail.
        let _ = schedule.upsert_assignment(ScheduleAssignment {
            task_id: assignment.task_id,
            job_id: assignment.job_id,
            machine_id: assignment.machine_id,
            operator_ids: assignment.operator_ids.clone(),
            window,
        });
    }
}

fn task_lookup(
    jobs: &HashMap<crate::domain::JobId, crate::domain::Job>,
) -> HashMap<crate::domain::TaskId, crate::domain::Task> {
    jobs.values().flat_map(|j| j.tasks().map(|t| (t.id, t.clone()))).collect()
}

fn job_completion_times(
    jobs: &HashMap<crate::domain::JobId, crate::domain::Job>,
    schedule: &Schedule,
) -> HashMap<crate::domain::JobId, DateTime<Utc>> {
    let mut completions = HashMap::new();
    for job_id in jobs.keys() {
        if let Some(end) = schedule
            .assignments()
            .filter(|a| a.job_id == *job_id)
            .map(|a| a.window.end)
            .max()
        {
            completions.insert(*job_id, end);
        }
    }
    completions
}

fn makespan_and_tardiness(
    horizon_start: DateTime<Utc>,
    jobs: &HashMap<crate::domain::JobId, crate::domain::Job>,
    schedule: &Schedule,
) -> (i64, i64) {
    let makespan = schedule
        .assignments()
        .map(|a| (a.window.end - horizon_start).num_minutes())
        .max()
        .unwrap_or(0);
    let mut tardiness = 0i64;
    for job in jobs.values() {
        if let Some(completion) = schedule
            .assignments()
            .filter(|a| a.job_id == job.id)
            .map(|a| a.window.end)
            .max()
        {
            tardiness += (completion - job.due_date).num_minutes().max(0);
        }
    }
    (makespan, tardiness)
}

fn completion_rate(jobs: &HashMap<crate::domain::JobId, crate::domain::Job>, schedule: &Schedule) -> f64 {
    let total_tasks: usize = jobs.values().map(|j| j.tasks().count()).sum();
    if total_tasks == 0 {
        return 0.0;
    }
    schedule.assignments().count() as f64 / total_tasks as f64
}

/// Crude machine-minutes-booked / machine-minutes-available ratio.
fn resource_utilization(
    schedule: &Schedule,
    machines: &HashMap<MachineId, Machine>,
    _operators: &HashMap<OperatorId, Operator>,
    horizon_days: u32,
) -> f64 {
    let available_minutes = horizon_days as f64 * 24.0 * 60.0 * machines.len().max(1) as f64;
    if available_minutes <= 0.0 {
        return 0.0;
    }
    let booked_minutes: f64 = schedule
        .assignments()
        .map(|a| (a.window.end - a.window.start).num_minutes() as f64)
        .sum();
    (booked_minutes / available_minutes).min(1.0)
}

fn recommendations_for(status: OptimizationStatus, violations: &[Violation]) -> Vec<String> {
    let mut recs = Vec::new();
    match status {
        OptimizationStatus::Infeasible => {
            recs.push("resolve reported constraint violations before publishing".to_string());
        }
        OptimizationStatus::FallbackSuccess | OptimizationStatus::CircuitBreakerOpen => {
            recs.push("schedule produced by a fallback heuristic; re-run the solver once capacity recovers".to_string());
        }
        OptimizationStatus::FallbackFailed | OptimizationStatus::DataLoadingFailed => {
            recs.push("scheduling did not produce a usable result; escalate for manual intervention".to_string());
        }
        OptimizationStatus::Optimal | OptimizationStatus::Feasible | OptimizationStatus::Timeout => {}
    }
    if !violations.is_empty() {
        recs.push(format!("{} constraint violation(s) present", violations.len()));
    }
    recs
}
