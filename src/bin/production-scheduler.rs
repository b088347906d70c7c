//! CLI entry point: loads a JSON scenario file, runs it through
//! `ScheduleService::schedule`, and prints the resulting
//! `SchedulingResult` as JSON (§12, SUPPLEMENT).

use chrono::{DateTime, Utc};
use clap::Parser;
use production_scheduler::domain::{Job, JobId, Machine, Operator};
use production_scheduler::observability::{NoopMetricsSink, TracingLogSink, TracingTracer};
use production_scheduler::optimization::solver::GreedyCpSolver;
use production_scheduler::repository::in_memory::{
    InMemoryJobRepository, InMemoryMachineRepository, InMemoryOperatorRepository,
};
use production_scheduler::repository::JobRepository;
use production_scheduler::repository::MachineRepository;
use production_scheduler::repository::OperatorRepository;
use production_scheduler::resilience::CircuitBreakerRegistry;
use production_scheduler::clock::SystemClock;
use production_scheduler::{ScheduleRequest, ScheduleService, ScheduleServiceConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "production-scheduler", about = "Run a scheduling scenario and print the result as JSON")]
struct Cli {
    /// Path to a JSON scenario file (jobs/machines/operators + horizon).
    scenario: PathBuf,

    /// Override the default solver wall-clock budget.
    #[arg(long)]
    max_time_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    jobs: Vec<Job>,
    machines: Vec<Machine>,
    #[serde(default)]
    operators: Vec<Operator>,
    horizon_start: DateTime<Utc>,
    #[serde(default = "default_horizon_days")]
    horizon_days: u32,
    #[serde(default = "default_w_primary")]
    w_primary: f64,
    #[serde(default)]
    operator_cost_cents_per_minute: HashMap<String, i64>,
}

fn default_horizon_days() -> u32 {
    14
}

fn default_w_primary() -> f64 {
    2.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let raw = std::fs::read_to_string(&cli.scenario)?;
    let scenario: Scenario = serde_json::from_str(&raw)?;

    let job_repo = Arc::new(InMemoryJobRepository::default());
    let mut job_ids = Vec::with_capacity(scenario.jobs.len());
    for job in &scenario.jobs {
        job_repo.save(job).await?;
        job_ids.push(job.id);
    }

    let machine_repo = Arc::new(InMemoryMachineRepository::default());
    for machine in &scenario.machines {
        machine_repo.save(machine).await?;
    }

    let operator_repo = Arc::new(InMemoryOperatorRepository::default());
    let mut operator_cost = HashMap::new();
    for operator in &scenario.operators {
        operator_repo.save(operator).await?;
        if let Some(cost) = scenario.operator_cost_cents_per_minute.get(&operator.id.to_string()) {
            operator_cost.insert(operator.id, *cost);
        }
    }

    let mut solve_params = ScheduleServiceConfig::default().solve_params;
    if let Some(max_time_seconds) = cli.max_time_seconds {
        solve_params.max_time_seconds = max_time_seconds;
    }

    let service = ScheduleService::new(
        job_repo,
        machine_repo,
        operator_repo,
        Arc::new(GreedyCpSolver),
        Arc::new(CircuitBreakerRegistry::new()),
        Arc::new(SystemClock),
        Arc::new(NoopMetricsSink),
        Arc::new(TracingLogSink),
        Arc::new(TracingTracer),
        ScheduleServiceConfig {
            solve_params,
            ..ScheduleServiceConfig::default()
        },
    );

    let result = service
        .schedule(ScheduleRequest {
            job_ids: dedup(job_ids),
            horizon_days: scenario.horizon_days,
            horizon_start: scenario.horizon_start,
            w_primary: scenario.w_primary,
            operator_cost_cents_per_minute: operator_cost,
        })
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn dedup(ids: Vec<JobId>) -> Vec<JobId> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
