//! Retry engine with configurable backoff strategies (§4.10).
//!
//! Grounded on the teacher's `resilience::retry::retry_with_backoff`,
//! generalized from a single exponential policy to the four named
//! strategies plus jitter, and extended with a `RetrySession` attempt log.

use crate::error::SchedulerError;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    FixedDelay,
    ExponentialBackoff,
    LinearBackoff,
    FibonacciBackoff,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub strategy: BackoffStrategy,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exp_base: f64,
    pub jitter_max: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::ExponentialBackoff,
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            exp_base: 2.0,
            jitter_max: Duration::from_millis(0),
        }
    }
}

impl RetryConfig {
    /// Delay before retry attempt `n` (1-indexed), capped at `max_delay`
    /// and perturbed by up to `±jitter_max` (§4.8 "Retry delay bounds").
    pub fn delay_for_attempt(&self, n: u32) -> Duration {
        let base = self.base_delay.as_secs_f64();
        let raw = match self.strategy {
            BackoffStrategy::FixedDelay => base,
            BackoffStrategy::ExponentialBackoff => base * self.exp_base.powi(n as i32 - 1),
            BackoffStrategy::LinearBackoff => base * n as f64,
            BackoffStrategy::FibonacciBackoff => base * fibonacci(n) as f64,
        };
        let capped = raw.min(self.max_delay.as_secs_f64());
        let jitter_max = self.jitter_max.as_secs_f64();
        let jitter = if jitter_max > 0.0 {
            rand::thread_rng().gen_range(-jitter_max..=jitter_max)
        } else {
            0.0
        };
        let jittered = (capped + jitter).max(0.0);
        Duration::from_secs_f64(jittered.min(self.max_delay.as_secs_f64()))
    }
}

fn fibonacci(n: u32) -> u64 {
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 1..n {
        let next = a + b;
        a = b;
        b = next;
    }
    a
}

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub duration: Duration,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

/// Per-call attempt log, surfaced for observability (§4.10 "Session records").
#[derive(Debug, Clone, Default)]
pub struct RetrySession {
    pub attempts: Vec<AttemptRecord>,
}

impl RetrySession {
    pub fn success_rate(&self) -> f64 {
        if self.attempts.is_empty() {
            return 0.0;
        }
        let successes = self.attempts.iter().filter(|a| a.succeeded).count();
        successes as f64 / self.attempts.len() as f64
    }

    pub fn average_attempts(&self) -> f64 {
        self.attempts.len() as f64
    }
}

/// Errors from this stop-list are never retried, matching §5's
/// non-retryable circuit-breaker-open/resource-exhaustion policy.
fn is_retryable(error: &SchedulerError) -> bool {
    error.is_retryable_by_default()
}

pub struct RetryEngine {
    config: RetryConfig,
}

impl RetryEngine {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Runs `f` up to `config.max_attempts` times, sleeping between
    /// attempts per the configured backoff strategy. Returns the final
    /// result alongside the full attempt log.
    pub async fn execute<F, Fut, T>(&self, mut f: F) -> (Result<T, SchedulerError>, RetrySession)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, SchedulerError>>,
    {
        let mut session = RetrySession::default();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let started = std::time::Instant::now();
            let outcome = f().await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(value) => {
                    session.attempts.push(AttemptRecord {
                        attempt,
                        duration: elapsed,
                        succeeded: true,
                        error_message: None,
                    });
                    return (Ok(value), session);
                }
                Err(err) => {
                    session.attempts.push(AttemptRecord {
                        attempt,
                        duration: elapsed,
                        succeeded: false,
                        error_message: Some(err.to_string()),
                    });

                    if attempt >= self.config.max_attempts || !is_retryable(&err) {
                        return (Err(err), session);
                    }
                    sleep(self.config.delay_for_attempt(attempt)).await;
                }
            }
        }
    }
}
