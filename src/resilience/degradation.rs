//! Graceful degradation manager (C14, §4.11).
//!
//! On solver failure: try partial-solution extraction, else invoke the
//! fallback orchestrator, then score the result's quality and classify it
//! into a degradation level with its own operational limits.

use crate::fallback::strategies::FallbackResult;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DegradationLevel {
    Unavailable,
    Emergency,
    Minimal,
    Low,
    Medium,
    High,
    FullService,
}

impl DegradationLevel {
    /// Classifies an overall quality score into a level per §4.11's
    /// thresholds (FULL_SERVICE >= 0.95 down to EMERGENCY > 0).
    pub fn classify(score: f64) -> Self {
        if score >= 0.95 {
            DegradationLevel::FullService
        } else if score >= 0.80 {
            DegradationLevel::High
        } else if score >= 0.60 {
            DegradationLevel::Medium
        } else if score >= 0.40 {
            DegradationLevel::Low
        } else if score >= 0.20 {
            DegradationLevel::Minimal
        } else if score > 0.0 {
            DegradationLevel::Emergency
        } else {
            DegradationLevel::Unavailable
        }
    }

    /// Operational limits this level permits (§4.11 "operational limits").
    pub fn limits(&self) -> OperationalLimits {
        match self {
            DegradationLevel::FullService => OperationalLimits {
                max_execution_time: Duration::from_secs(300),
                memory_mb: 4096.0,
                cpu_percent: 100.0,
                allowed_violation_categories: vec![],
            },
            DegradationLevel::High => OperationalLimits {
                max_execution_time: Duration::from_secs(180),
                memory_mb: 3072.0,
                cpu_percent: 90.0,
                allowed_violation_categories: vec![],
            },
            DegradationLevel::Medium => OperationalLimits {
                max_execution_time: Duration::from_secs(90),
                memory_mb: 2048.0,
                cpu_percent: 75.0,
                allowed_violation_categories: vec!["WIP_LIMIT_EXCEEDED".to_string()],
            },
            DegradationLevel::Low => OperationalLimits {
                max_execution_time: Duration::from_secs(60),
                memory_mb: 1024.0,
                cpu_percent: 60.0,
                allowed_violation_categories: vec![
                    "WIP_LIMIT_EXCEEDED".to_string(),
                    "CRITICAL_SEQUENCE_OVERLAP".to_string(),
                ],
            },
            DegradationLevel::Minimal => OperationalLimits {
                max_execution_time: Duration::from_secs(30),
                memory_mb: 512.0,
                cpu_percent: 40.0,
                allowed_violation_categories: vec![
                    "WIP_LIMIT_EXCEEDED".to_string(),
                    "CRITICAL_SEQUENCE_OVERLAP".to_string(),
                    "BUSINESS_HOURS_VIOLATION".to_string(),
                ],
            },
            DegradationLevel::Emergency => OperationalLimits {
                max_execution_time: Duration::from_secs(10),
                memory_mb: 256.0,
                cpu_percent: 25.0,
                allowed_violation_categories: vec![
                    "WIP_LIMIT_EXCEEDED".to_string(),
                    "CRITICAL_SEQUENCE_OVERLAP".to_string(),
                    "BUSINESS_HOURS_VIOLATION".to_string(),
                    "RESOURCE_DOUBLE_BOOKING".to_string(),
                ],
            },
            DegradationLevel::Unavailable => OperationalLimits {
                max_execution_time: Duration::from_secs(0),
                memory_mb: 0.0,
                cpu_percent: 0.0,
                allowed_violation_categories: vec![],
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationalLimits {
    pub max_execution_time: Duration,
    pub memory_mb: f64,
    pub cpu_percent: f64,
    pub allowed_violation_categories: Vec<String>,
}

/// Weighted inputs to the overall quality score (§4.11 "Quality assessor").
#[derive(Debug, Clone, Copy)]
pub struct QualitySignals {
    pub completion_rate: f64,
    pub makespan_score: f64,
    pub tardiness_score: f64,
    pub utilization_score: f64,
    pub violation_score: f64,
    pub response_time_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct QualityAssessment {
    pub overall_score: f64,
    pub level: DegradationLevel,
    pub signals: QualitySignals,
}

pub struct QualityAssessor;

impl QualityAssessor {
    /// `response_time` scores 1.0 at <=30s, decaying linearly to 0.0 at 300s.
    pub fn response_time_score(response_time_seconds: f64) -> f64 {
        if response_time_seconds <= 30.0 {
            1.0
        } else if response_time_seconds >= 300.0 {
            0.0
        } else {
            1.0 - (response_time_seconds - 30.0) / (300.0 - 30.0)
        }
    }

    pub fn assess(signals: QualitySignals) -> QualityAssessment {
        let response_score = Self::response_time_score(signals.response_time_seconds);
        let overall_score = signals.completion_rate * 0.30
            + signals.makespan_score * 0.20
            + signals.tardiness_score * 0.20
            + signals.utilization_score * 0.15
            + signals.violation_score * 0.10
            + response_score * 0.05;
        QualityAssessment {
            overall_score,
            level: DegradationLevel::classify(overall_score),
            signals,
        }
    }
}

/// The degradation manager's decision surface: a fallback result paired
/// with the quality assessment that classified it (§4.11 step 4).
#[derive(Debug, Clone)]
pub struct DegradedResult {
    pub fallback: Option<FallbackResult>,
    pub assessment: QualityAssessment,
}
