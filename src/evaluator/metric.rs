//! Scoring metric seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Task;
use crate::llm::LlmError;

/// Errors from a single metric call.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Metric response parsing failed: {0}")]
    Parse(String),

    #[error("Metric backend error: {0}")]
    Backend(String),
}

impl MetricError {
    /// Whether retrying the same call could succeed.
    ///
    /// Parse failures are retryable: the same model, asked again, usually
    /// emits valid JSON.
    pub fn is_retryable(&self) -> bool {
        match self {
            MetricError::Llm(e) => e.is_retryable(),
            MetricError::Parse(_) => true,
            MetricError::Backend(_) => true,
        }
    }
}

/// One metric's verdict on a submission, before weighting.
#[derive(Debug, Clone)]
pub struct MetricOutcome {
    /// Score in [0, 100]
    pub score: f64,
    /// What drove the score and what to improve
    pub commentary: String,
}

/// Scores one quality dimension of a submission.
#[async_trait]
pub trait Metric: Send + Sync {
    /// Score the submission against this metric's dimension.
    async fn score(&self, task: &Task, submission: &str) -> Result<MetricOutcome, MetricError>;
}
