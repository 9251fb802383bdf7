//! Weighted sequential evaluation pipeline.
//!
//! Metrics run strictly in declared order, one at a time. Scores are
//! combined as a weighted sum; there is no short-circuiting on a low
//! score, only on a metric that fails outright.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, WEIGHT_SUM_TOLERANCE};
use crate::domain::{EvaluationResult, MetricScore, Task};
use crate::evaluator::metric::{Metric, MetricOutcome};
use crate::retry::RetryPolicy;

/// Errors from evaluating one submission.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Task instruction is empty")]
    EmptyTask,

    #[error("Submission is empty")]
    EmptySubmission,

    #[error("Metric '{name}' failed after {attempts} attempt(s): {detail}")]
    MetricFailed {
        name: String,
        attempts: u32,
        detail: String,
    },
}

/// A metric with its position in the weighting scheme.
pub struct MetricBinding {
    pub name: String,
    pub weight: f64,
    pub metric: Arc<dyn Metric>,
}

impl MetricBinding {
    pub fn new(name: impl Into<String>, weight: f64, metric: Arc<dyn Metric>) -> Self {
        Self {
            name: name.into(),
            weight,
            metric,
        }
    }
}

/// Scores submissions against a fixed set of weighted metrics.
///
/// Weights are validated at construction, so a misconfigured evaluator
/// never exists: every [`Evaluator`] in the system has weights summing
/// to 1.0 within tolerance.
pub struct Evaluator {
    metrics: Vec<MetricBinding>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field(
                "metrics",
                &self
                    .metrics
                    .iter()
                    .map(|b| (b.name.as_str(), b.weight))
                    .collect::<Vec<_>>(),
            )
            .field("retry", &self.retry)
            .finish()
    }
}

impl Evaluator {
    pub fn new(metrics: Vec<MetricBinding>, retry: RetryPolicy) -> Result<Self, ConfigError> {
        if metrics.is_empty() {
            return Err(ConfigError::NoMetrics);
        }
        for binding in &metrics {
            if !binding.weight.is_finite() || binding.weight <= 0.0 || binding.weight > 1.0 {
                return Err(ConfigError::InvalidWeight {
                    name: binding.name.clone(),
                    weight: binding.weight,
                });
            }
        }
        let sum: f64 = metrics.iter().map(|b| b.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeightSum { sum });
        }

        Ok(Self { metrics, retry })
    }

    /// Score a submission against every metric, in declared order.
    ///
    /// A metric that keeps failing past its retry budget fails the whole
    /// evaluation; no partial result is returned.
    pub async fn evaluate(
        &self,
        task: &Task,
        submission: &str,
    ) -> Result<EvaluationResult, EvaluationError> {
        if task.instruction.trim().is_empty() {
            return Err(EvaluationError::EmptyTask);
        }
        if submission.trim().is_empty() {
            return Err(EvaluationError::EmptySubmission);
        }

        let mut scores = Vec::with_capacity(self.metrics.len());
        for binding in &self.metrics {
            let score = self.score_metric(binding, task, submission).await?;
            debug!(metric = %score.name, score = score.score, "metric scored");
            scores.push(score);
        }

        Ok(EvaluationResult::weighted(scores))
    }

    async fn score_metric(
        &self,
        binding: &MetricBinding,
        task: &Task,
        submission: &str,
    ) -> Result<MetricScore, EvaluationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match binding.metric.score(task, submission).await {
                Ok(outcome) => match check_outcome(&outcome) {
                    Ok(()) => {
                        return Ok(MetricScore {
                            name: binding.name.clone(),
                            score: outcome.score,
                            weight: binding.weight,
                            commentary: outcome.commentary,
                        });
                    }
                    // Malformed output counts against the retry budget
                    Err(problem) => problem,
                },
                Err(e) if e.is_retryable() => e.to_string(),
                Err(e) => {
                    return Err(EvaluationError::MetricFailed {
                        name: binding.name.clone(),
                        attempts: attempt,
                        detail: e.to_string(),
                    });
                }
            };

            if attempt >= self.retry.max_attempts() {
                return Err(EvaluationError::MetricFailed {
                    name: binding.name.clone(),
                    attempts: attempt,
                    detail: failure,
                });
            }

            warn!(
                metric = %binding.name,
                attempt,
                error = %failure,
                "metric call failed, retrying"
            );
            tokio::time::sleep(self.retry.delay_for(attempt)).await;
        }
    }
}

/// Shape checks on a metric outcome. Violations are retried like any
/// other malformed response.
fn check_outcome(outcome: &MetricOutcome) -> Result<(), String> {
    if !outcome.score.is_finite() || !(0.0..=100.0).contains(&outcome.score) {
        return Err(format!("score {} outside [0, 100]", outcome.score));
    }
    if outcome.commentary.trim().is_empty() {
        return Err("empty commentary".to_string());
    }
    Ok(())
}
