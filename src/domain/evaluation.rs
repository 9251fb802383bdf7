//! Evaluation output types
//!
//! One `MetricScore` per configured metric, aggregated into an
//! `EvaluationResult` by weighted sum. Scores live on a 0-100 scale.

use serde::{Deserialize, Serialize};

/// One metric's verdict on a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    /// Metric name from the configuration
    pub name: String,

    /// Score in [0, 100]
    pub score: f64,

    /// Weight this metric carries in the overall score
    pub weight: f64,

    /// The metric's written justification
    pub commentary: String,
}

/// Aggregated scores for one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Weighted sum of all metric scores, kept at full precision
    pub overall_score: f64,

    /// Per-metric breakdown in configuration order
    pub scores: Vec<MetricScore>,
}

impl EvaluationResult {
    /// Aggregate per-metric scores by weighted sum.
    ///
    /// The overall score is stored at full floating-point precision;
    /// rounding happens only at display time via [`Self::display_score`].
    pub fn weighted(scores: Vec<MetricScore>) -> Self {
        let overall_score = scores.iter().map(|s| s.score * s.weight).sum();
        Self {
            overall_score,
            scores,
        }
    }

    /// Overall score rounded to two decimal places for display.
    pub fn display_score(&self) -> f64 {
        (self.overall_score * 100.0).round() / 100.0
    }
}
