//! Submission evaluation - weighted sequential metrics
//!
//! This module provides:
//! - Metric trait for scoring one quality dimension
//! - Evaluator running metrics in order and aggregating a weighted score

pub mod metric;
pub mod pipeline;

pub use metric::{Metric, MetricError, MetricOutcome};
pub use pipeline::{EvaluationError, Evaluator, MetricBinding};
