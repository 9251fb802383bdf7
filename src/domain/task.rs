//! Task input type

use serde::{Deserialize, Serialize};

/// The shared instruction every team competes on.
///
/// Immutable for the whole execution: teams never see each other's
/// submissions, only this task plus their own judge feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Free-text instruction describing the work
    pub instruction: String,

    /// Optional feedback carried over from an earlier execution,
    /// handed to every team as round-one feedback
    pub seed_feedback: Option<String>,
}

impl Task {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            seed_feedback: None,
        }
    }

    pub fn with_seed_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.seed_feedback = Some(feedback.into());
        self
    }
}
