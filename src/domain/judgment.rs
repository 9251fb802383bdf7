//! Judgment decision type

use serde::{Deserialize, Serialize};

/// The judge's verdict on a team's round history.
///
/// `reasoning` doubles as the feedback handed to the producer when the
/// verdict is to continue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentDecision {
    /// Keep iterating (true) or stop here (false)
    pub should_continue: bool,

    /// What to improve next round, or why the work is done
    pub reasoning: String,

    /// Judge's confidence in [0, 1]
    pub confidence: f64,
}
