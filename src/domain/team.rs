//! Team identity

use serde::{Deserialize, Serialize};

/// A competitor in the execution.
///
/// Identity only; the thing that actually produces submissions is bound
/// separately so one team definition can front any producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Stable identifier, unique within one execution
    pub team_id: String,

    /// Human-readable name for logs and the leaderboard
    pub team_name: String,
}

impl Team {
    pub fn new(team_id: impl Into<String>, team_name: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            team_name: team_name.into(),
        }
    }
}
