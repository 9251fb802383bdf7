//! Leaderboard entry type

use serde::{Deserialize, Serialize};

/// One row of the cross-team ranking: a team's best recorded round.
///
/// Ordering is by score descending; ties go to the round recorded first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u32,

    pub team_id: String,
    pub team_name: String,

    /// Which of the team's rounds ranks here
    pub round_number: u32,

    /// That round's weighted overall score
    pub overall_score: f64,

    /// When the round was recorded (Unix milliseconds)
    pub created_at: i64,
}
