//! Execution result types
//!
//! What the orchestrator hands back: one `TeamResult` per team regardless of
//! how that team ended, plus the final leaderboard and the single best round
//! across all teams.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::leaderboard::LeaderboardEntry;
use crate::domain::round::{ExitReason, Round};
use crate::domain::task::Task;
use crate::domain::team::Team;

/// Outcome of one team's round loop
#[derive(Debug, Clone)]
pub struct TeamResult {
    pub team: Team,

    /// Why the loop stopped
    pub exit_reason: ExitReason,

    /// Every round that reached the store, in round order
    pub rounds: Vec<Round>,

    /// Failure detail when the exit was not a judged or capped finish
    pub error: Option<String>,

    /// Wall-clock time the team spent
    pub elapsed: Duration,
}

impl TeamResult {
    /// The team's last recorded round, if any round was recorded at all.
    pub fn final_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds.len() as u32
    }
}

/// Outcome of the whole execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Identifier for this run, also used in log correlation
    pub execution_id: String,

    /// The task everyone competed on
    pub task: Task,

    /// Per-team outcomes in roster order
    pub team_results: Vec<TeamResult>,

    /// Final ranking, best round per team, rank 1 first
    pub leaderboard: Vec<LeaderboardEntry>,

    /// Highest-scoring round across all teams
    pub best_round: Option<Round>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// The rank-1 leaderboard entry, when any round was recorded.
    pub fn winner(&self) -> Option<&LeaderboardEntry> {
        self.leaderboard.first()
    }

    /// Total wall-clock time for the execution.
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at).to_std().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluation::{EvaluationResult, MetricScore};

    fn round(team: &Team, number: u32, score: f64) -> Round {
        Round::new(
            team,
            number,
            format!("submission {number}"),
            EvaluationResult::weighted(vec![MetricScore {
                name: "quality".to_string(),
                score,
                weight: 1.0,
                commentary: "ok".to_string(),
            }]),
        )
    }

    #[test]
    fn test_team_result_final_round() {
        let team = Team::new("alpha", "Team Alpha");
        let result = TeamResult {
            team: team.clone(),
            exit_reason: ExitReason::JudgedComplete,
            rounds: vec![round(&team, 1, 70.0), round(&team, 2, 85.0)],
            error: None,
            elapsed: Duration::from_secs(12),
        };
        assert_eq!(result.rounds_completed(), 2);
        assert_eq!(result.final_round().map(|r| r.round_number), Some(2));
    }

    #[test]
    fn test_team_result_no_rounds() {
        let team = Team::new("beta", "Team Beta");
        let result = TeamResult {
            team,
            exit_reason: ExitReason::SubmissionFailed,
            rounds: vec![],
            error: Some("producer unreachable".to_string()),
            elapsed: Duration::from_secs(1),
        };
        assert!(result.final_round().is_none());
        assert_eq!(result.rounds_completed(), 0);
    }

    #[test]
    fn test_execution_result_winner_and_elapsed() {
        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::seconds(30);
        let result = ExecutionResult {
            execution_id: "123-abcd1234".to_string(),
            task: Task::new("test"),
            team_results: vec![],
            leaderboard: vec![LeaderboardEntry {
                rank: 1,
                team_id: "alpha".to_string(),
                team_name: "Team Alpha".to_string(),
                round_number: 2,
                overall_score: 91.0,
                created_at: 1738300800123,
            }],
            best_round: None,
            started_at,
            finished_at,
        };
        assert_eq!(result.winner().map(|e| e.team_id.as_str()), Some("alpha"));
        assert_eq!(result.elapsed(), Duration::from_secs(30));
    }
}
