//! Round record and exit reasons
//!
//! A `Round` is the unit of persistence: one produce-evaluate cycle for one
//! team. Rounds are immutable once recorded, except for the final-submission
//! mark stamped when the team's loop terminates.

use serde::{Deserialize, Serialize};

use crate::domain::evaluation::EvaluationResult;
use crate::domain::team::Team;
use crate::id::now_ms;

/// Why a team's round loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Judge decided the work is done
    JudgedComplete,
    /// Round cap reached with the judge never consulted
    MaxRoundsReached,
    /// Judge unreachable or unparseable after all retries
    JudgmentUnavailable,
    /// Producer failed to deliver a submission
    SubmissionFailed,
    /// A metric exhausted its retries or the inputs were rejected
    EvaluationFailed,
    /// Ranking store refused the round after all retries
    RecordFailed,
    /// Per-team deadline expired
    Timeout,
    /// Execution-wide abort
    Cancelled,
}

impl ExitReason {
    /// Get the string representation (matches the serde encoding).
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::JudgedComplete => "judged_complete",
            ExitReason::MaxRoundsReached => "max_rounds_reached",
            ExitReason::JudgmentUnavailable => "judgment_unavailable",
            ExitReason::SubmissionFailed => "submission_failed",
            ExitReason::EvaluationFailed => "evaluation_failed",
            ExitReason::RecordFailed => "record_failed",
            ExitReason::Timeout => "timeout",
            ExitReason::Cancelled => "cancelled",
        }
    }

    /// Parse the string form back; used when reading store rows.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "judged_complete" => Some(ExitReason::JudgedComplete),
            "max_rounds_reached" => Some(ExitReason::MaxRoundsReached),
            "judgment_unavailable" => Some(ExitReason::JudgmentUnavailable),
            "submission_failed" => Some(ExitReason::SubmissionFailed),
            "evaluation_failed" => Some(ExitReason::EvaluationFailed),
            "record_failed" => Some(ExitReason::RecordFailed),
            "timeout" => Some(ExitReason::Timeout),
            "cancelled" => Some(ExitReason::Cancelled),
            _ => None,
        }
    }

    /// True when the team ran to a judged or capped finish rather than
    /// dying on a component failure.
    pub fn is_success(&self) -> bool {
        matches!(self, ExitReason::JudgedComplete | ExitReason::MaxRoundsReached)
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded round for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    //=== Identity ===
    /// Owning team's identifier
    pub team_id: String,

    /// Owning team's display name
    pub team_name: String,

    /// 1-based round counter, unique per team within an execution
    pub round_number: u32,

    //=== Content ===
    /// The produced submission text
    pub submission: String,

    /// Weighted evaluation of the submission
    pub evaluation: EvaluationResult,

    //=== Terminal state ===
    /// Set once, when this turns out to be the team's last recorded round
    pub final_submission: bool,

    /// Why the loop stopped; None until the final mark lands
    pub exit_reason: Option<ExitReason>,

    //=== Timestamps ===
    /// Unix timestamp in milliseconds
    pub created_at: i64,
}

impl Round {
    /// Create a freshly evaluated, not-yet-final round.
    pub fn new(team: &Team, round_number: u32, submission: String, evaluation: EvaluationResult) -> Self {
        Self {
            team_id: team.team_id.clone(),
            team_name: team.team_name.clone(),
            round_number,
            submission,
            evaluation,
            final_submission: false,
            exit_reason: None,
            created_at: now_ms(),
        }
    }

    pub fn overall_score(&self) -> f64 {
        self.evaluation.overall_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluation::MetricScore;

    fn evaluation(score: f64) -> EvaluationResult {
        EvaluationResult::weighted(vec![MetricScore {
            name: "quality".to_string(),
            score,
            weight: 1.0,
            commentary: "fine".to_string(),
        }])
    }

    #[test]
    fn test_exit_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&ExitReason::JudgedComplete).unwrap(),
            "\"judged_complete\""
        );
        assert_eq!(
            serde_json::to_string(&ExitReason::MaxRoundsReached).unwrap(),
            "\"max_rounds_reached\""
        );
        assert_eq!(
            serde_json::to_string(&ExitReason::JudgmentUnavailable).unwrap(),
            "\"judgment_unavailable\""
        );
        assert_eq!(serde_json::to_string(&ExitReason::Timeout).unwrap(), "\"timeout\"");
    }

    #[test]
    fn test_exit_reason_as_str_parse_roundtrip() {
        let all = [
            ExitReason::JudgedComplete,
            ExitReason::MaxRoundsReached,
            ExitReason::JudgmentUnavailable,
            ExitReason::SubmissionFailed,
            ExitReason::EvaluationFailed,
            ExitReason::RecordFailed,
            ExitReason::Timeout,
            ExitReason::Cancelled,
        ];
        for reason in all {
            assert_eq!(ExitReason::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(ExitReason::parse("nonsense"), None);
    }

    #[test]
    fn test_exit_reason_is_success() {
        assert!(ExitReason::JudgedComplete.is_success());
        assert!(ExitReason::MaxRoundsReached.is_success());
        assert!(!ExitReason::SubmissionFailed.is_success());
        assert!(!ExitReason::EvaluationFailed.is_success());
        assert!(!ExitReason::JudgmentUnavailable.is_success());
        assert!(!ExitReason::Timeout.is_success());
        assert!(!ExitReason::Cancelled.is_success());
    }

    #[test]
    fn test_new_round_defaults() {
        let team = Team::new("alpha", "Team Alpha");
        let round = Round::new(&team, 1, "submission text".to_string(), evaluation(85.0));

        assert_eq!(round.team_id, "alpha");
        assert_eq!(round.round_number, 1);
        assert!(!round.final_submission);
        assert!(round.exit_reason.is_none());
        assert!(round.created_at > 0);
        assert!((round.overall_score() - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_serialization_roundtrip() {
        let team = Team::new("beta", "Team Beta");
        let mut round = Round::new(&team, 2, "text".to_string(), evaluation(70.0));
        round.final_submission = true;
        round.exit_reason = Some(ExitReason::JudgedComplete);

        let json = serde_json::to_string(&round).unwrap();
        let parsed: Round = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, round);
        assert!(json.contains("judged_complete"));
    }
}
