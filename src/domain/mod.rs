//! Domain types for bakeoff
//!
//! This module contains all core domain types:
//! - Task / Team: execution inputs
//! - Round: one produce-evaluate cycle, the persisted unit of work
//! - EvaluationResult / MetricScore: weighted scoring output
//! - JudgmentDecision: the judge's continue-or-stop verdict
//! - LeaderboardEntry: one row of the cross-team ranking
//! - TeamResult / ExecutionResult: what the orchestrator hands back
//!
//! Rounds are immutable once recorded; the only later mutation is the
//! final-submission mark stamped when a team's loop terminates.

pub mod evaluation;
pub mod execution;
pub mod judgment;
pub mod leaderboard;
pub mod round;
pub mod task;
pub mod team;

pub use evaluation::{EvaluationResult, MetricScore};
pub use execution::{ExecutionResult, TeamResult};
pub use judgment::JudgmentDecision;
pub use leaderboard::LeaderboardEntry;
pub use round::{ExitReason, Round};
pub use task::Task;
pub use team::Team;
