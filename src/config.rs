//! Execution configuration and fail-fast validation.
//!
//! Every knob is validated before any team starts. A bad weight table or a
//! zero round cap rejects the whole execution up front rather than surfacing
//! halfway through round three.

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use crate::domain::Team;

/// Allowed drift when checking that metric weights sum to 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Configuration errors, all raised before the first round runs
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No teams were supplied
    #[error("Team list is empty")]
    NoTeams,

    /// Two teams share an identifier
    #[error("Duplicate team id: {0}")]
    DuplicateTeamId(String),

    /// A team has a blank identifier
    #[error("Team id is empty")]
    EmptyTeamId,

    /// Round cap must allow at least one round
    #[error("max_rounds must be positive, got {0}")]
    InvalidMaxRounds(u32),

    /// Per-team deadline must be non-zero
    #[error("team_timeout must be positive")]
    InvalidTimeout,

    /// Evaluator needs at least one metric
    #[error("No metrics configured")]
    NoMetrics,

    /// A single metric weight is outside (0, 1]
    #[error("Metric '{name}' has weight {weight}, expected a value in (0, 1]")]
    InvalidWeight { name: String, weight: f64 },

    /// Weights must sum to 1.0 within tolerance
    #[error("Metric weights sum to {sum:.4}, expected 1.0 +/- {WEIGHT_SUM_TOLERANCE}")]
    InvalidWeightSum { sum: f64 },
}

/// Immutable settings for one execution.
///
/// There is no `Default`: the round cap and deadline are deliberate choices
/// the caller has to make.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Hard cap on rounds per team.
    pub max_rounds: u32,
    /// Wall-clock deadline for each team's whole loop.
    pub team_timeout: Duration,
    /// Truncate leaderboard snapshots handed to the judge (None = all teams).
    pub leaderboard_limit: Option<usize>,
}

impl ExecutionConfig {
    pub fn new(max_rounds: u32, team_timeout: Duration) -> Self {
        Self {
            max_rounds,
            team_timeout,
            leaderboard_limit: None,
        }
    }

    pub fn with_leaderboard_limit(mut self, limit: usize) -> Self {
        self.leaderboard_limit = Some(limit);
        self
    }

    /// Reject impossible settings before any team starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::InvalidMaxRounds(self.max_rounds));
        }
        if self.team_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Reject an empty roster or colliding team ids.
pub fn validate_teams(teams: &[Team]) -> Result<(), ConfigError> {
    if teams.is_empty() {
        return Err(ConfigError::NoTeams);
    }
    let mut seen = HashSet::new();
    for team in teams {
        if team.team_id.trim().is_empty() {
            return Err(ConfigError::EmptyTeamId);
        }
        if !seen.insert(team.team_id.as_str()) {
            return Err(ConfigError::DuplicateTeamId(team.team_id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str) -> Team {
        Team::new(id, format!("Team {id}"))
    }

    #[test]
    fn test_valid_config() {
        let config = ExecutionConfig::new(5, Duration::from_secs(600));
        assert!(config.validate().is_ok());
        assert_eq!(config.max_rounds, 5);
        assert!(config.leaderboard_limit.is_none());
    }

    #[test]
    fn test_zero_max_rounds_rejected() {
        let config = ExecutionConfig::new(0, Duration::from_secs(600));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxRounds(0))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ExecutionConfig::new(5, Duration::ZERO);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_builders() {
        let config = ExecutionConfig::new(3, Duration::from_secs(60)).with_leaderboard_limit(10);
        assert_eq!(config.leaderboard_limit, Some(10));
    }

    #[test]
    fn test_empty_team_list_rejected() {
        assert!(matches!(validate_teams(&[]), Err(ConfigError::NoTeams)));
    }

    #[test]
    fn test_duplicate_team_id_rejected() {
        let teams = vec![team("alpha"), team("beta"), team("alpha")];
        match validate_teams(&teams) {
            Err(ConfigError::DuplicateTeamId(id)) => assert_eq!(id, "alpha"),
            other => panic!("expected DuplicateTeamId, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_team_id_rejected() {
        let teams = vec![team("alpha"), Team::new("  ", "Blank")];
        assert!(matches!(
            validate_teams(&teams),
            Err(ConfigError::EmptyTeamId)
        ));
    }

    #[test]
    fn test_valid_roster() {
        let teams = vec![team("alpha"), team("beta"), team("gamma")];
        assert!(validate_teams(&teams).is_ok());
    }
}
