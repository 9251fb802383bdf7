//! Error types for bakeoff
//!
//! Centralized error handling using thiserror. Each component keeps its own
//! error enum (`ProducerError`, `EvaluationError`, `JudgeError`, `StoreError`)
//! so callers can match on what actually went wrong; this module ties together
//! the errors that can escape [`crate::orchestrator::Orchestrator::run`].

use thiserror::Error;

/// Errors surfaced by the execution entry point
#[derive(Debug, Error)]
pub enum BakeoffError {
    /// Configuration rejected before any team started
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Ranking store could not be opened or read
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),
}

/// Result type alias for bakeoff operations
pub type Result<T> = std::result::Result<T, BakeoffError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_config_error_conversion() {
        let err: BakeoffError = ConfigError::NoTeams.into();
        assert!(matches!(err, BakeoffError::Config(_)));
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(BakeoffError::Config(ConfigError::InvalidMaxRounds(0)))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
