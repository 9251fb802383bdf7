//! Run spec: the YAML file describing one bakeoff.
//!
//! Declares the task, the competing teams, the metric weight table, and the
//! execution knobs. Everything the library validates (weights, round cap,
//! roster) is validated there, not here; this module only maps the file
//! format onto library types.

use eyre::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use bakeoff::config::ExecutionConfig;
use bakeoff::domain::Task;
use bakeoff::retry::RetryPolicy;

fn default_team_timeout_secs() -> u64 {
    600
}

/// One bakeoff run as declared in a YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSpec {
    /// The task every team competes on.
    pub task: String,

    /// Feedback handed to every team in round one.
    #[serde(rename = "seed-feedback")]
    pub seed_feedback: Option<String>,

    /// Hard cap on rounds per team.
    #[serde(rename = "max-rounds")]
    pub max_rounds: u32,

    /// Wall-clock deadline per team, in seconds.
    #[serde(rename = "team-timeout-secs", default = "default_team_timeout_secs")]
    pub team_timeout_secs: u64,

    /// Truncate leaderboard snapshots handed to the judge.
    #[serde(rename = "leaderboard-limit")]
    pub leaderboard_limit: Option<usize>,

    /// Default model for producers, metrics, and the judge.
    pub model: Option<String>,

    pub teams: Vec<TeamSpec>,
    pub metrics: Vec<MetricSpec>,

    #[serde(default)]
    pub judge: JudgeSpec,

    pub retry: Option<RetrySpec>,
}

/// One competing team.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamSpec {
    pub id: String,
    pub name: String,

    /// Persona for this team's producer.
    #[serde(rename = "system-prompt")]
    pub system_prompt: Option<String>,

    /// Model override for this team.
    pub model: Option<String>,
}

/// One scoring dimension and its weight.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub weight: f64,

    /// What the grader is told to look for.
    pub rubric: String,

    /// Model override for this metric.
    pub model: Option<String>,
}

/// Judge overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JudgeSpec {
    pub model: Option<String>,

    #[serde(rename = "max-tokens")]
    pub max_tokens: Option<u32>,
}

/// Retry budget overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySpec {
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,
}

impl RunSpec {
    /// Load a run spec from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        let spec: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.as_ref().display()))?;
        Ok(spec)
    }

    /// The task as the library sees it.
    pub fn task_definition(&self) -> Task {
        let task = Task::new(&self.task);
        match &self.seed_feedback {
            Some(feedback) => task.with_seed_feedback(feedback),
            None => task,
        }
    }

    pub fn execution_config(&self) -> ExecutionConfig {
        let mut config =
            ExecutionConfig::new(self.max_rounds, Duration::from_secs(self.team_timeout_secs));
        if let Some(limit) = self.leaderboard_limit {
            config = config.with_leaderboard_limit(limit);
        }
        config
    }

    /// Retry policy for producers, metrics, the judge, and store writes.
    pub fn retry_policy(&self) -> RetryPolicy {
        match &self.retry {
            Some(retry) => RetryPolicy::new(retry.max_retries, retry.base_delay_ms),
            None => RetryPolicy::default(),
        }
    }
}
