//! LLM-backed continue/stop judge.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{JudgmentDecision, LeaderboardEntry, Round, Task};
use crate::judge::prompt::{JUDGE_SYSTEM_PROMPT, build_decision_prompt, parse_decision};
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::retry::RetryPolicy;

const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Errors from a judgment call.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Round history is empty")]
    EmptyHistory,

    #[error("Round history is not strictly increasing at index {0}")]
    HistoryOutOfOrder(usize),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed judge decision: {0}")]
    MalformedDecision(String),

    #[error("Judge retries exhausted after {attempts} attempt(s): {detail}")]
    RetriesExhausted { attempts: u32, detail: String },
}

/// Decides, after each round, whether a team should keep iterating.
///
/// The judge sees the full history of the team it is judging plus a
/// leaderboard snapshot when one is available. It never sees other
/// teams' submissions, only their standings.
pub struct Judge {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    model: Option<String>,
    max_tokens: u32,
}

impl Judge {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Decide whether the team behind `history` should run another round.
    ///
    /// `history` must be this team's rounds in strictly increasing round
    /// order. `leaderboard` is optional ranking context; None means the
    /// judge works from history alone.
    pub async fn decide(
        &self,
        task: &Task,
        history: &[Round],
        leaderboard: Option<&[LeaderboardEntry]>,
    ) -> Result<JudgmentDecision, JudgeError> {
        validate_history(history)?;

        let team_id = history[history.len() - 1].team_id.clone();
        let prompt = build_decision_prompt(task, history, leaderboard);
        let mut request = CompletionRequest::new(JUDGE_SYSTEM_PROMPT)
            .with_user_message(prompt)
            .with_max_tokens(self.max_tokens);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match self.client.complete(request.clone()).await {
                Ok(response) => match parse_decision(&response.content) {
                    Ok(decision) => {
                        info!(
                            team_id = %team_id,
                            should_continue = decision.should_continue,
                            confidence = decision.confidence,
                            "judge decided"
                        );
                        return Ok(decision);
                    }
                    Err(e) => e,
                },
                Err(e) if e.is_retryable() => JudgeError::Llm(e),
                Err(e) => return Err(JudgeError::Llm(e)),
            };

            if attempt >= self.retry.max_attempts() {
                return Err(JudgeError::RetriesExhausted {
                    attempts: attempt,
                    detail: failure.to_string(),
                });
            }

            warn!(
                team_id = %team_id,
                attempt,
                error = %failure,
                "judge attempt failed, retrying"
            );
            tokio::time::sleep(self.retry.delay_for(attempt)).await;
        }
    }
}

fn validate_history(history: &[Round]) -> Result<(), JudgeError> {
    if history.is_empty() {
        return Err(JudgeError::EmptyHistory);
    }
    for (i, pair) in history.windows(2).enumerate() {
        if pair[1].round_number <= pair[0].round_number {
            return Err(JudgeError::HistoryOutOfOrder(i + 1));
        }
    }
    Ok(())
}
