//! LLM-backed scoring metric.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::Task;
use crate::evaluator::{Metric, MetricError, MetricOutcome};
use crate::llm::client::{CompletionRequest, LlmClient};
use crate::llm::parse::{extract_json, truncate};

const METRIC_SYSTEM_PROMPT: &str = "You are a strict, consistent grader scoring one submission \
against one quality dimension. Score from 0 (worthless) to 100 (flawless). Respond with ONLY a \
JSON object: {\"score\": <0-100>, \"commentary\": \"<one or two sentences on what to improve>\"}";

const DEFAULT_MAX_TOKENS: u32 = 512;

/// Raw score payload as the model emits it
#[derive(Debug, Deserialize)]
struct ScorePayload {
    score: f64,
    commentary: String,
}

/// Metric that asks an LLM to grade the submission against a rubric.
pub struct LlmMetric {
    client: Arc<dyn LlmClient>,
    rubric: String,
    model: Option<String>,
    max_tokens: u32,
}

impl LlmMetric {
    /// `rubric` describes the dimension being graded, e.g. "clarity: is the
    /// text easy to follow for a first-time reader?"
    pub fn new(client: Arc<dyn LlmClient>, rubric: impl Into<String>) -> Self {
        Self {
            client,
            rubric: rubric.into(),
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_user_prompt(&self, task: &Task, submission: &str) -> String {
        format!(
            "## Dimension\n\n{}\n\n## Task the team was given\n\n{}\n\n## Submission\n\n{}\n",
            self.rubric, task.instruction, submission
        )
    }

    fn parse_outcome(text: &str) -> Result<MetricOutcome, MetricError> {
        let json = extract_json(text).ok_or_else(|| {
            MetricError::Parse(format!("no JSON object in: {}", truncate(text, 120)))
        })?;
        let payload: ScorePayload = serde_json::from_str(json)
            .map_err(|e| MetricError::Parse(format!("{e}: {}", truncate(json, 120))))?;
        Ok(MetricOutcome {
            score: payload.score,
            commentary: payload.commentary,
        })
    }
}

#[async_trait]
impl Metric for LlmMetric {
    async fn score(&self, task: &Task, submission: &str) -> Result<MetricOutcome, MetricError> {
        let mut request = CompletionRequest::new(METRIC_SYSTEM_PROMPT)
            .with_user_message(self.build_user_prompt(task, submission))
            .with_max_tokens(self.max_tokens);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }

        let response = self.client.complete(request).await?;
        Self::parse_outcome(&response.content)
    }
}
