//! LLM-backed submission producer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Task;
use crate::llm::client::{CompletionRequest, LlmClient};
use crate::producer::{Producer, ProducerError};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a team competing against other teams on the same \
task. Each round you submit one deliverable, which is scored by independent metrics. When \
feedback from the previous round is given, use it: fix what it criticizes and keep what it \
praises. Respond with the deliverable only, no preamble and no commentary.";

/// Producer that asks an LLM for each round's submission.
pub struct LlmProducer {
    client: Arc<dyn LlmClient>,
    system_prompt: String,
    model: Option<String>,
    max_tokens: Option<u32>,
}

impl LlmProducer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: None,
            max_tokens: None,
        }
    }

    /// Replace the default system prompt (the team's persona)
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_user_prompt(task: &Task, feedback: &str) -> String {
        let mut prompt = format!("## Task\n\n{}\n", task.instruction);

        if !feedback.trim().is_empty() {
            prompt.push_str(&format!(
                "\n## Feedback from the previous round\n\n{}\n",
                feedback.trim()
            ));
        }

        prompt.push_str("\n## Your submission\n");
        prompt
    }
}

#[async_trait]
impl Producer for LlmProducer {
    async fn produce(&self, task: &Task, feedback: &str) -> Result<String, ProducerError> {
        let mut request = CompletionRequest::new(self.system_prompt.clone())
            .with_user_message(Self::build_user_prompt(task, feedback));
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.client.complete(request).await?;
        Ok(response.content)
    }
}
