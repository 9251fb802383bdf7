//! Submission producer seam.
//!
//! Whatever machinery a team uses to write a submission sits behind this
//! trait. The round loop only sees "given the task and the previous round's
//! feedback, hand back text or fail" -- sub-agent selection, prompting
//! strategy, and any internal retries are the producer's own business.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Task;
use crate::llm::LlmError;

/// Errors from a submission producer.
///
/// The round loop does not retry these: a producer that wants retries
/// implements them internally.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Producer failed: {0}")]
    Failed(String),
}

/// Produces one submission per round for one team.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Produce a submission for the task.
    ///
    /// `feedback` is the judge's reasoning from the previous round, or the
    /// task's seed feedback on round one (possibly empty).
    async fn produce(&self, task: &Task, feedback: &str) -> Result<String, ProducerError>;
}

/// Producer that returns the same canned submission every round.
///
/// Useful for tests and dry runs where the scoring path matters more than
/// the content.
pub struct StaticProducer {
    content: String,
}

impl StaticProducer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[async_trait]
impl Producer for StaticProducer {
    async fn produce(&self, _task: &Task, _feedback: &str) -> Result<String, ProducerError> {
        Ok(self.content.clone())
    }
}
