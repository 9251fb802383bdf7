//! Core LLM client types and trait definitions

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System prompt
    pub system: String,

    /// User/assistant messages (typically just one user message)
    pub messages: Vec<Message>,

    /// Max tokens for the response (provider default when None)
    pub max_tokens: Option<u32>,

    /// Model override (provider default when None)
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            ..Default::default()
        }
    }

    pub fn with_user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Response from a completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Concatenated text content
    pub content: String,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    #[default]
    EndTurn,
    MaxTokens,
    StopSequence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn add(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::JsonError(_) => false,
            LlmError::MissingApiKey { .. } => false,
        }
    }
}

/// A scripted reply for [`MockLlmClient`]
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful completion with the given text
    Text(String),
    /// Failure the caller should retry (surfaces as a 503)
    Retryable(String),
    /// Failure the caller should not retry
    Fatal(String),
}

/// Mock LLM client that replays a scripted queue of replies
///
/// Once the queue is exhausted, the fallback text (if any) is returned
/// forever; otherwise further calls fail with a non-retryable error.
pub struct MockLlmClient {
    replies: Mutex<VecDeque<MockReply>>,
    fallback: Option<String>,
    calls: AtomicU32,
}

impl MockLlmClient {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Client that answers every call with the same text
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(text.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of completion calls made so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn text_response(content: String) -> CompletionResponse {
        CompletionResponse {
            content,
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Text(text)) => Ok(Self::text_response(text)),
            Some(MockReply::Retryable(message)) => Err(LlmError::ApiError {
                status: 503,
                message,
            }),
            Some(MockReply::Fatal(message)) => Err(LlmError::InvalidResponse(message)),
            None => match &self.fallback {
                Some(text) => Ok(Self::text_response(text.clone())),
                None => Err(LlmError::InvalidResponse(
                    "mock reply queue exhausted".to_string(),
                )),
            },
        }
    }
}
