//! LLM Client Layer - Anthropic API integration
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - AnthropicClient implementation
//! - Producer and metric adapters backed by an LLM
//! - JSON extraction helpers for structured completions

pub mod anthropic;
pub mod client;
pub mod metric;
pub mod parse;
pub mod producer;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, MockLlmClient, MockReply,
    Role, StopReason, Usage,
};
pub use metric::LlmMetric;
pub use producer::LlmProducer;
