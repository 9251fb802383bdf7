//! Continue/stop judgment
//!
//! This module provides:
//! - Judge deciding after each round whether a team keeps iterating
//! - Prompt rendering and decision parsing for the judge call

pub mod client;
pub mod prompt;

pub use client::{Judge, JudgeError};
pub use prompt::{build_decision_prompt, parse_decision};
