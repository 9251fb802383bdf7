//! Bakeoff - a round-based team competition engine
//!
//! Bakeoff runs several teams against one task at the same time. Each team
//! loops through produce, evaluate, record, and judge until it is told to
//! stop, and every round lands in a shared ranking store that feeds the
//! leaderboard.

pub mod config;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod id;
pub mod judge;
pub mod llm;
pub mod orchestrator;
pub mod producer;
pub mod retry;
pub mod runner;
pub mod store;

pub use error::{BakeoffError, Result};
