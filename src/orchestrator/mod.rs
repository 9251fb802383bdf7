//! Execution orchestration: team fan-out, deadlines, and cancellation.

mod cancel;
mod executor;

pub use cancel::{CancelHandle, CancelToken};
pub use executor::{Orchestrator, TeamEntry};
