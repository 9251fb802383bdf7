//! Round loop execution for a single team.

mod team_runner;

pub use team_runner::TeamRunner;
