//! Command-line interface: argument parsing, run specs, and rendering.

pub mod args;
pub mod render;
pub mod spec;

pub use args::Cli;
pub use spec::RunSpec;
