//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

/// Bakeoff - race multiple teams against one task and rank the results
#[derive(Parser, Debug)]
#[command(name = "bakeoff")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the run spec (YAML)
    pub spec: PathBuf,

    /// Override the task from the spec file
    #[arg(short, long)]
    pub task: Option<String>,

    /// Path for the round database (default: a per-run file under the
    /// local data directory)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_spec_path_required() {
        let result = Cli::try_parse_from(["bakeoff"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_spec_path_parsed() {
        let cli = Cli::try_parse_from(["bakeoff", "run.yaml"]).unwrap();
        assert_eq!(cli.spec, PathBuf::from("run.yaml"));
        assert!(cli.task.is_none());
        assert!(cli.store.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_task_override() {
        let cli = Cli::try_parse_from(["bakeoff", "run.yaml", "-t", "write a limerick"]).unwrap();
        assert_eq!(cli.task.as_deref(), Some("write a limerick"));
    }

    #[test]
    fn test_store_override() {
        let cli = Cli::try_parse_from(["bakeoff", "run.yaml", "--store", "/tmp/rounds.db"]).unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/rounds.db")));
    }

    #[test]
    fn test_verbose_flag() {
        let cli = Cli::try_parse_from(["bakeoff", "run.yaml", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        // Version flag causes early exit with error (expected)
        let result = Cli::try_parse_from(["bakeoff", "--version"]);
        assert!(result.is_err());
    }
}
