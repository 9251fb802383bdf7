//! Terminal rendering of execution results.
//!
//! Logging goes to a file; this is what the user actually sees. Plain
//! `format_*` functions returning strings keep the output testable.

use colored::{ColoredString, Colorize};

use bakeoff::domain::{ExecutionResult, ExitReason, LeaderboardEntry, TeamResult};

fn exit_label(reason: ExitReason) -> ColoredString {
    let label = reason.as_str();
    match reason {
        ExitReason::JudgedComplete | ExitReason::MaxRoundsReached => label.green(),
        ExitReason::Timeout | ExitReason::Cancelled => label.yellow(),
        _ => label.red(),
    }
}

fn best_score(result: &TeamResult) -> Option<f64> {
    result
        .rounds
        .iter()
        .map(|round| round.overall_score())
        .fold(None, |best, score| match best {
            Some(b) if b >= score => Some(b),
            _ => Some(score),
        })
}

pub fn format_team_results(results: &[TeamResult]) -> String {
    let mut out = format!("{}\n", "Team results".bold());
    for result in results {
        let best = match best_score(result) {
            Some(score) => format!(", best {score:.2}"),
            None => String::new(),
        };
        out.push_str(&format!(
            "  {}: {} after {} round(s) in {:.1}s{}\n",
            result.team.team_name.bold(),
            exit_label(result.exit_reason),
            result.rounds_completed(),
            result.elapsed.as_secs_f64(),
            best,
        ));
        if let Some(error) = &result.error {
            out.push_str(&format!("    {}\n", error.red()));
        }
    }
    out
}

pub fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut out = format!("{}\n", "Leaderboard".bold());
    if entries.is_empty() {
        out.push_str("  (no rounds recorded)\n");
        return out;
    }
    for entry in entries {
        let line = format!(
            "  {}. {} with {:.2} (round {})",
            entry.rank, entry.team_name, entry.overall_score, entry.round_number
        );
        if entry.rank == 1 {
            out.push_str(&format!("{}\n", line.green()));
        } else {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Full report: per-team outcomes, standings, winner, and best submission.
pub fn format_execution(result: &ExecutionResult) -> String {
    let mut out = format_team_results(&result.team_results);
    out.push('\n');
    out.push_str(&format_leaderboard(&result.leaderboard));
    out.push('\n');

    match result.winner() {
        Some(winner) => out.push_str(&format!(
            "{} {} with {:.2}\n",
            "Winner:".green().bold(),
            winner.team_name,
            winner.overall_score
        )),
        None => out.push_str(&format!("{}\n", "No team recorded a round".yellow())),
    }

    if let Some(best) = &result.best_round {
        out.push_str(&format!(
            "\n{} ({}, round {}, {:.2})\n{}\n",
            "Best submission".bold(),
            best.team_name,
            best.round_number,
            best.overall_score(),
            best.submission
        ));
    }

    out.push_str(&format!(
        "\nFinished in {:.1}s\n",
        result.elapsed().as_secs_f64()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bakeoff::domain::{EvaluationResult, MetricScore, Round, Task, Team};
    use chrono::Utc;
    use std::time::Duration;

    fn round(team: &Team, number: u32, score: f64) -> Round {
        let evaluation = EvaluationResult::weighted(vec![MetricScore {
            name: "quality".to_string(),
            score,
            weight: 1.0,
            commentary: "graded".to_string(),
        }]);
        Round::new(team, number, format!("submission {number}"), evaluation)
    }

    fn entry(rank: u32, name: &str, score: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            team_id: name.to_lowercase(),
            team_name: name.to_string(),
            round_number: 1,
            overall_score: score,
            created_at: 0,
        }
    }

    fn team_result(name: &str, reason: ExitReason, scores: &[f64]) -> TeamResult {
        let team = Team::new(name.to_lowercase(), name);
        let rounds = scores
            .iter()
            .enumerate()
            .map(|(i, score)| round(&team, i as u32 + 1, *score))
            .collect();
        TeamResult {
            team,
            exit_reason: reason,
            rounds,
            error: None,
            elapsed: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_team_results_show_reason_and_best() {
        colored::control::set_override(false);
        let results = vec![
            team_result("Alpha", ExitReason::JudgedComplete, &[70.0, 85.0]),
            team_result("Beta", ExitReason::Timeout, &[60.0]),
        ];

        let out = format_team_results(&results);
        assert!(out.contains("Alpha: judged_complete after 2 round(s)"));
        assert!(out.contains("best 85.00"));
        assert!(out.contains("Beta: timeout after 1 round(s)"));
    }

    #[test]
    fn test_team_results_show_error_detail() {
        colored::control::set_override(false);
        let mut result = team_result("Alpha", ExitReason::EvaluationFailed, &[]);
        result.error = Some("scoring service down".to_string());

        let out = format_team_results(&[result]);
        assert!(out.contains("evaluation_failed"));
        assert!(out.contains("scoring service down"));
    }

    #[test]
    fn test_leaderboard_lists_ranks_in_order() {
        colored::control::set_override(false);
        let entries = vec![entry(1, "Alpha", 91.25), entry(2, "Beta", 74.0)];

        let out = format_leaderboard(&entries);
        let alpha = out.find("1. Alpha with 91.25").unwrap();
        let beta = out.find("2. Beta with 74.00").unwrap();
        assert!(alpha < beta);
    }

    #[test]
    fn test_empty_leaderboard() {
        colored::control::set_override(false);
        let out = format_leaderboard(&[]);
        assert!(out.contains("no rounds recorded"));
    }

    #[test]
    fn test_execution_report_names_winner_and_best() {
        colored::control::set_override(false);
        let team = Team::new("alpha", "Alpha");
        let best = round(&team, 2, 91.25);
        let result = ExecutionResult {
            execution_id: "x".to_string(),
            task: Task::new("task"),
            team_results: vec![team_result("Alpha", ExitReason::JudgedComplete, &[70.0, 91.25])],
            leaderboard: vec![entry(1, "Alpha", 91.25)],
            best_round: Some(best),
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let out = format_execution(&result);
        assert!(out.contains("Winner: Alpha with 91.25"));
        assert!(out.contains("Best submission (Alpha, round 2, 91.25)"));
        assert!(out.contains("submission 2"));
    }

    #[test]
    fn test_execution_report_without_rounds() {
        colored::control::set_override(false);
        let result = ExecutionResult {
            execution_id: "x".to_string(),
            task: Task::new("task"),
            team_results: vec![team_result("Alpha", ExitReason::SubmissionFailed, &[])],
            leaderboard: vec![],
            best_round: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let out = format_execution(&result);
        assert!(out.contains("No team recorded a round"));
    }
}
