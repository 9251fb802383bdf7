//! Judge prompt rendering and decision parsing.

use crate::domain::{JudgmentDecision, LeaderboardEntry, Round, Task};
use crate::judge::client::JudgeError;
use crate::llm::parse::{extract_json, truncate};

pub const JUDGE_SYSTEM_PROMPT: &str = "You are the judge of a multi-round contest between \
competing teams. One team's round history is in front of you. Decide whether another round is \
worth the cost: say continue only when the trajectory suggests a meaningfully better score next \
round. A team that has plateaued, regressed, or already produced excellent work should stop. \
Your reasoning is handed to the team as feedback for its next round, so when you continue, be \
concrete about what to change. Respond with ONLY a JSON object.";

/// Truncation limit for the submission excerpt shown to the judge
const MAX_SUBMISSION_CHARS: usize = 2000;

/// Render the decision prompt from the team's history and the current
/// standings. `leaderboard` is None when the standings could not be read;
/// the judge then sees history alone.
pub fn build_decision_prompt(
    task: &Task,
    history: &[Round],
    leaderboard: Option<&[LeaderboardEntry]>,
) -> String {
    let team_name = history
        .last()
        .map(|r| r.team_name.as_str())
        .unwrap_or("unknown");

    let mut prompt = format!("# Task\n\n{}\n\n", task.instruction);

    prompt.push_str(&format!("# Round history for {team_name}\n\n"));
    for round in history {
        prompt.push_str(&format!(
            "Round {}: overall {:.2}\n",
            round.round_number,
            round.evaluation.display_score()
        ));
        for score in &round.evaluation.scores {
            prompt.push_str(&format!(
                "  - {}: {:.1} (weight {:.2}): {}\n",
                score.name, score.score, score.weight, score.commentary
            ));
        }
    }

    if let Some(latest) = history.last() {
        prompt.push_str(&format!(
            "\n# Latest submission\n\n{}\n",
            truncate(&latest.submission, MAX_SUBMISSION_CHARS)
        ));
    }

    if let Some(entries) = leaderboard {
        prompt.push_str("\n# Current standings\n\n");
        if entries.is_empty() {
            prompt.push_str("(no rounds recorded yet)\n");
        }
        for entry in entries {
            prompt.push_str(&format!(
                "{}. {}: {:.2} (round {})\n",
                entry.rank, entry.team_name, entry.overall_score, entry.round_number
            ));
        }
    }

    prompt.push_str(&format!(
        "\n# Your decision\n\nShould {team_name} attempt another round? Respond with ONLY:\n\
        {{\"should_continue\": true|false, \"reasoning\": \"<feedback for the next round, or why \
        the work is done>\", \"confidence\": <0.0-1.0>}}\n"
    ));

    prompt
}

/// Parse the judge's completion into a decision.
///
/// Anything that does not yield a well-formed decision with confidence in
/// [0, 1] is malformed; the caller decides whether to retry.
pub fn parse_decision(text: &str) -> Result<JudgmentDecision, JudgeError> {
    let json = extract_json(text).ok_or_else(|| {
        JudgeError::MalformedDecision(format!("no JSON object in: {}", truncate(text, 120)))
    })?;

    let decision: JudgmentDecision = serde_json::from_str(json)
        .map_err(|e| JudgeError::MalformedDecision(format!("{e}: {}", truncate(json, 120))))?;

    if !decision.confidence.is_finite() || !(0.0..=1.0).contains(&decision.confidence) {
        return Err(JudgeError::MalformedDecision(format!(
            "confidence {} outside [0, 1]",
            decision.confidence
        )));
    }

    Ok(decision)
}
