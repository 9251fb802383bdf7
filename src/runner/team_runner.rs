//! Per-team round loop.
//!
//! One `TeamRunner` drives one team from round 1 to termination:
//! produce, evaluate, record, then ask the judge whether to go again.
//! The loop talks to other teams only through the shared store, and
//! every recorded round survives whatever happens afterwards.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::ExecutionConfig;
use crate::domain::{ExitReason, Round, Task, Team, TeamResult};
use crate::evaluator::Evaluator;
use crate::judge::Judge;
use crate::orchestrator::CancelToken;
use crate::producer::Producer;
use crate::store::StoreHandle;

/// Runs one team's produce-evaluate-judge loop to completion.
pub struct TeamRunner {
    team: Team,
    producer: Arc<dyn Producer>,
    evaluator: Arc<Evaluator>,
    judge: Arc<Judge>,
    store: StoreHandle,
    max_rounds: u32,
    leaderboard_limit: Option<usize>,
    cancel: CancelToken,
}

impl TeamRunner {
    pub fn new(
        team: Team,
        producer: Arc<dyn Producer>,
        evaluator: Arc<Evaluator>,
        judge: Arc<Judge>,
        store: StoreHandle,
        config: &ExecutionConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            team,
            producer,
            evaluator,
            judge,
            store,
            max_rounds: config.max_rounds,
            leaderboard_limit: config.leaderboard_limit,
            cancel,
        }
    }

    /// Run rounds until the judge stops the team, the cap lands, a
    /// component gives out, or the execution is cancelled.
    ///
    /// Never returns an error: whatever happens is folded into the
    /// [`TeamResult`] so one team's failure cannot take down the others.
    pub async fn run(mut self, task: Task) -> TeamResult {
        let started = Instant::now();
        let team_id = self.team.team_id.clone();
        info!(team_id = %team_id, "team loop starting");

        let mut rounds: Vec<Round> = Vec::new();
        let mut feedback = task.seed_feedback.clone().unwrap_or_default();
        let mut round_number: u32 = 1;
        let mut error_detail: Option<String> = None;

        let exit_reason = loop {
            if self.cancel.is_cancelled() {
                break ExitReason::Cancelled;
            }

            // 1. Produce
            debug!(team_id = %team_id, round = round_number, "producing submission");
            let submission = match self.producer.produce(&task, &feedback).await {
                Ok(text) => text,
                Err(e) => {
                    error!(team_id = %team_id, round = round_number, error = %e, "producer failed");
                    error_detail = Some(e.to_string());
                    break ExitReason::SubmissionFailed;
                }
            };

            if self.cancel.is_cancelled() {
                break ExitReason::Cancelled;
            }

            // 2. Evaluate
            debug!(team_id = %team_id, round = round_number, "evaluating submission");
            let evaluation = match self.evaluator.evaluate(&task, &submission).await {
                Ok(result) => result,
                Err(e) => {
                    error!(team_id = %team_id, round = round_number, error = %e, "evaluation failed");
                    error_detail = Some(e.to_string());
                    break ExitReason::EvaluationFailed;
                }
            };

            // 3. Record before judging: an evaluated round counts even if
            //    the judge never sees it
            let round = Round::new(&self.team, round_number, submission, evaluation);
            if let Err(e) = self.store.record_round(&round).await {
                error!(team_id = %team_id, round = round_number, error = %e, "round write failed");
                error_detail = Some(e.to_string());
                break ExitReason::RecordFailed;
            }
            info!(
                team_id = %team_id,
                round = round_number,
                score = round.evaluation.display_score(),
                "round recorded"
            );
            rounds.push(round);

            // 4. Round cap, checked before the judge is consulted
            if round_number >= self.max_rounds {
                break ExitReason::MaxRoundsReached;
            }

            if self.cancel.is_cancelled() {
                break ExitReason::Cancelled;
            }

            // 5. Judge, with whatever ranking context is available
            let snapshot = match self.store.leaderboard(self.leaderboard_limit) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(
                        team_id = %team_id,
                        round = round_number,
                        error = %e,
                        "leaderboard unavailable, judging from history alone"
                    );
                    None
                }
            };
            let decision = match self.judge.decide(&task, &rounds, snapshot.as_deref()).await {
                Ok(decision) => decision,
                Err(e) => {
                    error!(team_id = %team_id, round = round_number, error = %e, "judge unavailable");
                    error_detail = Some(e.to_string());
                    break ExitReason::JudgmentUnavailable;
                }
            };
            if !decision.should_continue {
                break ExitReason::JudgedComplete;
            }

            // 6. The judge's reasoning becomes next round's feedback
            feedback = decision.reasoning;
            round_number += 1;
        };

        self.finish(exit_reason, &mut rounds).await;

        info!(
            team_id = %team_id,
            rounds = rounds.len(),
            exit_reason = %exit_reason,
            "team loop finished"
        );

        TeamResult {
            team: self.team,
            exit_reason,
            rounds,
            error: error_detail,
            elapsed: started.elapsed(),
        }
    }

    /// Stamp the last recorded round as the team's final submission.
    ///
    /// A failed stamp is logged but never masks the loop's own exit
    /// reason; the recorded rounds themselves are already safe.
    async fn finish(&mut self, exit_reason: ExitReason, rounds: &mut [Round]) {
        let Some(last) = rounds.last_mut() else {
            return;
        };
        if let Err(e) = self
            .store
            .mark_final(&last.team_id, last.round_number, exit_reason)
            .await
        {
            warn!(
                team_id = %last.team_id,
                round = last.round_number,
                error = %e,
                "final mark failed"
            );
        }
        last.final_submission = true;
        last.exit_reason = Some(exit_reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{Metric, MetricBinding, MetricError, MetricOutcome};
    use crate::llm::{MockLlmClient, MockReply};
    use crate::orchestrator::CancelHandle;
    use crate::producer::{ProducerError, StaticProducer};
    use crate::retry::RetryPolicy;
    use crate::store::RankingStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    const STOP: &str =
        r#"{"should_continue": false, "reasoning": "good enough", "confidence": 0.9}"#;
    const CONTINUE: &str =
        r#"{"should_continue": true, "reasoning": "tighten the middle", "confidence": 0.7}"#;

    struct FixedMetric {
        score: f64,
    }

    #[async_trait]
    impl Metric for FixedMetric {
        async fn score(&self, _task: &Task, _sub: &str) -> Result<MetricOutcome, MetricError> {
            Ok(MetricOutcome {
                score: self.score,
                commentary: "graded".to_string(),
            })
        }
    }

    struct BrokenMetric;

    #[async_trait]
    impl Metric for BrokenMetric {
        async fn score(&self, _task: &Task, _sub: &str) -> Result<MetricOutcome, MetricError> {
            Err(MetricError::Backend("scoring service down".to_string()))
        }
    }

    /// Producer that records the feedback it was handed each round
    struct FeedbackSpy {
        feedbacks: Mutex<Vec<String>>,
    }

    impl FeedbackSpy {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                feedbacks: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Producer for FeedbackSpy {
        async fn produce(&self, _task: &Task, feedback: &str) -> Result<String, ProducerError> {
            self.feedbacks.lock().unwrap().push(feedback.to_string());
            Ok("a submission".to_string())
        }
    }

    struct FailingProducer;

    #[async_trait]
    impl Producer for FailingProducer {
        async fn produce(&self, _task: &Task, _feedback: &str) -> Result<String, ProducerError> {
            Err(ProducerError::Failed("agent crashed".to_string()))
        }
    }

    fn evaluator(metric: Arc<dyn Metric>) -> Arc<Evaluator> {
        Arc::new(
            Evaluator::new(
                vec![MetricBinding::new("quality", 1.0, metric)],
                RetryPolicy::new(1, 1),
            )
            .unwrap(),
        )
    }

    fn judge(replies: Vec<MockReply>) -> (Arc<MockLlmClient>, Arc<Judge>) {
        let client = Arc::new(MockLlmClient::new(replies));
        let judge = Arc::new(Judge::new(client.clone()).with_retry(RetryPolicy::new(1, 1)));
        (client, judge)
    }

    fn runner(
        store: &RankingStore,
        producer: Arc<dyn Producer>,
        evaluator: Arc<Evaluator>,
        judge: Arc<Judge>,
        max_rounds: u32,
    ) -> TeamRunner {
        let config = ExecutionConfig::new(max_rounds, Duration::from_secs(60));
        TeamRunner::new(
            Team::new("alpha", "Team Alpha"),
            producer,
            evaluator,
            judge,
            store.handle().unwrap(),
            &config,
            CancelHandle::new().token(),
        )
    }

    #[tokio::test]
    async fn test_judged_complete_after_two_rounds() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        let spy = FeedbackSpy::new();
        let (_client, judge) = judge(vec![
            MockReply::Text(CONTINUE.to_string()),
            MockReply::Text(STOP.to_string()),
        ]);

        let result = runner(
            &store,
            spy.clone(),
            evaluator(Arc::new(FixedMetric { score: 80.0 })),
            judge,
            5,
        )
        .run(Task::new("write a blurb"))
        .await;

        assert_eq!(result.exit_reason, ExitReason::JudgedComplete);
        assert_eq!(result.rounds_completed(), 2);
        assert_eq!(result.rounds[0].round_number, 1);
        assert_eq!(result.rounds[1].round_number, 2);
        assert!(result.error.is_none());

        // Judge reasoning carried into round 2
        let feedbacks = spy.feedbacks.lock().unwrap();
        assert_eq!(feedbacks.as_slice(), &["", "tighten the middle"]);

        // Final mark landed on round 2 only
        let handle = store.handle().unwrap();
        let stored = handle.rounds_for_team("alpha").unwrap();
        assert!(!stored[0].final_submission);
        assert!(stored[1].final_submission);
        assert_eq!(stored[1].exit_reason, Some(ExitReason::JudgedComplete));
    }

    #[tokio::test]
    async fn test_round_cap_skips_judge() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        // Judge would always continue, but the cap lands first
        let (client, judge) = judge(vec![
            MockReply::Text(CONTINUE.to_string()),
            MockReply::Text(CONTINUE.to_string()),
        ]);

        let result = runner(
            &store,
            Arc::new(StaticProducer::new("text")),
            evaluator(Arc::new(FixedMetric { score: 70.0 })),
            judge,
            2,
        )
        .run(Task::new("task"))
        .await;

        assert_eq!(result.exit_reason, ExitReason::MaxRoundsReached);
        assert_eq!(result.rounds_completed(), 2);
        // Consulted after round 1 only; round 2 hit the cap
        assert_eq!(client.calls(), 1);

        let handle = store.handle().unwrap();
        let stored = handle.rounds_for_team("alpha").unwrap();
        assert_eq!(stored[1].exit_reason, Some(ExitReason::MaxRoundsReached));
    }

    #[tokio::test]
    async fn test_single_round_cap_never_consults_judge() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        let (client, judge) = judge(vec![MockReply::Text(CONTINUE.to_string())]);

        let result = runner(
            &store,
            Arc::new(StaticProducer::new("text")),
            evaluator(Arc::new(FixedMetric { score: 70.0 })),
            judge,
            1,
        )
        .run(Task::new("task"))
        .await;

        assert_eq!(result.exit_reason, ExitReason::MaxRoundsReached);
        assert_eq!(result.rounds_completed(), 1);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_producer_failure_records_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        let (_client, judge) = judge(vec![]);

        let result = runner(
            &store,
            Arc::new(FailingProducer),
            evaluator(Arc::new(FixedMetric { score: 70.0 })),
            judge,
            3,
        )
        .run(Task::new("task"))
        .await;

        assert_eq!(result.exit_reason, ExitReason::SubmissionFailed);
        assert!(result.rounds.is_empty());
        assert!(result.error.as_deref().unwrap().contains("agent crashed"));
        assert_eq!(store.handle().unwrap().round_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_evaluation_failure_records_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        let (_client, judge) = judge(vec![]);

        let result = runner(
            &store,
            Arc::new(StaticProducer::new("text")),
            evaluator(Arc::new(BrokenMetric)),
            judge,
            3,
        )
        .run(Task::new("task"))
        .await;

        assert_eq!(result.exit_reason, ExitReason::EvaluationFailed);
        assert!(result.rounds.is_empty());
        assert_eq!(store.handle().unwrap().round_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_submission_fails_evaluation() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        let (_client, judge) = judge(vec![]);

        let result = runner(
            &store,
            Arc::new(StaticProducer::new("   ")),
            evaluator(Arc::new(FixedMetric { score: 70.0 })),
            judge,
            3,
        )
        .run(Task::new("task"))
        .await;

        assert_eq!(result.exit_reason, ExitReason::EvaluationFailed);
        assert!(result.rounds.is_empty());
    }

    #[tokio::test]
    async fn test_judge_failure_keeps_recorded_round() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        let client = Arc::new(MockLlmClient::always("not json, ever"));
        let judge = Arc::new(Judge::new(client).with_retry(RetryPolicy::new(1, 1)));

        let result = runner(
            &store,
            Arc::new(StaticProducer::new("text")),
            evaluator(Arc::new(FixedMetric { score: 70.0 })),
            judge,
            3,
        )
        .run(Task::new("task"))
        .await;

        assert_eq!(result.exit_reason, ExitReason::JudgmentUnavailable);
        assert_eq!(result.rounds_completed(), 1);

        // The round the judge never ruled on still counts and carries the mark
        let handle = store.handle().unwrap();
        let stored = handle.rounds_for_team("alpha").unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].final_submission);
        assert_eq!(stored[0].exit_reason, Some(ExitReason::JudgmentUnavailable));
    }

    #[tokio::test]
    async fn test_cancel_before_first_round() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        let (_client, judge) = judge(vec![]);
        let cancel = CancelHandle::new();
        cancel.cancel();

        let config = ExecutionConfig::new(3, Duration::from_secs(60));
        let runner = TeamRunner::new(
            Team::new("alpha", "Team Alpha"),
            Arc::new(StaticProducer::new("text")),
            evaluator(Arc::new(FixedMetric { score: 70.0 })),
            judge,
            store.handle().unwrap(),
            &config,
            cancel.token(),
        );

        let result = runner.run(Task::new("task")).await;
        assert_eq!(result.exit_reason, ExitReason::Cancelled);
        assert!(result.rounds.is_empty());
    }

    #[tokio::test]
    async fn test_seed_feedback_reaches_first_round() {
        let tmp = TempDir::new().unwrap();
        let store = RankingStore::open(tmp.path().join("rounds.db")).unwrap();
        let spy = FeedbackSpy::new();
        let (_client, judge) = judge(vec![MockReply::Text(STOP.to_string())]);

        let task = Task::new("task").with_seed_feedback("aim for one paragraph");
        let result = runner(
            &store,
            spy.clone(),
            evaluator(Arc::new(FixedMetric { score: 70.0 })),
            judge,
            3,
        )
        .run(task)
        .await;

        assert_eq!(result.exit_reason, ExitReason::JudgedComplete);
        let feedbacks = spy.feedbacks.lock().unwrap();
        assert_eq!(feedbacks.as_slice(), &["aim for one paragraph"]);
    }
}
