//! Concurrent execution of team loops against one task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info, warn};

use super::cancel::CancelHandle;
use crate::config::{ExecutionConfig, validate_teams};
use crate::domain::{ExecutionResult, ExitReason, Task, Team, TeamResult};
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::judge::Judge;
use crate::producer::Producer;
use crate::runner::TeamRunner;
use crate::store::RankingStore;

/// One competing team and the producer that writes its submissions.
pub struct TeamEntry {
    pub team: Team,
    pub producer: Arc<dyn Producer>,
}

impl TeamEntry {
    pub fn new(team: Team, producer: Arc<dyn Producer>) -> Self {
        Self { team, producer }
    }
}

/// Runs every team loop concurrently and assembles the final standings.
///
/// Teams share the evaluator, the judge, and the ranking store; each
/// gets its own producer, store handle, and deadline. One team failing
/// or timing out never disturbs the others.
pub struct Orchestrator {
    evaluator: Arc<Evaluator>,
    judge: Arc<Judge>,
    store: RankingStore,
    cancel: CancelHandle,
    execution_id: Option<String>,
}

impl Orchestrator {
    pub fn new(evaluator: Evaluator, judge: Judge, store: RankingStore) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
            judge: Arc::new(judge),
            store,
            cancel: CancelHandle::new(),
            execution_id: None,
        }
    }

    /// Use a caller-chosen execution id instead of a generated one.
    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    /// Handle for cancelling this orchestrator's executions.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run one task across all entered teams and return the outcome.
    ///
    /// Validates the configuration and the roster up front, opens one
    /// store handle per team before anything is spawned, then races the
    /// team loops under the configured deadline.
    pub async fn run(
        &self,
        task: Task,
        entries: Vec<TeamEntry>,
        config: ExecutionConfig,
    ) -> Result<ExecutionResult> {
        config.validate()?;
        let teams: Vec<Team> = entries.iter().map(|e| e.team.clone()).collect();
        validate_teams(&teams)?;

        let execution_id = self
            .execution_id
            .clone()
            .unwrap_or_else(|| crate::id::execution_id(&task.instruction));
        let started_at = Utc::now();
        info!(
            execution_id = %execution_id,
            teams = teams.len(),
            max_rounds = config.max_rounds,
            "execution starting"
        );

        // Open every handle before spawning anything so a bad store
        // path fails the whole run instead of one team
        let mut prepared = Vec::with_capacity(entries.len());
        for entry in entries {
            let handle = self.store.handle()?;
            prepared.push((entry, handle));
        }

        let mut join_handles = Vec::with_capacity(prepared.len());
        for (entry, store_handle) in prepared {
            let runner = TeamRunner::new(
                entry.team.clone(),
                entry.producer,
                self.evaluator.clone(),
                self.judge.clone(),
                store_handle,
                &config,
                self.cancel.token(),
            );
            let team = entry.team;
            let task = task.clone();
            let deadline = config.team_timeout;
            join_handles.push(tokio::spawn(async move {
                let started = Instant::now();
                match tokio::time::timeout(deadline, runner.run(task)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            team_id = %team.team_id,
                            "team deadline expired, abandoning in-flight round"
                        );
                        TeamResult {
                            team,
                            exit_reason: ExitReason::Timeout,
                            rounds: Vec::new(),
                            error: None,
                            elapsed: started.elapsed(),
                        }
                    }
                }
            }));
        }

        let joined = join_all(join_handles).await;
        let mut team_results = Vec::with_capacity(joined.len());
        for (team, joined) in teams.into_iter().zip(joined) {
            match joined {
                Ok(result) => team_results.push(result),
                Err(e) => {
                    error!(team_id = %team.team_id, error = %e, "team loop aborted");
                    team_results.push(TeamResult {
                        team,
                        exit_reason: ExitReason::Cancelled,
                        rounds: Vec::new(),
                        error: Some(e.to_string()),
                        elapsed: Duration::ZERO,
                    });
                }
            }
        }

        self.recover_timed_out(&mut team_results).await;

        let reader = self.store.handle()?;
        let leaderboard = reader.leaderboard(None)?;
        let best_round = reader.best_round()?;

        let finished_at = Utc::now();
        info!(
            execution_id = %execution_id,
            teams = team_results.len(),
            finished = team_results
                .iter()
                .filter(|r| r.exit_reason.is_success())
                .count(),
            "execution finished"
        );

        Ok(ExecutionResult {
            execution_id,
            task,
            team_results,
            leaderboard,
            best_round,
            started_at,
            finished_at,
        })
    }

    /// Backfill results for teams whose deadline expired.
    ///
    /// The abandoned loop never got to stamp its last round, so read the
    /// rounds it did record and mark the latest one final. Recovery is
    /// best effort; a store hiccup here downgrades to a warning.
    async fn recover_timed_out(&self, team_results: &mut [TeamResult]) {
        for result in team_results.iter_mut() {
            if result.exit_reason != ExitReason::Timeout {
                continue;
            }
            let team_id = result.team.team_id.clone();
            let mut handle = match self.store.handle() {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(team_id = %team_id, error = %e, "store unavailable after timeout");
                    continue;
                }
            };
            let mut rounds = match handle.rounds_for_team(&team_id) {
                Ok(rounds) => rounds,
                Err(e) => {
                    warn!(team_id = %team_id, error = %e, "could not read rounds after timeout");
                    continue;
                }
            };
            if let Some(last) = rounds.last_mut() {
                if let Err(e) = handle
                    .mark_final(&team_id, last.round_number, ExitReason::Timeout)
                    .await
                {
                    warn!(
                        team_id = %team_id,
                        round = last.round_number,
                        error = %e,
                        "final mark failed after timeout"
                    );
                }
                last.final_submission = true;
                last.exit_reason = Some(ExitReason::Timeout);
            }
            result.rounds = rounds;
        }
    }
}
