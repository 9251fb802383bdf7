//! SQLite-backed round storage and ranking.
//!
//! One database file per execution. [`RankingStore`] is a cheap handle
//! factory holding the path and retry policy; every concurrent writer gets
//! its own [`StoreHandle`] with a private connection, and WAL mode keeps
//! readers unblocked while teams write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, params};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{EvaluationResult, ExitReason, LeaderboardEntry, MetricScore, Round};
use crate::retry::RetryPolicy;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS rounds (
    team_id TEXT NOT NULL,
    team_name TEXT NOT NULL,
    round_number INTEGER NOT NULL,
    submission TEXT NOT NULL,
    overall_score REAL NOT NULL,
    score_details TEXT NOT NULL,
    final_submission INTEGER NOT NULL DEFAULT 0,
    exit_reason TEXT,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (team_id, round_number)
);

CREATE INDEX IF NOT EXISTS idx_rounds_team ON rounds(team_id);
CREATE INDEX IF NOT EXISTS idx_rounds_score ON rounds(overall_score);
";

/// Errors from the ranking store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Round payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No recorded round for team '{team_id}' round {round_number}")]
    RoundNotFound { team_id: String, round_number: u32 },

    #[error("Corrupt round record: {0}")]
    Corrupt(String),

    #[error("Store write retries exhausted after {attempts} attempt(s): {detail}")]
    RetriesExhausted { attempts: u32, detail: String },
}

impl StoreError {
    /// Whether retrying the same write could succeed. Busy/locked and IO
    /// failures are transient; everything else is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            StoreError::Sqlite(_) => false,
            StoreError::Io(_) => true,
            _ => false,
        }
    }
}

/// Handle factory for one execution's round database.
#[derive(Debug, Clone)]
pub struct RankingStore {
    db_path: PathBuf,
    retry: RetryPolicy,
}

impl RankingStore {
    /// Open (creating if needed) the database at `db_path` and initialize
    /// the schema. Parent directories are created as needed.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Validates the path and creates the schema up front
        open_connection(&db_path)?;
        debug!(db_path = %db_path.display(), "ranking store opened");

        Ok(Self {
            db_path,
            retry: RetryPolicy::default(),
        })
    }

    /// Retry policy inherited by every handle this factory opens.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a fresh connection to the same database. Each concurrent
    /// caller takes its own handle; handles are never shared.
    pub fn handle(&self) -> Result<StoreHandle, StoreError> {
        Ok(StoreHandle {
            conn: open_connection(&self.db_path)?,
            retry: self.retry,
        })
    }
}

fn open_connection(db_path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// One caller's connection to the round database.
pub struct StoreHandle {
    conn: Connection,
    retry: RetryPolicy,
}

impl StoreHandle {
    /// Record a round, retrying transient failures.
    ///
    /// The write is an upsert keyed on (team_id, round_number): re-recording
    /// after a lost acknowledgment converges on the same row, and created_at
    /// is kept from the first insert so leaderboard tie-breaks stay stable.
    pub async fn record_round(&mut self, round: &Round) -> Result<(), StoreError> {
        let details = serde_json::to_string(&round.evaluation.scores)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.conn.execute(
                "INSERT INTO rounds (team_id, team_name, round_number, submission,
                     overall_score, score_details, final_submission, exit_reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(team_id, round_number) DO UPDATE SET
                     team_name = excluded.team_name,
                     submission = excluded.submission,
                     overall_score = excluded.overall_score,
                     score_details = excluded.score_details",
                params![
                    round.team_id,
                    round.team_name,
                    round.round_number,
                    round.submission,
                    round.evaluation.overall_score,
                    details,
                    round.final_submission,
                    round.exit_reason.map(|r| r.as_str()),
                    round.created_at,
                ],
            );

            match result.map_err(StoreError::from) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts() => {
                    warn!(
                        team_id = %round.team_id,
                        round = round.round_number,
                        attempt,
                        error = %e,
                        "round write failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(StoreError::RetriesExhausted {
                        attempts: attempt,
                        detail: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Stamp a team's last round as its final submission.
    ///
    /// This is the only mutation an existing row ever sees.
    pub async fn mark_final(
        &mut self,
        team_id: &str,
        round_number: u32,
        reason: ExitReason,
    ) -> Result<(), StoreError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .conn
                .execute(
                    "UPDATE rounds SET final_submission = 1, exit_reason = ?3
                     WHERE team_id = ?1 AND round_number = ?2",
                    params![team_id, round_number, reason.as_str()],
                )
                .map_err(StoreError::from)
                .and_then(|updated| {
                    if updated == 0 {
                        Err(StoreError::RoundNotFound {
                            team_id: team_id.to_string(),
                            round_number,
                        })
                    } else {
                        Ok(())
                    }
                });

            match result {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts() => {
                    warn!(
                        team_id,
                        round = round_number,
                        attempt,
                        error = %e,
                        "final mark failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(StoreError::RetriesExhausted {
                        attempts: attempt,
                        detail: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Current ranking: each team's best round, best score first.
    ///
    /// Ties on score go to the round recorded earlier, then to the lower
    /// round number. Recomputed from the rounds table on every call.
    pub fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT team_id, team_name, round_number, overall_score, created_at FROM rounds",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut best: HashMap<String, LeaderboardEntry> = HashMap::new();
        for row in rows {
            let (team_id, team_name, round_number, overall_score, created_at) = row?;
            let candidate = LeaderboardEntry {
                rank: 0,
                team_id: team_id.clone(),
                team_name,
                round_number,
                overall_score,
                created_at,
            };
            match best.get(&team_id) {
                Some(incumbent) if !beats(&candidate, incumbent) => {}
                _ => {
                    best.insert(team_id, candidate);
                }
            }
        }

        let mut entries: Vec<LeaderboardEntry> = best.into_values().collect();
        entries.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.round_number.cmp(&b.round_number))
                .then_with(|| a.team_id.cmp(&b.team_id))
        });
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = (i + 1) as u32;
        }
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// The single highest-scoring round across all teams, if any.
    pub fn best_round(&self) -> Result<Option<Round>, StoreError> {
        let rounds = self.select_rounds(
            "SELECT team_id, team_name, round_number, submission, overall_score,
                    score_details, final_submission, exit_reason, created_at
             FROM rounds
             ORDER BY overall_score DESC, created_at ASC, round_number ASC
             LIMIT 1",
            [],
        )?;
        Ok(rounds.into_iter().next())
    }

    /// All recorded rounds for one team, in round order.
    pub fn rounds_for_team(&self, team_id: &str) -> Result<Vec<Round>, StoreError> {
        self.select_rounds(
            "SELECT team_id, team_name, round_number, submission, overall_score,
                    score_details, final_submission, exit_reason, created_at
             FROM rounds
             WHERE team_id = ?1
             ORDER BY round_number ASC",
            params![team_id],
        )
    }

    /// Total rounds recorded across all teams.
    pub fn round_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM rounds", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn select_rounds<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<Round>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(RoundRow {
                team_id: row.get(0)?,
                team_name: row.get(1)?,
                round_number: row.get(2)?,
                submission: row.get(3)?,
                overall_score: row.get(4)?,
                score_details: row.get(5)?,
                final_submission: row.get(6)?,
                exit_reason: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;

        let mut rounds = Vec::new();
        for row in rows {
            rounds.push(row?.into_round()?);
        }
        Ok(rounds)
    }
}

/// Raw row before JSON and enum decoding
struct RoundRow {
    team_id: String,
    team_name: String,
    round_number: u32,
    submission: String,
    overall_score: f64,
    score_details: String,
    final_submission: bool,
    exit_reason: Option<String>,
    created_at: i64,
}

impl RoundRow {
    fn into_round(self) -> Result<Round, StoreError> {
        let scores: Vec<MetricScore> = serde_json::from_str(&self.score_details)?;
        let exit_reason = match self.exit_reason {
            Some(s) => Some(ExitReason::parse(&s).ok_or_else(|| {
                StoreError::Corrupt(format!("unknown exit reason '{s}'"))
            })?),
            None => None,
        };
        Ok(Round {
            team_id: self.team_id,
            team_name: self.team_name,
            round_number: self.round_number,
            submission: self.submission,
            evaluation: EvaluationResult {
                overall_score: self.overall_score,
                scores,
            },
            final_submission: self.final_submission,
            exit_reason,
            created_at: self.created_at,
        })
    }
}

fn beats(candidate: &LeaderboardEntry, incumbent: &LeaderboardEntry) -> bool {
    candidate.overall_score > incumbent.overall_score
        || (candidate.overall_score == incumbent.overall_score
            && (candidate.created_at < incumbent.created_at
                || (candidate.created_at == incumbent.created_at
                    && candidate.round_number < incumbent.round_number)))
}
