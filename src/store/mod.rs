//! Durable ranking storage.
//!
//! Every evaluated round is persisted to SQLite before the judge sees it,
//! so a crashed or timed-out team still counts for whatever it recorded.
//!
//! # Example
//!
//! ```ignore
//! use bakeoff::store::RankingStore;
//!
//! let store = RankingStore::open("/tmp/bakeoff/run.db")?;
//! let mut handle = store.handle()?;
//! handle.record_round(&round).await?;
//! let board = handle.leaderboard(None)?;
//! ```

mod ranking;

pub use ranking::{RankingStore, StoreError, StoreHandle};
