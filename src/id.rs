//! ID generation utilities for bakeoff
//!
//! Provides functions for generating unique identifiers for executions.

use sha2::{Digest, Sha256};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a unique execution ID from a task seed
///
/// Format: `{timestamp_ms}-{hash_hex}`
/// Example: `1738300800123-a1b2c3d4`
pub fn execution_id(seed: &str) -> String {
    let timestamp = now_ms();
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(timestamp.to_le_bytes());
    let digest = hasher.finalize();
    format!("{}-{}", timestamp, hex::encode(&digest[..4]))
}
