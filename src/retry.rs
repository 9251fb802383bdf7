//! Bounded retry policy with exponential backoff.
//!
//! Producer, metric, judge, and store calls all retry transient failures
//! under the same arithmetic: one initial attempt plus up to `max_retries`
//! retries, doubling the delay before each retry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponent cap so a misconfigured policy cannot sleep for hours.
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Retry budget for a single fallible call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (3 means 4 calls total).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    /// Create a policy with an explicit budget.
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Policy with no retries at all.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Total number of calls the budget allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay to sleep before the given retry (1-based).
    ///
    /// With the default policy: 1s before retry 1, 2s before retry 2,
    /// 4s before retry 3. The exponent is capped so the delay never
    /// exceeds `base * 2^6`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        Duration::from_millis(self.base_delay_ms * 2u64.pow(exponent))
    }
}

impl Default for RetryPolicy {
    /// Three retries with a one second base delay (1s, 2s, 4s).
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_delay_ladder() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_exponent_capped() {
        let policy = RetryPolicy::new(100, 1000);
        // 2^6 = 64s cap regardless of retry index
        assert_eq!(policy.delay_for(7), Duration::from_secs(64));
        assert_eq!(policy.delay_for(50), Duration::from_secs(64));
    }

    #[test]
    fn test_none_policy() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_for(1), Duration::ZERO);
    }

    #[test]
    fn test_custom_base_delay() {
        let policy = RetryPolicy::new(2, 250);
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
    }
}
