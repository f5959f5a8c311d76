//! Retry scheduling for delivery groups.
//!
//! A clean abstraction over retry configuration and logic, testable
//! independently of the publish coordinator. Retry rounds are 0-indexed: a
//! group's initial attempt is round 0, and a retry is permitted while the
//! round count stays below `max_retries` and failed entries remain.
//!
//! The wait is charged once per round regardless of how many entries remain
//! in the round's working set. Only the failed subset of the immediately
//! preceding attempt is resubmitted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy configuration for the publish engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry rounds per delivery group.
    ///
    /// Default: 2 rounds (3 attempts total including the initial one)
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay before the first retry round (in milliseconds).
    ///
    /// Default: 1000 ms
    #[serde(default = "defaults::base_delay_ms")]
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay for each subsequent round.
    ///
    /// The wait before retry round `r` is `base * multiplier^r`.
    ///
    /// Default: 2.0
    #[serde(default = "defaults::backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Maximum delay between rounds (in milliseconds).
    ///
    /// Caps the exponential backoff to prevent excessively long waits.
    ///
    /// Default: 30000 ms
    #[serde(default = "defaults::max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            base_delay_ms: defaults::base_delay_ms(),
            backoff_multiplier: defaults::backoff_multiplier(),
            max_delay_ms: defaults::max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if another retry round is permitted after `round` completed rounds.
    #[must_use]
    pub const fn should_retry(&self, round: u32) -> bool {
        round < self.max_retries
    }

    /// Wait duration before retry round `round` (0-indexed).
    ///
    /// `base * multiplier^round`, capped at `max_delay_ms`. The exponent is
    /// clamped to keep the computation finite for absurd round counts.
    #[must_use]
    pub fn delay_for(&self, round: u32) -> Duration {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
        let factor = self.backoff_multiplier.powi(round.min(63) as i32);

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let delay_ms = {
            let capped = (self.base_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
            capped.max(0.0) as u64
        };

        Duration::from_millis(delay_ms)
    }

    /// Number of retry rounds still available after `round` completed rounds.
    #[must_use]
    pub const fn remaining_rounds(&self, round: u32) -> u32 {
        self.max_retries.saturating_sub(round)
    }
}

mod defaults {
    pub const fn max_retries() -> u32 {
        2
    }

    pub const fn base_delay_ms() -> u64 {
        1000 // 1 second
    }

    pub const fn backoff_multiplier() -> f64 {
        2.0
    }

    pub const fn max_delay_ms() -> u64 {
        30_000 // 30 seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay_ms, 1000);
        assert!((policy.backoff_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(policy.max_delay_ms, 30_000);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));

        // No further rounds once max_retries is reached
        assert!(!policy.should_retry(2));
        assert!(!policy.should_retry(100));
    }

    #[test]
    fn test_delay_doubles_per_round() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy {
            max_retries: 30,
            base_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 10_000,
        };

        assert_eq!(policy.delay_for(3), Duration::from_millis(8000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(10_000));
        assert_eq!(policy.delay_for(20), Duration::from_millis(10_000));
        // Exponent clamp keeps huge round counts finite
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn test_remaining_rounds() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.remaining_rounds(0), 2);
        assert_eq!(policy.remaining_rounds(1), 1);
        assert_eq!(policy.remaining_rounds(2), 0);
        assert_eq!(policy.remaining_rounds(10), 0); // Saturating
    }

    #[test]
    fn test_custom_multiplier() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay_ms: 100,
            backoff_multiplier: 3.0,
            max_delay_ms: 30_000,
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(300));
        assert_eq!(policy.delay_for(2), Duration::from_millis(900));
    }
}
