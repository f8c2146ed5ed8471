//! Retry policy
//!
//! Exponential backoff with a cap and a fixed attempt ceiling. The ceiling is
//! what guarantees every job eventually reaches a terminal state.

use std::time::Duration;

/// Default number of attempts per job, the first one included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Delay before the first retry
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
/// Upper bound for any single delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
        }
    }

    /// Delay to wait after `attempt` (1-based) failed with a retryable error
    ///
    /// Returns `None` once the attempt ceiling is reached.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(
            self.initial_delay
                .checked_mul(factor)
                .unwrap_or(self.max_delay)
                .min(self.max_delay),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY)
    }
}
