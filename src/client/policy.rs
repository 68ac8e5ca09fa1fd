use crate::client::error_classification::ErrorInfo;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// How to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Fail,
}

/// Attempt budget and capped exponential backoff.
///
/// Attempts are 1-based. The wait before attempt `n` (n >= 2) is
/// `base_delay * 2^(n-2)`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Attempt budget; at least one attempt is always made.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait before `attempt`; zero for the first attempt.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let base = self.base_delay.as_millis() as u64;
        let factor = 1u64.checked_shl(attempt - 2).unwrap_or(u64::MAX);
        let cap = self.max_delay.as_millis() as u64;
        Duration::from_millis(base.saturating_mul(factor).min(cap))
    }

    /// Decide what to do after `attempt` failed with `err`.
    pub fn decide(&self, err: &ErrorInfo, attempt: u32, auto_retry: bool) -> RetryDecision {
        if err.retryable && auto_retry && attempt < self.attempts() {
            RetryDecision::Retry {
                delay: self.backoff_delay(attempt + 1),
            }
        } else {
            RetryDecision::Fail
        }
    }
}
