//! Pluggable policies for what a failed network attempt should do next.

use std::time::Duration;

use crate::net::error::Error;

/// What a [`NetworkErrorHandlingStrategy`] decides to do after an attempt
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Give up; the task completes with this attempt's error.
    Completed,
    /// Retry after the given delay.
    WaitForRetry { after: Duration },
}

/// Decides, given a failed attempt, whether a [`crate::net::task::RetryingTask`]
/// should retry or give up.
///
/// The task itself drives the retry loop (sleeping and re-invoking the
/// fetcher); the strategy is a pure decision function with no back-reference
/// to the task, which is what keeps this free of the reference cycle a
/// callback-based design would otherwise need.
pub trait NetworkErrorHandlingStrategy: Send + Sync {
    fn decide(&self, error: &Error, attempt: u32) -> Decision;
}

/// Retries up to `max_attempts` times with exponential backoff, doubling
/// `base_delay` each attempt, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        ExponentialBackoff {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl NetworkErrorHandlingStrategy for ExponentialBackoff {
    fn decide(&self, _error: &Error, attempt: u32) -> Decision {
        if attempt >= self.max_attempts {
            return Decision::Completed;
        }
        let scale = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(scale).min(self.max_delay);
        Decision::WaitForRetry { after: delay }
    }
}

/// Never retries: the first failure is final.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl NetworkErrorHandlingStrategy for NoRetry {
    fn decide(&self, _error: &Error, _attempt: u32) -> Decision {
        Decision::Completed
    }
}
