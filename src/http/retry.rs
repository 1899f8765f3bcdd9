use std::time::Duration;

use crate::error::ClientError;

/// Bounded exponential-backoff policy for requests marked retryable.
///
/// `max_attempts` counts every dispatch including the first, so the default
/// policy sends a request at most three times. The wait before attempt
/// `n + 1` is `base_delay * 2^n`.
///
/// Every failure except an authentication failure is retried unless the
/// policy is narrowed with [`transient_only`](Self::transient_only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    transient_only: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            transient_only: false,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first send and is clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            transient_only: false,
        }
    }

    /// Restrict retries to transport errors, 408, 429 and 5xx.
    pub fn transient_only(mut self) -> Self {
        self.transient_only = true;
        self
    }

    pub fn is_transient_only(&self) -> bool {
        self.transient_only
    }

    /// Whether a failed dispatch may be sent again under this policy.
    ///
    /// A 401 is never retried; the response handlers deal with it. Local failures
    /// (bad endpoint, unencodable body) would fail the same way again.
    pub fn retries(&self, err: &ClientError) -> bool {
        match err {
            ClientError::Authentication(_) | ClientError::Config(_) | ClientError::Validation(_) => {
                false
            }
            ClientError::Transport(e) if e.is_builder() => false,
            other if self.transient_only => other.is_transient(),
            _ => true,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Whether another dispatch is allowed after `attempt` attempts have failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
