//! Bounded exponential backoff for reaching the worker.
//!
//! Only failures where the payload provably never reached the worker
//! are retried. See [`crate::executor::ScriptClient`].

use std::time::Duration;

/// Tunable parameters for the retry strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Pauses between consecutive attempts.
    ///
    /// Yields `max_attempts - 1` delays; when it runs dry the caller has
    /// used up its attempts.
    pub fn backoff(&self) -> impl Iterator<Item = Duration> + '_ {
        let first = self.initial_delay.min(self.max_delay);
        std::iter::successors(Some(first), move |prev| {
            Some(prev.mul_f64(self.multiplier.max(1.0)).min(self.max_delay))
        })
        .take(self.max_attempts.saturating_sub(1) as usize)
    }
}
