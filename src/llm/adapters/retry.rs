//! Retry policy for transient adapter failures

use crate::llm::adapters::transport_types::AdapterError;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff for transient failures
///
/// An operation runs at most `max_retries + 1` times. The delay starts at
/// `initial_backoff` and doubles after every retry. Errors for which
/// [`AdapterError::is_transient`] is false are returned immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out
    pub fn run<T, F>(&self, mut op: F) -> Result<T, AdapterError>
    where
        F: FnMut() -> Result<T, AdapterError>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Transient error (attempt {}/{}): {}. Backing off {}ms",
                        attempt,
                        self.max_retries + 1,
                        err,
                        backoff.as_millis()
                    );
                    if !backoff.is_zero() {
                        std::thread::sleep(backoff);
                    }
                    backoff = backoff.saturating_mul(2);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}
