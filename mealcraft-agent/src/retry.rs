//! Bounded retry with a tagged outcome
//!
//! Whether an attempt is repeated is decided by the error's `ErrorStatus`:
//! temporary errors are retried until the budget of attempts runs out,
//! anything else stops the loop at once.

use mealcraft_llm::Error;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of generation attempts per category
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between attempts; zero disables sleeping
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::ZERO,
        }
    }
}

/// How a retried operation ended.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Success { value: T, attempts: u32 },
    /// Every attempt failed with a retryable error; `error` is the last one
    Exhausted { error: Error, attempts: u32 },
    /// A non-retryable error stopped the loop
    Aborted { error: Error, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Success { attempts, .. }
            | RetryOutcome::Exhausted { attempts, .. }
            | RetryOutcome::Aborted { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success { .. })
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run `attempt` (called with the 1-based attempt number) until it
    /// succeeds, fails permanently or the attempts are used up.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut n = 0;
        loop {
            n += 1;
            match attempt(n).await {
                Ok(value) => return RetryOutcome::Success { value, attempts: n },
                Err(error) if !error.is_retryable() => {
                    return RetryOutcome::Aborted { error, attempts: n };
                }
                Err(error) if n >= max_attempts => {
                    return RetryOutcome::Exhausted {
                        error: error.persist(),
                        attempts: n,
                    };
                }
                Err(error) => {
                    warn!(attempt = n, max_attempts, error = %error, "attempt failed, retrying");
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }
    }
}
