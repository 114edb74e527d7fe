/*!
 * Bounded retry with injectable backoff.
 *
 * A `RetryPolicy` owns the attempt ceiling and the delay function; the
 * operation being retried knows nothing about either. Delays are waited
 * through a `Sleeper` and every wait races the run's cancellation token.
 */

use std::fmt::{self, Debug, Display};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::app_config::RetryConfig;
use crate::errors::ProviderError;
use crate::translation::clock::Sleeper;

/// Errors that can ask for an extended cooldown before the next attempt
pub trait RetryableError {
    /// Whether the remote side signalled rate limiting
    fn is_rate_limited(&self) -> bool;

    /// Whether the error means the run was abandoned; never retried
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl RetryableError for ProviderError {
    fn is_rate_limited(&self) -> bool {
        ProviderError::is_rate_limited(self)
    }

    fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }
}

/// Delay to wait before attempt `n` (1-based)
pub type DelayFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Result of running an operation under a retry policy
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: E },
    Cancelled { attempts: u32 },
}

/// Attempt ceiling plus backoff schedule
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay_fn: DelayFn,
    rate_limit_cooldown: Duration,
}

impl Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("rate_limit_cooldown", &self.rate_limit_cooldown)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Create a policy from an arbitrary delay function
    pub fn new(max_attempts: u32, delay_fn: DelayFn, rate_limit_cooldown: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_fn,
            rate_limit_cooldown,
        }
    }

    /// Politeness delay before the first attempt, then `backoff_base * n` before attempt `n`
    pub fn linear(politeness: Duration, backoff_base: Duration, max_attempts: u32, rate_limit_cooldown: Duration) -> Self {
        let delay_fn: DelayFn = Arc::new(move |attempt| {
            if attempt <= 1 {
                politeness
            } else {
                backoff_base * attempt
            }
        });
        Self::new(max_attempts, delay_fn, rate_limit_cooldown)
    }

    /// Policy without any waiting, for tests
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Arc::new(|_| Duration::ZERO), Duration::ZERO)
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::linear(
            Duration::from_millis(config.politeness_delay_ms),
            Duration::from_millis(config.backoff_base_ms),
            config.max_attempts,
            Duration::from_millis(config.rate_limit_cooldown_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        self.rate_limit_cooldown
    }

    /// Delay waited before attempt `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        (self.delay_fn)(attempt)
    }

    /// Run `operation` until it succeeds, the attempt budget runs out, or `cancel` fires.
    ///
    /// The operation receives the 1-based attempt number. A rate-limited failure
    /// adds the cooldown before the next attempt's regular delay.
    pub async fn execute<T, E, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + Display,
    {
        let mut attempt = 0;
        let mut cooldown = Duration::ZERO;

        loop {
            attempt += 1;
            let wait = cooldown + self.delay_for(attempt);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return RetryOutcome::Cancelled { attempts: attempt - 1 };
                }
                _ = sleeper.sleep(wait) => {}
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return RetryOutcome::Cancelled { attempts: attempt };
                }
                result = operation(attempt) => result,
            };

            match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Operation succeeded on attempt {}/{}", attempt, self.max_attempts);
                    }
                    return RetryOutcome::Succeeded { value, attempts: attempt };
                }
                Err(e) if e.is_cancelled() => {
                    return RetryOutcome::Cancelled { attempts: attempt };
                }
                Err(e) if attempt >= self.max_attempts => {
                    warn!("Operation failed after {} attempts: {}", attempt, e);
                    return RetryOutcome::Exhausted { attempts: attempt, last_error: e };
                }
                Err(e) => {
                    cooldown = if e.is_rate_limited() {
                        self.rate_limit_cooldown
                    } else {
                        Duration::ZERO
                    };
                    warn!(
                        "Attempt {}/{} failed, retrying in {}ms: {}",
                        attempt,
                        self.max_attempts,
                        (cooldown + self.delay_for(attempt + 1)).as_millis(),
                        e
                    );
                }
            }
        }
    }
}
