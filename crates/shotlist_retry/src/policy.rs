//! Bounded exponential backoff for transient upstream errors.

use crate::RetryConfig;
use derive_getters::Getters;
use shotlist_error::RetryableError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// Retry policy for a single upstream call.
///
/// Stateless: every call to [`RetryPolicy::run`] starts a fresh backoff
/// sequence, so one policy can be shared by concurrent callers.
///
/// # Examples
///
/// ```
/// use shotlist_retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(
///     policy.delays().collect::<Vec<_>>(),
///     vec![
///         Duration::from_secs(2),
///         Duration::from_secs(4),
///         Duration::from_secs(8),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct RetryPolicy {
    /// Attempts after the first one
    max_retries: usize,
    /// Delay before the first retry
    initial_backoff: Duration,
    /// Multiplier applied to each following delay
    factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_retries: usize, initial_backoff: Duration, factor: u32) -> Self {
        Self {
            max_retries,
            initial_backoff,
            factor,
        }
    }

    /// Build a policy from the `[retry]` configuration section.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            *config.max_retries(),
            Duration::from_millis(*config.initial_backoff_ms()),
            *config.factor(),
        )
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO, 1)
    }

    /// Backoff delays, one per retry: `initial * factor^n`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let initial = self.initial_backoff;
        let factor = self.factor;
        (0..self.max_retries as u32).map(move |n| initial.saturating_mul(factor.saturating_pow(n)))
    }

    /// Run `operation`, retrying while the error is [`RetryableError::is_retryable`].
    ///
    /// # Errors
    ///
    /// Returns the first permanent error, or the last transient error once
    /// retries are exhausted.
    pub async fn run<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + Display,
    {
        self.run_if(|e: &E| e.is_retryable(), operation).await
    }

    /// Run `operation`, retrying while `is_transient` accepts the error.
    ///
    /// # Errors
    ///
    /// Returns the first error `is_transient` rejects, or the last error
    /// once retries are exhausted.
    pub async fn run_if<F, Fut, T, E, P>(&self, is_transient: P, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let max_retries = self.max_retries;
        let is_transient = &is_transient;
        let mut attempt = 0usize;

        Retry::spawn(self.delays(), || {
            attempt += 1;
            let current = attempt;
            let call = operation();
            async move {
                match call.await {
                    Ok(value) => {
                        if current > 1 {
                            debug!(attempt = current, "Upstream call succeeded after retry");
                        }
                        Ok(value)
                    }
                    Err(e) if is_transient(&e) => {
                        if current > max_retries {
                            warn!(attempt = current, error = %e, "Retries exhausted");
                        } else {
                            warn!(attempt = current, error = %e, "Transient error, will retry");
                        }
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        warn!(attempt = current, error = %e, "Permanent error, failing immediately");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await
    }
}
