//! Retry policy for fallible async remote calls.
//!
//! Semantics:
//! - `max_attempts` counts total attempts (initial call + retries).
//! - The `retry_if` predicate decides whether a failure is transient; anything
//!   else returns immediately as [`CallError::Inner`].
//! - The wait before 0-based attempt `k` is `jitter.apply(backoff.delay(k))`;
//!   attempt 0 is never delayed.
//! - When the budget runs out on transient failures the sequence ends as
//!   [`CallError::Exhausted`] carrying the last failure.
//! - Every retry emits one `tracing::warn!` with the upcoming attempt index,
//!   the computed delay, and the triggering error message.
//! - A [`CancelToken`] aborts a pending wait or an in-flight attempt and
//!   resolves the sequence as [`CallError::Cancelled`].
//!
//! Invariants:
//! - Attempts run strictly sequentially and never exceed `max_attempts`.
//! - Exactly one success value or one [`CallError`] is produced per sequence.
//! - Attempt state lives on the stack of one `execute` call; concurrent
//!   sequences share nothing.
//!
//! ```rust
//! use std::time::Duration;
//! use repomuse::{Backoff, RetryPolicy};
//!
//! #[derive(Debug)]
//! struct Throttled;
//! impl std::fmt::Display for Throttled {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "throttled")
//!     }
//! }
//! impl std::error::Error for Throttled {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::<Throttled>::builder()
//!     .max_attempts(3)
//!     .backoff(Backoff::exponential(Duration::from_millis(10)))
//!     .build()
//!     .unwrap();
//! let result = policy.execute(|| async { Err::<(), _>(Throttled) }).await;
//! assert!(result.unwrap_err().is_exhausted());
//! # });
//! ```

use crate::backoff::BackoffError;
use crate::{Backoff, CallError, CancelToken, Jitter, Sleeper, TokioSleeper};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Retry policy combining attempt budget, backoff, jitter, retryability
/// predicate, and sleeper.
pub struct RetryPolicy<E> {
    max_attempts: usize,
    backoff: Backoff,
    jitter: Jitter,
    retry_if: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    sleeper: Arc<dyn Sleeper>,
}

// Manual impl: cloning must not require `E: Clone`.
impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff.clone(),
            jitter: self.jitter,
            retry_if: self.retry_if.clone(),
            sleeper: self.sleeper.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("retry_if", &"<predicate>")
            .field("sleeper", &"<sleeper>")
            .finish()
    }
}

impl<E> RetryPolicy<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Construct a new builder with defaults.
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new()
    }

    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Execute an async operation under this policy.
    pub async fn execute<T, Fut, Op>(&self, operation: Op) -> Result<T, CallError<E>>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        self.run(operation, None).await
    }

    /// Execute with an external cancellation signal. The token aborts a
    /// pending backoff wait or an in-flight attempt.
    pub async fn execute_with_cancel<T, Fut, Op>(
        &self,
        operation: Op,
        cancel: &CancelToken,
    ) -> Result<T, CallError<E>>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        self.run(operation, Some(cancel)).await
    }

    async fn run<T, Fut, Op>(
        &self,
        mut operation: Op,
        cancel: Option<&CancelToken>,
    ) -> Result<T, CallError<E>>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        for attempt in 0..self.max_attempts {
            let outcome = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(CallError::Cancelled),
                    outcome = operation() => outcome,
                },
                None => operation().await,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !(self.retry_if)(&e) {
                        return Err(CallError::Inner(e));
                    }
                    if attempt + 1 >= self.max_attempts {
                        return Err(CallError::Exhausted {
                            attempts: self.max_attempts,
                            last: e,
                        });
                    }

                    let delay = self.jitter.apply(self.backoff.delay(attempt + 1));
                    tracing::warn!(
                        next_attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, backing off before retry"
                    );

                    match cancel {
                        Some(token) => tokio::select! {
                            biased;
                            _ = token.cancelled() => return Err(CallError::Cancelled),
                            _ = self.sleeper.sleep(delay) => {}
                        },
                        None => self.sleeper.sleep(delay).await,
                    }
                }
            }
        }

        // Every loop iteration returns on success, terminal failure, or the
        // exhausted final attempt, and max_attempts is validated > 0.
        debug_assert!(false, "retry loop must produce a terminal outcome");
        unreachable!()
    }
}

/// Builder for [`RetryPolicy`].
pub struct RetryPolicyBuilder<E> {
    max_attempts: usize,
    backoff: Backoff,
    jitter: Jitter,
    retry_if: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    sleeper: Arc<dyn Sleeper>,
}

/// Errors produced while building a retry policy.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// `max_attempts` must be > 0.
    ZeroAttempts,
    /// The backoff schedule rejected its configuration.
    Backoff(BackoffError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::ZeroAttempts => write!(f, "max_attempts must be > 0"),
            BuildError::Backoff(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<BackoffError> for BuildError {
    fn from(e: BackoffError) -> Self {
        BuildError::Backoff(e)
    }
}

impl<E> RetryPolicyBuilder<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Create a builder with sane defaults: 3 attempts, exponential backoff
    /// from 1s doubling per retry, no jitter, retry every failure.
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::exponential(Duration::from_secs(1)),
            jitter: Jitter::None,
            retry_if: Arc::new(|_| true),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Set total attempts (initial call + retries). Must be > 0.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff schedule.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the jitter strategy.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Predicate deciding whether a failure is transient and worth retrying.
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Arc::new(predicate);
        self
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Build the retry policy, validating inputs.
    pub fn build(self) -> Result<RetryPolicy<E>, BuildError> {
        if self.max_attempts == 0 {
            return Err(BuildError::ZeroAttempts);
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            jitter: self.jitter,
            retry_if: self.retry_if,
            sleeper: self.sleeper,
        })
    }
}

impl<E> Default for RetryPolicyBuilder<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Serde-friendly retry configuration, for callers that load policy knobs
/// from a config file instead of building one in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts (initial call + retries).
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: usize,
    /// Base delay; the first retry waits `initial_delay_ms * multiplier`.
    #[serde(default = "defaults::initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Growth factor per retry.
    #[serde(default = "defaults::multiplier")]
    pub multiplier: f64,
    /// Optional ceiling on any single delay.
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
    /// Spread delays uniformly over `[0, delay]` to avoid retry storms.
    #[serde(default)]
    pub full_jitter: bool,
}

mod defaults {
    pub(super) fn max_attempts() -> usize {
        3
    }
    pub(super) fn initial_delay_ms() -> u64 {
        1_000
    }
    pub(super) fn multiplier() -> f64 {
        2.0
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_delay_ms: defaults::initial_delay_ms(),
            multiplier: defaults::multiplier(),
            max_delay_ms: None,
            full_jitter: false,
        }
    }
}

impl RetryConfig {
    /// Turn the configuration into a policy builder, so callers can still
    /// attach their retryability predicate or a test sleeper.
    pub fn policy_builder<E>(&self) -> Result<RetryPolicyBuilder<E>, BuildError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut backoff = Backoff::exponential(Duration::from_millis(self.initial_delay_ms))
            .with_multiplier(self.multiplier)?;
        if let Some(cap) = self.max_delay_ms {
            backoff = backoff.with_max(Duration::from_millis(cap))?;
        }
        let jitter = if self.full_jitter { Jitter::Full } else { Jitter::None };
        Ok(RetryPolicy::builder()
            .max_attempts(self.max_attempts)
            .backoff(backoff)
            .with_jitter(jitter))
    }

    /// Turn the configuration into a policy with the default retry-everything
    /// predicate.
    pub fn build_policy<E>(&self) -> Result<RetryPolicy<E>, BuildError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.policy_builder()?.build()
    }
}
