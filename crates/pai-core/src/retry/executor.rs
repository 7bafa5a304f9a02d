//! Retry execution engine
//!
//! Runs an async operation until it succeeds, fails with a non-retryable
//! error, or uses up `max_retries + 1` attempts. Errors are returned exactly
//! as the operation produced them so callers can match on them.

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use crate::types::RetryPolicy;

use super::observer::{NoOpObserver, RetryObserver};
use super::strategies::{calculate_delay, ErrorDescriptor, PolicyMarkers, RetryPredicate};

/// Execute an async operation with retry, classifying errors by the policy's markers
///
/// `None` uses `RetryPolicy::default()`. Jitter is enabled and nothing is logged.
///
/// # Example
///
/// ```rust,no_run
/// use pai_core::retry::with_retry;
/// use pai_core::types::RetryPolicy;
///
/// async fn example() -> Result<String, std::io::Error> {
///     let policy = RetryPolicy::builder().max_retries(2).build().unwrap();
///
///     with_retry(|| async { Ok("issues".to_string()) }, Some(&policy)).await
/// }
/// ```
pub async fn with_retry<F, Fut, T, E>(op: F, policy: Option<&RetryPolicy>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: ErrorDescriptor,
{
    let policy = policy.cloned().unwrap_or_default();

    RetryExecutorBuilder::new()
        .with_policy(policy)
        .build()
        .execute(op)
        .await
}

/// Builder for configuring a `RetryExecutor`
///
/// ```rust
/// use pai_core::retry::{RetryExecutorBuilder, TracingObserver};
/// use pai_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::default())
///     .with_observer(TracingObserver::new("observability.query"))
///     .with_jitter(true)
///     .build();
/// assert_eq!(executor.policy().max_retries, 3);
/// ```
pub struct RetryExecutorBuilder<P = PolicyMarkers, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    jitter: bool,
}

impl Default for RetryExecutorBuilder<PolicyMarkers, NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<PolicyMarkers, NoOpObserver> {
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            predicate: PolicyMarkers,
            observer: NoOpObserver,
            jitter: true,
        }
    }
}

impl<P, O> RetryExecutorBuilder<P, O> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the error classification
    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<P2, O> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate,
            observer: self.observer,
            jitter: self.jitter,
        }
    }

    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<P, O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            jitter: self.jitter,
        }
    }

    /// Enable or disable the 0-100ms random jitter (enabled by default)
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn build(self) -> RetryExecutor<P, O> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
            jitter: self.jitter,
        }
    }
}

/// A retry executor with a policy, predicate and observer
///
/// Use `RetryExecutorBuilder` to create an instance. An executor holds no
/// per-call state and can be shared between calls.
pub struct RetryExecutor<P = PolicyMarkers, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    jitter: bool,
}

impl<P, O> RetryExecutor<P, O> {
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<P, O> RetryExecutor<P, O>
where
    O: RetryObserver,
{
    /// Execute an operation with retry
    ///
    /// Returns the first successful result, or the error of the attempt that
    /// ended the sequence (non-retryable, or the last one) unchanged.
    pub async fn execute<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: RetryPredicate<E>,
    {
        let start = Instant::now();
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.observer.on_attempt_start(attempt, max_attempts);

            let err = match op().await {
                Ok(result) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(result);
                }
                Err(err) => err,
            };

            if !self.predicate.should_retry(&err, &self.policy) {
                self.observer.on_non_retryable(attempt, &err);
                return Err(err);
            }

            if attempt >= max_attempts {
                self.observer.on_exhausted(attempt, &err);
                return Err(err);
            }

            let delay = calculate_delay(&self.policy, attempt - 1, self.jitter);
            self.observer.on_attempt_failed(attempt, &err, delay);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
