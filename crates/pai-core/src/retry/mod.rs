//! Retry execution with exponential backoff
//!
//! Wraps calls to flaky backends (vendor HTTP APIs, CLIs) so transient
//! failures are retried and everything else surfaces immediately.
//!
//! - Attempts: one initial try plus `max_retries` retries
//! - Delay: `min(base * 2^n + jitter(0..100ms), max)`
//! - Classification: `retryable_errors` markers matched against the error's
//!   message, name and code (see [`ErrorDescriptor`])
//! - Errors are returned unchanged, never wrapped
//!
//! # Example
//!
//! ```rust,no_run
//! use pai_core::retry::with_retry;
//!
//! async fn example() -> anyhow::Result<u32> {
//!     with_retry(|| async { Ok(42) }, None).await
//! }
//! ```

mod executor;
mod observer;
mod strategies;

pub use executor::{with_retry, RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{
    calculate_delay, io_error_code, AlwaysRetry, ClosurePredicate, ErrorDescriptor,
    MarkerPredicate, NeverRetry, PolicyMarkers, RetryPredicate, JITTER_MS,
};
