//! Backoff delay calculation and retry predicates
//!
//! Errors are classified by matching the policy's marker strings against
//! what an error says about itself (its message, a type/kind name and an
//! optional code), exposed through [`ErrorDescriptor`].

use crate::types::RetryPolicy;
use rand::Rng;
use std::fmt;
use std::io;
use std::time::Duration;

/// Upper bound (exclusive) of the random jitter added to each delay
pub const JITTER_MS: u64 = 100;

/// Calculate the delay before the next attempt
///
/// `retry_index` is zero-based: the delay after the first failed attempt uses
/// index 0. The delay is `base_delay_ms * 2^retry_index`, plus up to
/// `JITTER_MS` of random jitter when enabled, capped at `max_delay_ms`.
///
/// # Example
///
/// ```rust
/// use pai_core::retry::calculate_delay;
/// use pai_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::default();
///
/// assert_eq!(calculate_delay(&policy, 0, false).as_millis(), 1000);
/// assert_eq!(calculate_delay(&policy, 1, false).as_millis(), 2000);
/// assert_eq!(calculate_delay(&policy, 5, false).as_millis(), 10000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, retry_index: u32, jitter: bool) -> Duration {
    let factor = 1u64.checked_shl(retry_index).unwrap_or(u64::MAX);
    let base_delay_ms = policy.base_delay_ms.saturating_mul(factor);

    let jitter_ms = if jitter {
        rand::rng().random_range(0..JITTER_MS)
    } else {
        0
    };

    let delay_ms = base_delay_ms
        .saturating_add(jitter_ms)
        .min(policy.max_delay_ms);

    Duration::from_millis(delay_ms)
}

/// What an error exposes for retry classification
///
/// The message comes from `Display` unless overridden. Name and code are
/// optional; they let markers such as `ECONNRESET` match errors whose text
/// does not spell the code out.
pub trait ErrorDescriptor: fmt::Display {
    /// Human-readable message
    fn error_message(&self) -> String {
        self.to_string()
    }

    /// Type or kind name, e.g. `ConnectionReset`
    fn error_name(&self) -> Option<String> {
        None
    }

    /// Machine-readable code, e.g. `ECONNRESET` or `503`
    fn error_code(&self) -> Option<String> {
        None
    }
}

/// POSIX-style code for the I/O error kinds that matter to network calls
pub fn io_error_code(kind: io::ErrorKind) -> Option<&'static str> {
    let code = match kind {
        io::ErrorKind::ConnectionReset => "ECONNRESET",
        io::ErrorKind::ConnectionRefused => "ECONNREFUSED",
        io::ErrorKind::ConnectionAborted => "ECONNABORTED",
        io::ErrorKind::TimedOut => "ETIMEDOUT",
        io::ErrorKind::BrokenPipe => "EPIPE",
        io::ErrorKind::AddrNotAvailable => "EADDRNOTAVAIL",
        io::ErrorKind::NotFound => "ENOENT",
        io::ErrorKind::PermissionDenied => "EACCES",
        io::ErrorKind::Interrupted => "EINTR",
        _ => return None,
    };
    Some(code)
}

/// Resolver failures surface as uncategorized errors; only the text identifies them
fn is_dns_lookup_failure(err: &io::Error) -> bool {
    let message = err.to_string().to_lowercase();
    message.contains("failed to lookup address information")
        || message.contains("no such host is known")
}

impl ErrorDescriptor for io::Error {
    fn error_name(&self) -> Option<String> {
        Some(format!("{:?}", self.kind()))
    }

    fn error_code(&self) -> Option<String> {
        io_error_code(self.kind())
            .or_else(|| is_dns_lookup_failure(self).then_some("ENOTFOUND"))
            .map(str::to_string)
    }
}

impl ErrorDescriptor for tokio::time::error::Elapsed {
    fn error_name(&self) -> Option<String> {
        Some("Elapsed".to_string())
    }

    fn error_code(&self) -> Option<String> {
        Some("ETIMEDOUT".to_string())
    }
}

impl ErrorDescriptor for crate::Error {
    fn error_name(&self) -> Option<String> {
        Some(self.kind_name().to_string())
    }

    fn error_code(&self) -> Option<String> {
        match self {
            crate::Error::Io(err) => err.error_code(),
            other => other.code().map(str::to_string),
        }
    }
}

impl ErrorDescriptor for anyhow::Error {
    fn error_message(&self) -> String {
        format!("{:#}", self)
    }

    fn error_name(&self) -> Option<String> {
        self.chain()
            .filter_map(described_cause)
            .find_map(|cause| cause.error_name())
    }

    fn error_code(&self) -> Option<String> {
        self.chain()
            .filter_map(described_cause)
            .find_map(|cause| cause.error_code())
    }
}

/// View a link of an error chain as one of the descriptors above
fn described_cause<'a>(
    cause: &'a (dyn std::error::Error + 'static),
) -> Option<&'a dyn ErrorDescriptor> {
    if let Some(err) = cause.downcast_ref::<crate::Error>() {
        return Some(err);
    }
    if let Some(err) = cause.downcast_ref::<io::Error>() {
        return Some(err);
    }
    cause
        .downcast_ref::<tokio::time::error::Elapsed>()
        .map(|err| err as &dyn ErrorDescriptor)
}

impl ErrorDescriptor for String {}

impl ErrorDescriptor for &str {}

impl ErrorDescriptor for Box<dyn std::error::Error + Send + Sync> {}

/// A predicate that determines whether an error should be retried
///
/// The active policy is passed along so predicates can read its marker set.
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Determine whether the given error should be retried
    fn should_retry(&self, error: &E, policy: &RetryPolicy) -> bool;
}

/// Retries errors matching the policy's own `retryable_errors`
///
/// This is the predicate used unless another one is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyMarkers;

impl<E: ErrorDescriptor + ?Sized> RetryPredicate<E> for PolicyMarkers {
    fn should_retry(&self, error: &E, policy: &RetryPolicy) -> bool {
        matches_any(error, &policy.retryable_errors)
    }
}

/// Retries errors matching a fixed marker set, ignoring the policy's
#[derive(Debug, Clone)]
pub struct MarkerPredicate {
    markers: Vec<String>,
}

impl MarkerPredicate {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// Check an error against this predicate's markers
    pub fn matches<E: ErrorDescriptor + ?Sized>(&self, error: &E) -> bool {
        matches_any(error, &self.markers)
    }
}

impl<E: ErrorDescriptor + ?Sized> RetryPredicate<E> for MarkerPredicate {
    fn should_retry(&self, error: &E, _policy: &RetryPolicy) -> bool {
        self.matches(error)
    }
}

/// A predicate that always returns true (all errors are retryable)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E, _policy: &RetryPolicy) -> bool {
        true
    }
}

/// A predicate that never retries (no errors are retryable)
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl<E: ?Sized> RetryPredicate<E> for NeverRetry {
    fn should_retry(&self, _error: &E, _policy: &RetryPolicy) -> bool {
        false
    }
}

/// A predicate that uses a closure to determine retryability
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    /// Create a new closure-based predicate
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E, _policy: &RetryPolicy) -> bool {
        (self.predicate)(error)
    }
}

/// Case-insensitive substring match of any marker against message, name or code
fn matches_any<E: ErrorDescriptor + ?Sized>(error: &E, markers: &[String]) -> bool {
    if markers.is_empty() {
        return false;
    }

    let haystacks: Vec<String> = [
        Some(error.error_message()),
        error.error_name(),
        error.error_code(),
    ]
    .into_iter()
    .flatten()
    .map(|s| s.to_lowercase())
    .collect();

    markers
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| m.to_lowercase())
        .any(|marker| haystacks.iter().any(|h| h.contains(&marker)))
}
