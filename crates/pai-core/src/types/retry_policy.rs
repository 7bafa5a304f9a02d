//! Retry policy configuration
//!
//! A `RetryPolicy` is passed at call sites of the retry engine or loaded from
//! the `retry` sections of `providers.yaml`. Every field is optional in the
//! file; missing fields take the defaults below.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Error markers retried when a policy does not list its own
pub const DEFAULT_RETRYABLE_ERRORS: &[&str] = &[
    "ECONNRESET",
    "ETIMEDOUT",
    "ENOTFOUND",
    "429",
    "500",
    "502",
    "503",
    "504",
];

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Retries after the initial attempt (total attempts = max_retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay in milliseconds, doubled on every retry
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound for a single delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Substrings matched against an error's message, name and code
    #[serde(default = "default_retryable_errors")]
    pub retryable_errors: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            retryable_errors: default_retryable_errors(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1000 // 1 second
}
fn default_max_delay() -> u64 {
    10000 // 10 seconds
}
fn default_retryable_errors() -> Vec<String> {
    DEFAULT_RETRYABLE_ERRORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl RetryPolicy {
    /// Start building a policy from the defaults
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// A policy that makes exactly one attempt
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total number of attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Check the delay bounds
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms == 0 {
            return Err(Error::configuration(
                "retry policy base-delay-ms must be positive",
            ));
        }
        if self.max_delay_ms == 0 {
            return Err(Error::configuration(
                "retry policy max-delay-ms must be positive",
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::configuration(format!(
                "retry policy max-delay-ms ({}) must be >= base-delay-ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        Ok(())
    }
}

/// Builder for `RetryPolicy`, validating on `build`
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    pub fn base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.policy.base_delay_ms = base_delay_ms;
        self
    }

    pub fn max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.policy.max_delay_ms = max_delay_ms;
        self
    }

    /// Replace the retryable marker set
    pub fn retryable_errors<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.retryable_errors = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Add one marker to the current set
    pub fn retry_on(mut self, marker: impl Into<String>) -> Self {
        self.policy.retryable_errors.push(marker.into());
        self
    }

    pub fn build(self) -> Result<RetryPolicy> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}
