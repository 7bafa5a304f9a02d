//! Adapter trait definitions

use crate::manifest::AdapterManifest;
use async_trait::async_trait;
use pai_core::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Result of an adapter health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub healthy: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            message: None,
            latency_ms: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            message: Some(message.into()),
            latency_ms: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// Behaviour every adapter shares, whatever its domain
///
/// Domain interfaces extend this trait (see `builtin::SecretsProvider`), and
/// factories hand out `Box<dyn DomainTrait>`.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Adapter name as used in `providers.yaml`
    fn name(&self) -> &str;

    /// Check the adapter can reach its backend
    async fn health_check(&self) -> HealthStatus;
}

/// Compile-time registration of an adapter implementing domain trait `P`
///
/// `Config` is the adapter's typed settings; the free-form `adapters.<name>`
/// section of the domain config is deserialized into it before `create`.
pub trait AdapterFactory<P: ?Sized>: 'static {
    type Config: DeserializeOwned;

    /// Built-in manifest advertised to discovery
    fn manifest() -> AdapterManifest;

    /// Construct a fresh instance
    fn create(config: Self::Config) -> Result<Box<P>>;
}
