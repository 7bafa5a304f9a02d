//! Provider resolution
//!
//! Resolving a provider for a domain goes through four steps, and each can
//! fail with its own error:
//!
//! | Step | Failure |
//! |------|---------|
//! | load the domain config | `Configuration` |
//! | discover the adapter | `AdapterNotFound` |
//! | find a registered constructor | `AdapterNotFound` |
//! | construct (and, with fallback, health-check) | the adapter's error / `Unhealthy` |

use std::sync::Arc;

use pai_core::types::{DomainConfig, RetryPolicy};
use pai_core::{ConfigLoader, Error, Result};
use tracing::{debug, info, warn};

use crate::discovery::AdapterLoader;
use crate::registry::AdapterRegistry;
use crate::traits::Adapter;

/// Resolves configured adapters for domain trait `P`
pub struct ProviderFactory<P: ?Sized> {
    config: Arc<ConfigLoader>,
    adapters: Arc<AdapterLoader>,
    registry: AdapterRegistry<P>,
}

impl<P> ProviderFactory<P>
where
    P: ?Sized + Adapter + 'static,
{
    /// Create a factory; the registry's built-in manifests join discovery
    pub fn new(
        config: Arc<ConfigLoader>,
        adapters: Arc<AdapterLoader>,
        registry: AdapterRegistry<P>,
    ) -> Self {
        adapters.register_manifests(registry.manifests());
        Self {
            config,
            adapters,
            registry,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry<P> {
        &self.registry
    }

    /// Build the preferred adapter, or the domain's primary
    pub async fn get_provider(&self, domain: &str, preferred: Option<&str>) -> Result<Box<P>> {
        let config = self.domain_config(domain).await?;
        let name = preferred.unwrap_or(&config.primary);
        self.build(&config, name).await
    }

    /// Build the primary and require it to be healthy, else try the fallback
    ///
    /// When the fallback also fails, the primary's error is returned and the
    /// fallback's is logged.
    pub async fn get_provider_with_fallback(&self, domain: &str) -> Result<Box<P>> {
        let config = self.domain_config(domain).await?;

        let primary_err = match self.build_healthy(&config, &config.primary).await {
            Ok(provider) => return Ok(provider),
            Err(e) => e,
        };

        let Some(fallback) = config.fallback.as_deref() else {
            return Err(primary_err);
        };

        match self.build_healthy(&config, fallback).await {
            Ok(provider) => {
                info!(
                    domain,
                    primary = %config.primary,
                    fallback,
                    error = %primary_err,
                    "primary adapter unavailable, using fallback"
                );
                Ok(provider)
            }
            Err(fallback_err) => {
                warn!(
                    domain,
                    primary = %config.primary,
                    fallback,
                    error = %fallback_err,
                    "fallback adapter also failed"
                );
                Err(primary_err)
            }
        }
    }

    /// Discovered adapters for `domain` that can actually be constructed, sorted
    pub async fn list_available_adapters(&self, domain: &str) -> Result<Vec<String>> {
        let discovered = self.adapters.discover_adapters(domain).await?;
        Ok(discovered
            .iter()
            .filter(|a| self.registry.contains(&a.entry))
            .map(|a| a.name.clone())
            .collect())
    }

    /// Effective retry policy for calls made through this domain's providers
    pub async fn retry_policy(&self, domain: &str) -> Result<RetryPolicy> {
        self.config.retry_policy(domain).await
    }

    async fn domain_config(&self, domain: &str) -> Result<DomainConfig> {
        self.config.get_domain_config(domain).await?.ok_or_else(|| {
            Error::configuration(format!("domain '{}' requires a primary adapter", domain))
        })
    }

    async fn build(&self, config: &DomainConfig, name: &str) -> Result<Box<P>> {
        let discovered = self.adapters.discover_adapters(&config.domain).await?;
        let descriptor = discovered
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::adapter_not_found(&config.domain, name))?;

        let constructor = self
            .registry
            .get(&descriptor.entry)
            .ok_or_else(|| Error::adapter_not_found(&config.domain, name))?;

        debug!(domain = %config.domain, adapter = name, entry = %descriptor.entry, "constructing adapter");
        constructor(&config.adapter_settings(name))
    }

    async fn build_healthy(&self, config: &DomainConfig, name: &str) -> Result<Box<P>> {
        let provider = self.build(config, name).await?;
        let health = provider.health_check().await;
        if health.healthy {
            Ok(provider)
        } else {
            Err(Error::unhealthy(
                name,
                health
                    .message
                    .unwrap_or_else(|| "health check failed".to_string()),
            ))
        }
    }
}
