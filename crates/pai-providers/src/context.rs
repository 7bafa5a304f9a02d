//! Application context owning the shared loaders

use std::sync::Arc;

use pai_core::ConfigLoader;

use crate::builtin::{secrets_registry, SecretsProvider};
use crate::discovery::AdapterLoader;
use crate::factory::ProviderFactory;
use crate::registry::AdapterRegistry;
use crate::traits::Adapter;

/// Owns one `ConfigLoader` and one `AdapterLoader`
///
/// Factories handed out by a context share its caches, so clearing them
/// here is seen by every factory. Tests build their own context instead of
/// touching process-wide state.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    config: Arc<ConfigLoader>,
    adapters: Arc<AdapterLoader>,
}

impl ProviderContext {
    /// Context using the default config search paths and adapter locations
    pub fn from_env() -> Self {
        Self::new(ConfigLoader::new(), AdapterLoader::new())
    }

    pub fn new(config: ConfigLoader, adapters: AdapterLoader) -> Self {
        Self {
            config: Arc::new(config),
            adapters: Arc::new(adapters),
        }
    }

    pub fn config(&self) -> &Arc<ConfigLoader> {
        &self.config
    }

    pub fn adapters(&self) -> &Arc<AdapterLoader> {
        &self.adapters
    }

    /// Factory for domain trait `P` backed by this context's loaders
    pub fn factory<P>(&self, registry: AdapterRegistry<P>) -> ProviderFactory<P>
    where
        P: ?Sized + Adapter + 'static,
    {
        ProviderFactory::new(self.config.clone(), self.adapters.clone(), registry)
    }

    /// Factory for the `secrets` domain with the built-in adapters
    pub fn secrets(&self) -> ProviderFactory<dyn SecretsProvider> {
        self.factory(secrets_registry())
    }

    /// Drop the cached configuration and all discovery results
    pub fn clear_caches(&self) {
        self.config.invalidate_config_cache();
        self.adapters.invalidate_adapter_cache(None);
    }
}

impl Default for ProviderContext {
    fn default() -> Self {
        Self::from_env()
    }
}
