//! Built-in adapters for the `secrets` domain
//!
//! Neither talks to a vendor service: `env` reads prefixed environment
//! variables and `file` reads a local YAML or JSON map.

mod env;
mod file;

pub use env::{EnvSecrets, EnvSecretsConfig, DEFAULT_SECRET_PREFIX};
pub use file::{FileSecrets, FileSecretsConfig};

use async_trait::async_trait;
use pai_core::Result;

use crate::registry::AdapterRegistry;
use crate::traits::Adapter;

/// Domain name served by the built-in adapters
pub const SECRETS_DOMAIN: &str = "secrets";

/// Read access to a secret store
#[async_trait]
pub trait SecretsProvider: Adapter {
    /// Value for `key`, or `None` when the store has no such secret
    async fn get_secret(&self, key: &str) -> Result<Option<String>>;

    /// Every key in the store, sorted
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Registry with the `env` and `file` adapters
pub fn secrets_registry() -> AdapterRegistry<dyn SecretsProvider> {
    AdapterRegistry::new()
        .register::<EnvSecrets>()
        .register::<FileSecrets>()
}
