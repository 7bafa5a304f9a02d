//! Environment variable secrets adapter

use async_trait::async_trait;
use pai_core::Result;
use serde::Deserialize;

use super::{SecretsProvider, SECRETS_DOMAIN};
use crate::manifest::AdapterManifest;
use crate::traits::{Adapter, AdapterFactory, HealthStatus};

pub const DEFAULT_SECRET_PREFIX: &str = "PAI_SECRET_";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EnvSecretsConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_SECRET_PREFIX.to_string()
}

impl Default for EnvSecretsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

/// Secrets stored as `<prefix><KEY>` environment variables
///
/// Keys are upper-cased and `-`/`.` become `_`, so `github-token` reads
/// `PAI_SECRET_GITHUB_TOKEN`.
#[derive(Debug, Clone)]
pub struct EnvSecrets {
    prefix: String,
}

impl EnvSecrets {
    pub fn new(config: EnvSecretsConfig) -> Self {
        Self {
            prefix: config.prefix,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn variable_name(&self, key: &str) -> String {
        let key: String = key
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", self.prefix, key)
    }
}

impl AdapterFactory<dyn SecretsProvider> for EnvSecrets {
    type Config = EnvSecretsConfig;

    fn manifest() -> AdapterManifest {
        AdapterManifest::new("env", SECRETS_DOMAIN)
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_description("Secrets from prefixed environment variables")
            .with_capabilities(["read"])
    }

    fn create(config: EnvSecretsConfig) -> Result<Box<dyn SecretsProvider>> {
        Ok(Box::new(EnvSecrets::new(config)))
    }
}

#[async_trait]
impl Adapter for EnvSecrets {
    fn name(&self) -> &str {
        "env"
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::healthy().with_latency_ms(0)
    }
}

#[async_trait]
impl SecretsProvider for EnvSecrets {
    async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        Ok(std::env::var(self.variable_name(key))
            .ok()
            .filter(|value| !value.is_empty()))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = std::env::vars()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(name, _)| {
                name.strip_prefix(&self.prefix)
                    .filter(|key| !key.is_empty())
                    .map(|key| key.to_ascii_lowercase().replace('_', "-"))
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}
