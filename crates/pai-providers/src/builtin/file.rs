//! File-backed secrets adapter
//!
//! Reads a flat `key: value` map from YAML, or JSON when the file ends in
//! `.json`. The file is read on every call so edits apply immediately.

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use pai_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

use super::{SecretsProvider, SECRETS_DOMAIN};
use crate::manifest::AdapterManifest;
use crate::traits::{Adapter, AdapterFactory, HealthStatus};

const ADAPTER_NAME: &str = "file";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSecretsConfig {
    /// Secrets file; `~` and `$VAR` are expanded
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct FileSecrets {
    path: Utf8PathBuf,
}

impl FileSecrets {
    /// Build from config, expanding `~` and `$VAR` in the path
    pub fn new(config: FileSecretsConfig) -> Result<Self> {
        let path = config.path.trim();
        if path.is_empty() {
            return Err(Error::missing_field("file adapter", "path"));
        }

        let expanded = shellexpand::full(path).map_err(|e| {
            Error::configuration(format!("failed to expand secrets path '{}': {}", path, e))
        })?;

        Ok(Self {
            path: Utf8PathBuf::from(expanded.into_owned()),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    async fn read_secrets(&self) -> Result<BTreeMap<String, String>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| {
                let code = (e.kind() == std::io::ErrorKind::NotFound).then(|| "ENOENT".to_string());
                Error::provider(
                    ADAPTER_NAME,
                    format!("cannot read {}: {}", self.path, e),
                    code,
                )
            })?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let is_json = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed: BTreeMap<String, Value> = if is_json {
            serde_json::from_str(&content).map_err(|e| self.parse_error(e))?
        } else {
            serde_yaml_ng::from_str(&content).map_err(|e| self.parse_error(e))?
        };

        Ok(parsed
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect())
    }

    fn parse_error(&self, e: impl std::fmt::Display) -> Error {
        Error::provider(
            ADAPTER_NAME,
            format!("cannot parse {}: {}", self.path, e),
            None,
        )
    }
}

impl AdapterFactory<dyn SecretsProvider> for FileSecrets {
    type Config = FileSecretsConfig;

    fn manifest() -> AdapterManifest {
        AdapterManifest::new(ADAPTER_NAME, SECRETS_DOMAIN)
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_description("Secrets from a local YAML or JSON file")
            .with_capabilities(["read"])
    }

    fn create(config: FileSecretsConfig) -> Result<Box<dyn SecretsProvider>> {
        Ok(Box::new(FileSecrets::new(config)?))
    }
}

#[async_trait]
impl Adapter for FileSecrets {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    async fn health_check(&self) -> HealthStatus {
        let start = Instant::now();
        match self.read_secrets().await {
            Ok(secrets) => HealthStatus::healthy()
                .with_message(format!("{} secrets in {}", secrets.len(), self.path))
                .with_latency_ms(start.elapsed().as_millis() as u64),
            Err(e) => HealthStatus::unhealthy(e.to_string()),
        }
    }
}

#[async_trait]
impl SecretsProvider for FileSecrets {
    async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_secrets().await?.remove(key))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.read_secrets().await?.into_keys().collect())
    }
}
