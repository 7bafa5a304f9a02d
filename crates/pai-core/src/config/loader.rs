//! Provider configuration file loading
//!
//! Search order (first existing file wins):
//! 1. `$PAI_PROVIDERS_CONFIG` (explicit override)
//! 2. `./providers.yaml`
//! 3. `${CONFIG_HOME}/providers.yaml` (see [`get_config_home`])
//! 4. `/etc/pai/providers.yaml`
//!
//! When none exists the configuration is empty, which is a valid state.

use super::cache::{CachedConfig, ConfigCache};
use crate::error::{Error, Result};
use crate::types::{ConfigDocument, DomainConfig, RetryPolicy};
use crate::utils::get_config_home;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_OVERRIDE_ENV: &str = "PAI_PROVIDERS_CONFIG";

/// File name searched for in the working directory and config home
pub const CONFIG_FILE_NAME: &str = "providers.yaml";

/// System-wide configuration file
pub const SYSTEM_CONFIG_PATH: &str = "/etc/pai/providers.yaml";

/// Candidate configuration files in precedence order
pub fn default_search_paths() -> Vec<Utf8PathBuf> {
    let mut paths = Vec::new();

    if let Ok(path) = std::env::var(CONFIG_OVERRIDE_ENV) {
        if !path.is_empty() {
            paths.push(Utf8PathBuf::from(path));
        }
    }

    if let Some(cwd) = std::env::current_dir()
        .ok()
        .and_then(|cwd| Utf8PathBuf::from_path_buf(cwd).ok())
    {
        paths.push(cwd.join(CONFIG_FILE_NAME));
    }

    if let Ok(home) = get_config_home() {
        paths.push(home.join(CONFIG_FILE_NAME));
    }

    paths.push(Utf8PathBuf::from(SYSTEM_CONFIG_PATH));
    paths
}

/// Loads `providers.yaml` and caches the parsed document
///
/// The loader owns its cache; construct a fresh loader per test or per
/// application context instead of sharing global state.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Explicit candidates; `None` means `default_search_paths()` at load time
    search_paths: Option<Vec<Utf8PathBuf>>,
    cache: ConfigCache,
}

impl ConfigLoader {
    /// Create a loader using the default search order
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader searching only the given files, in order
    pub fn with_search_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        Self {
            search_paths: Some(paths.into_iter().map(Into::into).collect()),
            cache: ConfigCache::new(),
        }
    }

    /// Candidate files this loader checks, in order
    pub fn search_paths(&self) -> Vec<Utf8PathBuf> {
        self.search_paths
            .clone()
            .unwrap_or_else(default_search_paths)
    }

    /// Load the configuration document, from cache when available
    pub async fn load_config(&self) -> Result<Arc<ConfigDocument>> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached.document.clone());
        }

        let loaded = self.read_config().await?;
        let stored = self.cache.store(loaded);
        Ok(stored.document.clone())
    }

    /// Validated configuration for one domain, `None` when the domain is absent
    pub async fn get_domain_config(&self, domain: &str) -> Result<Option<DomainConfig>> {
        let document = self.load_config().await?;
        document
            .domains
            .get(domain)
            .map(|raw| DomainConfig::from_raw(domain, raw))
            .transpose()
    }

    /// Retry policy for a domain: domain override, then document default, then built-in default
    pub async fn retry_policy(&self, domain: &str) -> Result<RetryPolicy> {
        let document = self.load_config().await?;
        let policy = document
            .domains
            .get(domain)
            .and_then(|raw| raw.retry.clone())
            .or_else(|| document.retry.clone())
            .unwrap_or_default();
        policy.validate()?;
        Ok(policy)
    }

    /// File the cached document was read from, if any
    pub fn source_path(&self) -> Option<Utf8PathBuf> {
        self.cache.get().and_then(|cached| cached.source.clone())
    }

    /// Drop the cached document; the next load re-reads from disk
    pub fn invalidate_config_cache(&self) {
        debug!("invalidating provider configuration cache");
        self.cache.invalidate();
    }

    async fn read_config(&self) -> Result<CachedConfig> {
        let override_path = std::env::var(CONFIG_OVERRIDE_ENV).ok();

        for path in self.search_paths() {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    let document = parse_document(&path, &content)?;
                    debug!(
                        path = %path,
                        domains = document.domains.len(),
                        "loaded provider configuration"
                    );
                    return Ok(CachedConfig {
                        document: Arc::new(document),
                        source: Some(path),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    if override_path.as_deref() == Some(path.as_str()) {
                        warn!(path = %path, "{} points to a missing file", CONFIG_OVERRIDE_ENV);
                    }
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }

        debug!("no provider configuration found, using empty configuration");
        Ok(CachedConfig::default())
    }
}

/// Parse a configuration document, choosing JSON or YAML by extension
fn parse_document(path: &Utf8Path, content: &str) -> Result<ConfigDocument> {
    if content.trim().is_empty() {
        return Ok(ConfigDocument::default());
    }

    let parsed = if is_json(path) {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml_ng::from_str(content).map_err(|e| e.to_string())
    };

    parsed.map_err(|e| Error::configuration(format!("Failed to parse {}: {}", path, e)))
}

fn is_json(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Write a configuration document as JSON or YAML by extension
pub async fn save_config(path: &Utf8Path, document: &ConfigDocument) -> Result<()> {
    let content = if is_json(path) {
        serde_json::to_string_pretty(document)?
    } else {
        serde_yaml_ng::to_string(document)?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawDomainConfig;
    use serial_test::serial;
    use tempfile::TempDir;

    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("Invalid UTF-8 path");
        (temp, dir)
    }

    const SECRETS_YAML: &str = r#"
domains:
  secrets:
    primary: keychain
    fallback: env
    adapters:
      keychain:
        service: pai
"#;

    #[tokio::test]
    async fn test_no_config_is_empty() {
        let (_temp, dir) = temp_dir();
        let loader = ConfigLoader::with_search_paths([dir.join("a.yaml"), dir.join("b.yaml")]);

        let doc = loader.load_config().await.unwrap();
        assert!(doc.is_empty());
        assert!(loader.source_path().is_none());
        assert!(loader.get_domain_config("secrets").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bare_domains_key_is_empty_config() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("providers.yaml");
        std::fs::write(&path, "# nothing configured yet\ndomains:\n").unwrap();
        let loader = ConfigLoader::with_search_paths([path.clone()]);

        let doc = loader.load_config().await.unwrap();
        assert!(doc.is_empty());
        assert_eq!(loader.source_path(), Some(path));
        assert!(loader.get_domain_config("secrets").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_existing_file_wins() {
        let (_temp, dir) = temp_dir();
        let local = dir.join("local.yaml");
        let user = dir.join("user.yaml");
        std::fs::write(&local, SECRETS_YAML).unwrap();
        std::fs::write(&user, "domains:\n  secrets:\n    primary: file\n").unwrap();

        let loader = ConfigLoader::with_search_paths([dir.join("missing.yaml"), local.clone(), user]);
        let domain = loader.get_domain_config("secrets").await.unwrap().unwrap();

        assert_eq!(domain.primary, "keychain");
        assert_eq!(loader.source_path(), Some(local));
    }

    #[tokio::test]
    async fn test_json_config() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("providers.json");
        std::fs::write(
            &path,
            r#"{"domains": {"issues": {"primary": "linear", "adapters": {"linear": {"team": "PAI"}}}}}"#,
        )
        .unwrap();

        let loader = ConfigLoader::with_search_paths([path]);
        let domain = loader.get_domain_config("issues").await.unwrap().unwrap();
        assert_eq!(domain.primary, "linear");
        assert_eq!(domain.fallback, None);
        assert_eq!(domain.adapter_settings("linear")["team"], "PAI");
    }

    #[tokio::test]
    async fn test_malformed_config_is_configuration_error() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("providers.yaml");
        std::fs::write(&path, "domains: [not, a, map").unwrap();

        let err = ConfigLoader::with_search_paths([path])
            .load_config()
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("providers.yaml"));
    }

    #[tokio::test]
    async fn test_missing_primary_is_configuration_error() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("providers.yaml");
        std::fs::write(&path, "domains:\n  observability:\n    fallback: prometheus\n").unwrap();

        let err = ConfigLoader::with_search_paths([path])
            .get_domain_config("observability")
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("missing required field 'primary'"));
    }

    #[tokio::test]
    async fn test_cache_until_invalidated() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("providers.yaml");
        std::fs::write(&path, SECRETS_YAML).unwrap();

        let loader = ConfigLoader::with_search_paths([path.clone()]);
        let first = loader.load_config().await.unwrap();

        std::fs::write(&path, "domains:\n  secrets:\n    primary: file\n").unwrap();
        let second = loader.load_config().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        loader.invalidate_config_cache();
        let third = loader.load_config().await.unwrap();
        assert_eq!(third.domains["secrets"].primary.as_deref(), Some("file"));
    }

    #[tokio::test]
    async fn test_round_trip_primary_and_fallback() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("nested").join("providers.yaml");

        let mut doc = ConfigDocument::default();
        doc.set_domain("secrets", RawDomainConfig::new("x", Some("y")));
        save_config(&path, &doc).await.unwrap();

        let loader = ConfigLoader::with_search_paths([path]);
        let domain = loader.get_domain_config("secrets").await.unwrap().unwrap();
        assert_eq!(domain.primary, "x");
        assert_eq!(domain.fallback.as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_retry_policy_precedence() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("providers.yaml");
        std::fs::write(
            &path,
            r#"
retry:
  max-retries: 1
domains:
  issues:
    primary: linear
    retry:
      max-retries: 5
  secrets:
    primary: keychain
"#,
        )
        .unwrap();

        let loader = ConfigLoader::with_search_paths([path]);
        assert_eq!(loader.retry_policy("issues").await.unwrap().max_retries, 5);
        assert_eq!(loader.retry_policy("secrets").await.unwrap().max_retries, 1);

        let empty = ConfigLoader::with_search_paths([dir.join("none.yaml")]);
        assert_eq!(empty.retry_policy("issues").await.unwrap(), RetryPolicy::default());
    }

    #[tokio::test]
    async fn test_concurrent_loads_agree() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("providers.yaml");
        std::fs::write(&path, SECRETS_YAML).unwrap();

        let loader = Arc::new(ConfigLoader::with_search_paths([path]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load_config().await })
            })
            .collect();

        for handle in handles {
            let doc = handle.await.unwrap().unwrap();
            assert_eq!(doc.domains["secrets"].primary.as_deref(), Some("keychain"));
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_env_override_path() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("override.yaml");
        std::fs::write(&path, SECRETS_YAML).unwrap();

        std::env::set_var(CONFIG_OVERRIDE_ENV, path.as_str());
        let paths = default_search_paths();
        let loader = ConfigLoader::new();
        let result = loader.load_config().await;
        std::env::remove_var(CONFIG_OVERRIDE_ENV);

        assert_eq!(paths.first(), Some(&path));
        assert_eq!(paths.last().map(|p| p.as_str()), Some(SYSTEM_CONFIG_PATH));
        assert_eq!(
            result.unwrap().domains["secrets"].primary.as_deref(),
            Some("keychain")
        );
        assert_eq!(loader.source_path(), Some(path));
    }
}
