//! Manifest discovery across search locations
//!
//! Locations, in precedence order:
//! 1. `$PAI_ADAPTERS_PATH` (colon separated)
//! 2. `./adapters`
//! 3. `${CONFIG_HOME}/adapters`
//!
//! Each location holds one directory per adapter containing `adapter.yaml`,
//! `adapter.yml` or `adapter.json`. Built-in manifests contributed by
//! registered adapters take precedence over all of them. A manifest that
//! fails to load is logged and skipped.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use pai_core::{get_config_home, Error, Result};
use tracing::{debug, warn};

use super::cache::{AdapterCache, AdapterCacheStatus};
use crate::manifest::{load_manifest, manifest_file_in, AdapterDescriptor, AdapterManifest};

/// Environment variable with extra adapter locations
pub const ADAPTERS_PATH_ENV: &str = "PAI_ADAPTERS_PATH";

/// Adapter search locations in precedence order
pub fn default_locations() -> Vec<Utf8PathBuf> {
    let mut locations = Vec::new();

    if let Some(value) = std::env::var_os(ADAPTERS_PATH_ENV) {
        locations.extend(
            std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .filter_map(|p| Utf8PathBuf::from_path_buf(p).ok()),
        );
    }

    if let Some(cwd) = std::env::current_dir()
        .ok()
        .and_then(|cwd| Utf8PathBuf::from_path_buf(cwd).ok())
    {
        locations.push(cwd.join("adapters"));
    }

    if let Ok(home) = get_config_home() {
        locations.push(home.join("adapters"));
    }

    locations
}

/// Discovers adapters per domain and caches the results
#[derive(Debug, Default)]
pub struct AdapterLoader {
    /// Explicit locations; `None` means `default_locations()` at discovery time
    locations: Option<Vec<Utf8PathBuf>>,
    builtin: RwLock<Vec<AdapterManifest>>,
    cache: AdapterCache,
}

impl AdapterLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search only the given locations, in order
    pub fn with_locations<I, P>(locations: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        Self {
            locations: Some(locations.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Replace the cache TTL (default 60s); drops anything cached
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = AdapterCache::new(ttl);
        self
    }

    pub fn locations(&self) -> Vec<Utf8PathBuf> {
        self.locations.clone().unwrap_or_else(default_locations)
    }

    /// Add built-in manifests, e.g. from an `AdapterRegistry`
    ///
    /// Manifests already known by name and domain are ignored. Domains that
    /// gain an adapter have their cached discovery dropped.
    pub fn register_manifests<I>(&self, manifests: I)
    where
        I: IntoIterator<Item = AdapterManifest>,
    {
        let mut builtin = self.builtin.write().unwrap_or_else(|e| e.into_inner());
        for manifest in manifests {
            let known = builtin
                .iter()
                .any(|m| m.name == manifest.name && m.domain == manifest.domain);
            if known {
                continue;
            }
            self.cache.invalidate(&manifest.domain);
            builtin.push(manifest);
        }
    }

    /// Adapters available for `domain`, sorted by name
    ///
    /// Repeated calls within the TTL return the same `Arc`.
    pub async fn discover_adapters(&self, domain: &str) -> Result<Arc<Vec<AdapterDescriptor>>> {
        if let Some(cached) = self.cache.get(domain) {
            debug!(domain, adapters = cached.len(), "adapter discovery cache hit");
            return Ok(cached);
        }

        debug!(domain, "adapter discovery cache miss");
        let adapters = self.scan(domain).await?;
        Ok(self.cache.insert(domain, adapters))
    }

    async fn scan(&self, domain: &str) -> Result<Vec<AdapterDescriptor>> {
        let mut seen = HashSet::new();
        let mut adapters = Vec::new();

        let builtin: Vec<AdapterManifest> = self
            .builtin
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.domain == domain)
            .cloned()
            .collect();

        for manifest in builtin {
            if manifest.supports_current_platform() && seen.insert(manifest.name.clone()) {
                adapters.push(AdapterDescriptor::from_manifest(&manifest, None));
            }
        }

        for location in self.locations() {
            for path in manifest_files(&location).await? {
                let manifest = match load_manifest(&path).await {
                    Ok(manifest) => manifest,
                    Err(e) => {
                        warn!(domain, path = %path, error = %e, "skipping invalid adapter manifest");
                        continue;
                    }
                };
                if manifest.domain != domain || !manifest.supports_current_platform() {
                    continue;
                }
                if seen.insert(manifest.name.clone()) {
                    debug!(domain, adapter = %manifest.name, path = %path, "discovered adapter");
                    adapters.push(AdapterDescriptor::from_manifest(&manifest, Some(path)));
                }
            }
        }

        adapters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(adapters)
    }

    /// Drop cached discovery for one domain, or for all when `None`
    pub fn invalidate_adapter_cache(&self, domain: Option<&str>) {
        match domain {
            Some(domain) => self.cache.invalidate(domain),
            None => self.cache.clear(),
        }
    }

    /// Domains with unexpired discovery results, sorted
    pub fn get_adapter_cache_status(&self) -> AdapterCacheStatus {
        self.cache.status()
    }
}

/// Manifest files one level below `location`, in directory name order
async fn manifest_files(location: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let is_dir = tokio::fs::metadata(location)
        .await
        .is_ok_and(|meta| meta.is_dir());
    if !is_dir {
        return Ok(Vec::new());
    }

    let mut entries = match tokio::fs::read_dir(location).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::Io(e)),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        if let Ok(dir) = Utf8PathBuf::from_path_buf(entry.path()) {
            dirs.push(dir);
        }
    }
    dirs.sort();

    let mut files = Vec::new();
    for dir in &dirs {
        if let Some(file) = manifest_file_in(dir).await {
            files.push(file);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(root: &Utf8Path, dir: &str, body: &str) {
        let dir = root.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("adapter.yaml"), body).unwrap();
    }

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[tokio::test]
    async fn test_scan_filters_domain_and_sorts() {
        let (_dir, root) = temp_root();
        write_manifest(&root, "linear", "name: linear\ndomain: issues\n");
        write_manifest(&root, "jira", "name: jira\ndomain: issues\n");
        write_manifest(&root, "unifi", "name: unifi\ndomain: network\n");
        std::fs::write(root.join("README.md"), "not an adapter").unwrap();

        let loader = AdapterLoader::with_locations([root]);
        let adapters = loader.discover_adapters("issues").await.unwrap();

        let names: Vec<&str> = adapters.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["jira", "linear"]);
        assert!(adapters.iter().all(|a| !a.is_builtin()));
    }

    #[tokio::test]
    async fn test_earlier_location_wins() {
        let (_first, first) = temp_root();
        let (_second, second) = temp_root();
        write_manifest(&first, "jira", "name: jira\ndomain: issues\nversion: 2.0.0\n");
        write_manifest(&second, "jira", "name: jira\ndomain: issues\nversion: 1.0.0\n");

        let loader = AdapterLoader::with_locations([first.clone(), second]);
        let adapters = loader.discover_adapters("issues").await.unwrap();

        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].version, "2.0.0");
        assert!(adapters[0]
            .manifest_path
            .as_ref()
            .unwrap()
            .starts_with(&first));
    }

    #[tokio::test]
    async fn test_builtin_manifests_come_first() {
        let (_dir, root) = temp_root();
        write_manifest(&root, "env", "name: env\ndomain: secrets\nversion: 9.9.9\n");

        let loader = AdapterLoader::with_locations([root]);
        loader.register_manifests([AdapterManifest::new("env", "secrets").with_version("1.0.0")]);

        let adapters = loader.discover_adapters("secrets").await.unwrap();
        assert_eq!(adapters.len(), 1);
        assert!(adapters[0].is_builtin());
        assert_eq!(adapters[0].version, "1.0.0");
    }

    #[tokio::test]
    async fn test_other_platform_is_skipped() {
        let (_dir, root) = temp_root();
        write_manifest(
            &root,
            "nowhere",
            "name: nowhere\ndomain: secrets\nplatforms: [plan9]\n",
        );

        let loader = AdapterLoader::with_locations([root]);
        assert!(loader.discover_adapters("secrets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_manifest_is_skipped() {
        let (_dir, root) = temp_root();
        write_manifest(&root, "broken", "name: [broken\n");
        write_manifest(&root, "jira", "name: jira\ndomain: issues\n");

        let loader = AdapterLoader::with_locations([root]);
        let adapters = loader.discover_adapters("issues").await.unwrap();

        let names: Vec<&str> = adapters.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["jira"]);
    }

    #[tokio::test]
    async fn test_missing_location_is_skipped() {
        let loader = AdapterLoader::with_locations(["/nonexistent/pai/adapters"]);
        assert!(loader.discover_adapters("issues").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_manifests_invalidates_domain() {
        let loader = AdapterLoader::with_locations(Vec::<Utf8PathBuf>::new());
        let empty = loader.discover_adapters("secrets").await.unwrap();
        assert!(empty.is_empty());

        loader.register_manifests([AdapterManifest::new("env", "secrets")]);
        let refreshed = loader.discover_adapters("secrets").await.unwrap();
        assert_eq!(refreshed.len(), 1);

        loader.register_manifests([AdapterManifest::new("env", "secrets")]);
        let again = loader.discover_adapters("secrets").await.unwrap();
        assert!(Arc::ptr_eq(&refreshed, &again));
    }
}
