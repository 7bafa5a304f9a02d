//! Process-local cache for the parsed provider configuration

use crate::types::ConfigDocument;
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock};

/// A parsed configuration document and the file it came from
#[derive(Debug, Clone, Default)]
pub struct CachedConfig {
    pub document: Arc<ConfigDocument>,

    /// `None` when no configuration file was found
    pub source: Option<Utf8PathBuf>,
}

/// Cache holding at most one `CachedConfig`
///
/// Entries never expire; they are replaced only after `invalidate`. Values are
/// built completely before `store`, so readers never see a partial entry.
#[derive(Debug, Default)]
pub struct ConfigCache {
    entry: RwLock<Option<Arc<CachedConfig>>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<CachedConfig>> {
        self.entry
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Store a freshly loaded entry, replacing any previous one
    pub fn store(&self, config: CachedConfig) -> Arc<CachedConfig> {
        let config = Arc::new(config);
        *self
            .entry
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(config.clone());
        config
    }

    pub fn invalidate(&self) {
        *self
            .entry
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn is_cached(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_get_invalidate() {
        let cache = ConfigCache::new();
        assert!(!cache.is_cached());

        let stored = cache.store(CachedConfig {
            document: Arc::new(ConfigDocument::default()),
            source: Some(Utf8PathBuf::from("/etc/pai/providers.yaml")),
        });
        let fetched = cache.get().unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));

        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
