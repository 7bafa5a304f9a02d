//! Per-domain discovery cache with expiry

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::manifest::AdapterDescriptor;

/// How long a discovery result stays valid
pub const DEFAULT_ADAPTER_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct AdapterCacheEntry {
    adapters: Arc<Vec<AdapterDescriptor>>,
    loaded_at: Instant,
}

/// Snapshot of the discovery cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterCacheStatus {
    pub size: usize,
    pub domains: Vec<String>,
}

/// Discovery results keyed by domain
///
/// Entries older than the TTL are treated as absent. Expiry uses tokio's
/// clock so paused-time tests can advance past it.
#[derive(Debug)]
pub struct AdapterCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, AdapterCacheEntry>>,
}

impl Default for AdapterCache {
    fn default() -> Self {
        Self::new(DEFAULT_ADAPTER_CACHE_TTL)
    }
}

impl AdapterCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `domain`, if one exists
    pub fn get(&self, domain: &str) -> Option<Arc<Vec<AdapterDescriptor>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(domain)
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| entry.adapters.clone())
    }

    pub fn insert(
        &self,
        domain: &str,
        adapters: Vec<AdapterDescriptor>,
    ) -> Arc<Vec<AdapterDescriptor>> {
        let adapters = Arc::new(adapters);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            domain.to_string(),
            AdapterCacheEntry {
                adapters: adapters.clone(),
                loaded_at: Instant::now(),
            },
        );
        adapters
    }

    pub fn invalidate(&self, domain: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(domain);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Domains with a fresh entry; expired entries are dropped first
    pub fn status(&self) -> AdapterCacheStatus {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| entry.loaded_at.elapsed() < self.ttl);

        let mut domains: Vec<String> = entries.keys().cloned().collect();
        domains.sort();
        AdapterCacheStatus {
            size: domains.len(),
            domains,
        }
    }
}
