//! Adapter discovery
//!
//! `AdapterLoader` combines built-in manifests contributed by registered
//! adapters with manifests found on disk, and caches the result per domain.

mod cache;
mod loader;

pub use cache::{AdapterCache, AdapterCacheStatus, DEFAULT_ADAPTER_CACHE_TTL};
pub use loader::{default_locations, AdapterLoader, ADAPTERS_PATH_ENV};
