//! Provider resolution for PAI packs
//!
//! A pack asks for a provider by domain (`secrets`, `issues`, ...) and gets
//! back a trait object built from whichever adapter `providers.yaml` names:
//!
//! - [`discovery`]: finds adapter manifests and caches them per domain
//! - [`registry`]: compile-time map from manifest entry to constructor
//! - [`factory`]: resolves config, discovery and construction, with fallback
//! - [`context`]: owns the shared loaders for an application
//! - [`builtin`]: `env` and `file` adapters for the `secrets` domain

pub mod builtin;
pub mod context;
pub mod discovery;
pub mod factory;
pub mod manifest;
pub mod registry;
pub mod traits;

pub use builtin::{secrets_registry, SecretsProvider};
pub use context::ProviderContext;
pub use discovery::{AdapterCacheStatus, AdapterLoader};
pub use factory::ProviderFactory;
pub use manifest::{load_manifest, AdapterDescriptor, AdapterManifest};
pub use registry::AdapterRegistry;
pub use traits::{Adapter, AdapterFactory, HealthStatus};
