//! Compile-time adapter registry
//!
//! Maps a manifest entry key to a constructor. Constructors take the raw
//! `adapters.<name>` settings and deserialize them into the adapter's typed
//! config, so a bad setting surfaces as a configuration error naming the
//! adapter rather than a panic inside it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pai_core::{Error, Result};
use serde_json::Value;

use crate::manifest::AdapterManifest;
use crate::traits::AdapterFactory;

/// Builds an adapter from its raw settings
pub type Constructor<P> = Arc<dyn Fn(&Value) -> Result<Box<P>> + Send + Sync>;

struct RegistryEntry<P: ?Sized> {
    manifest: Option<AdapterManifest>,
    constructor: Constructor<P>,
}

impl<P: ?Sized> Clone for RegistryEntry<P> {
    fn clone(&self) -> Self {
        Self {
            manifest: self.manifest.clone(),
            constructor: self.constructor.clone(),
        }
    }
}

/// Constructors for one domain trait `P`, keyed by entry
pub struct AdapterRegistry<P: ?Sized> {
    entries: BTreeMap<String, RegistryEntry<P>>,
}

impl<P: ?Sized> Default for AdapterRegistry<P> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<P: ?Sized> Clone for AdapterRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<P: ?Sized> fmt::Debug for AdapterRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<P: ?Sized + 'static> AdapterRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register adapter `A` under its manifest's entry key
    ///
    /// The manifest is also advertised to discovery by `ProviderFactory`.
    pub fn register<A>(mut self) -> Self
    where
        A: AdapterFactory<P>,
    {
        let manifest = A::manifest();
        let name = manifest.name.clone();
        let constructor: Constructor<P> = Arc::new(move |settings: &Value| {
            let config: A::Config = serde_json::from_value(settings.clone()).map_err(|e| {
                Error::configuration(format!("invalid settings for adapter '{}': {}", name, e))
            })?;
            A::create(config)
        });

        self.entries.insert(
            manifest.entry_key().to_string(),
            RegistryEntry {
                manifest: Some(manifest),
                constructor,
            },
        );
        self
    }

    /// Register a bare constructor with no built-in manifest
    ///
    /// The adapter must then be discovered from a manifest on disk whose
    /// `entry` (or `name`) matches `entry`.
    pub fn register_constructor<F>(mut self, entry: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&Value) -> Result<Box<P>> + Send + Sync + 'static,
    {
        self.entries.insert(
            entry.into(),
            RegistryEntry {
                manifest: None,
                constructor: Arc::new(constructor),
            },
        );
        self
    }

    pub fn get(&self, entry: &str) -> Option<Constructor<P>> {
        self.entries.get(entry).map(|e| e.constructor.clone())
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.contains_key(entry)
    }

    /// Registered entry keys, sorted
    pub fn entries(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Built-in manifests of adapters registered with `register`
    pub fn manifests(&self) -> Vec<AdapterManifest> {
        self.entries
            .values()
            .filter_map(|e| e.manifest.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello {
        name: String,
    }

    impl Greeter for Hello {
        fn greet(&self) -> String {
            format!("hello {}", self.name)
        }
    }

    #[derive(Deserialize)]
    struct HelloConfig {
        name: String,
    }

    impl AdapterFactory<dyn Greeter> for Hello {
        type Config = HelloConfig;

        fn manifest() -> AdapterManifest {
            AdapterManifest::new("hello", "greetings").with_entry("hello-v1")
        }

        fn create(config: HelloConfig) -> Result<Box<dyn Greeter>> {
            Ok(Box::new(Hello { name: config.name }))
        }
    }

    #[test]
    fn test_register_uses_entry_key_and_typed_config() {
        let registry = AdapterRegistry::<dyn Greeter>::new().register::<Hello>();

        assert!(registry.contains("hello-v1"));
        assert!(!registry.contains("hello"));
        assert_eq!(registry.manifests().len(), 1);

        let build = registry.get("hello-v1").unwrap();
        let greeter = build(&json!({"name": "ops"})).unwrap();
        assert_eq!(greeter.greet(), "hello ops");
    }

    #[test]
    fn test_invalid_settings_name_the_adapter() {
        let registry = AdapterRegistry::<dyn Greeter>::new().register::<Hello>();
        let build = registry.get("hello-v1").unwrap();

        let err = build(&json!({})).err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("'hello'"));
    }

    #[test]
    fn test_bare_constructor_has_no_manifest() {
        let registry = AdapterRegistry::<dyn Greeter>::new().register_constructor("static", |_| {
            Ok(Box::new(Hello {
                name: "static".to_string(),
            }) as Box<dyn Greeter>)
        });

        assert_eq!(registry.entries(), vec!["static".to_string()]);
        assert!(registry.manifests().is_empty());
        assert_eq!(registry.clone().len(), 1);
    }
}
