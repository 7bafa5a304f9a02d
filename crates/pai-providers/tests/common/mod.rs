//! Common helpers for pai-providers integration tests
//!
//! Provides:
//! - An `issues` test domain with configurable mock trackers
//! - Constructors that count how often they run or always fail
//! - Config and manifest fixture writers on temp directories

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use pai_core::{ConfigLoader, Error, Result};
use pai_providers::{
    Adapter, AdapterFactory, AdapterLoader, AdapterManifest, AdapterRegistry, HealthStatus,
    ProviderContext,
};
use serde::Deserialize;
use serde_json::Value;
use tempfile::TempDir;

// ─── Test Domain ─────────────────────────────────────────────────────────────

pub const ISSUES: &str = "issues";

#[async_trait]
pub trait IssueTracker: Adapter {
    async fn list_issues(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MockTrackerConfig {
    #[serde(default = "default_healthy")]
    pub healthy: bool,

    #[serde(default)]
    pub issues: Vec<String>,
}

fn default_healthy() -> bool {
    true
}

/// Tracker whose health and issues come from its settings
#[derive(Debug, Clone)]
pub struct MockTracker {
    name: String,
    config: MockTrackerConfig,
}

impl MockTracker {
    pub fn new(name: &str, config: MockTrackerConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
        }
    }
}

#[async_trait]
impl Adapter for MockTracker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> HealthStatus {
        if self.config.healthy {
            HealthStatus::healthy()
        } else {
            HealthStatus::unhealthy(format!("{} is down", self.name))
        }
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn list_issues(&self) -> Result<Vec<String>> {
        Ok(self.config.issues.clone())
    }
}

pub struct Jira;

impl AdapterFactory<dyn IssueTracker> for Jira {
    type Config = MockTrackerConfig;

    fn manifest() -> AdapterManifest {
        AdapterManifest::new("jira", ISSUES).with_version("1.0.0")
    }

    fn create(config: MockTrackerConfig) -> Result<Box<dyn IssueTracker>> {
        Ok(Box::new(MockTracker::new("jira", config)))
    }
}

pub struct Linear;

impl AdapterFactory<dyn IssueTracker> for Linear {
    type Config = MockTrackerConfig;

    fn manifest() -> AdapterManifest {
        AdapterManifest::new("linear", ISSUES).with_version("1.0.0")
    }

    fn create(config: MockTrackerConfig) -> Result<Box<dyn IssueTracker>> {
        Ok(Box::new(MockTracker::new("linear", config)))
    }
}

/// Registry with the `jira` and `linear` mock trackers
#[allow(dead_code)]
pub fn tracker_registry() -> AdapterRegistry<dyn IssueTracker> {
    AdapterRegistry::new().register::<Jira>().register::<Linear>()
}

/// Constructor that builds a healthy tracker and counts its invocations
#[allow(dead_code)]
pub fn counting_constructor(
    name: &'static str,
    counter: Arc<AtomicUsize>,
) -> impl Fn(&Value) -> Result<Box<dyn IssueTracker>> + Send + Sync + 'static {
    move |_settings: &Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTracker::new(
            name,
            MockTrackerConfig {
                healthy: true,
                issues: Vec::new(),
            },
        )) as Box<dyn IssueTracker>)
    }
}

/// Constructor that always fails authentication
#[allow(dead_code)]
pub fn rejecting_constructor(
    name: &'static str,
) -> impl Fn(&Value) -> Result<Box<dyn IssueTracker>> + Send + Sync + 'static {
    move |_settings: &Value| Err(Error::authentication(name, "401 Unauthorized"))
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn temp_root() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    (dir, root)
}

/// Write `providers.yaml` under `root` and return its path
#[allow(dead_code)]
pub fn write_config(root: &Utf8Path, yaml: &str) -> Utf8PathBuf {
    let path = root.join("providers.yaml");
    std::fs::write(&path, yaml).expect("write providers.yaml");
    path
}

/// Write `<root>/adapters/<dir>/adapter.yaml` and return the adapters location
#[allow(dead_code)]
pub fn write_manifest(root: &Utf8Path, dir: &str, yaml: &str) -> Utf8PathBuf {
    let location = root.join("adapters");
    let adapter_dir = location.join(dir);
    std::fs::create_dir_all(&adapter_dir).expect("create adapter dir");
    std::fs::write(adapter_dir.join("adapter.yaml"), yaml).expect("write manifest");
    location
}

/// Context reading `config` and scanning `<root>/adapters`
#[allow(dead_code)]
pub fn context_for(root: &Utf8Path, config: &Utf8Path) -> ProviderContext {
    ProviderContext::new(
        ConfigLoader::with_search_paths([config.to_path_buf()]),
        AdapterLoader::with_locations([root.join("adapters")]),
    )
}
