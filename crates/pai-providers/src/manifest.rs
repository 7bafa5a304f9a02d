//! Adapter manifests
//!
//! A manifest describes one adapter: which domain it serves, the entry key
//! its constructor is registered under, and the platforms it runs on.

use camino::{Utf8Path, Utf8PathBuf};
use pai_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// File names recognised as an adapter manifest, in lookup order
pub const MANIFEST_FILE_NAMES: [&str; 3] = ["adapter.yaml", "adapter.yml", "adapter.json"];

/// Adapter manifest as written in `adapter.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdapterManifest {
    pub name: String,

    pub domain: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Registry key of the constructor; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,

    /// Supported operating systems; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl AdapterManifest {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            version: default_version(),
            description: None,
            entry: None,
            capabilities: Vec::new(),
            platforms: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    /// Key used to look up the constructor in an `AdapterRegistry`
    pub fn entry_key(&self) -> &str {
        self.entry.as_deref().unwrap_or(&self.name)
    }

    /// Whether the adapter runs on the current operating system
    pub fn supports_current_platform(&self) -> bool {
        self.supports_platform(std::env::consts::OS)
    }

    pub fn supports_platform(&self, os: &str) -> bool {
        self.platforms.is_empty()
            || self
                .platforms
                .iter()
                .any(|p| p.eq_ignore_ascii_case(os) || (p == "darwin" && os == "macos"))
    }

    fn validate(&self, path: &Utf8Path) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::manifest(path.as_str(), "missing required field 'name'"));
        }
        if self.domain.trim().is_empty() {
            return Err(Error::manifest(path.as_str(), "missing required field 'domain'"));
        }
        Ok(())
    }
}

/// A discovered adapter, as returned by `AdapterLoader::discover_adapters`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterDescriptor {
    pub name: String,
    pub domain: String,
    pub version: String,
    pub entry: String,
    pub capabilities: Vec<String>,

    /// `None` for built-in manifests
    pub manifest_path: Option<Utf8PathBuf>,
}

impl AdapterDescriptor {
    pub fn from_manifest(manifest: &AdapterManifest, manifest_path: Option<Utf8PathBuf>) -> Self {
        Self {
            name: manifest.name.clone(),
            domain: manifest.domain.clone(),
            version: manifest.version.clone(),
            entry: manifest.entry_key().to_string(),
            capabilities: manifest.capabilities.clone(),
            manifest_path,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.manifest_path.is_none()
    }
}

/// Read and validate a single manifest file
///
/// Format follows the extension: `.json` is JSON, anything else YAML.
pub async fn load_manifest(path: &Utf8Path) -> Result<AdapterManifest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::manifest(path.as_str(), format!("cannot read manifest: {}", e)))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let manifest: AdapterManifest = if is_json {
        serde_json::from_str(&content)
            .map_err(|e| Error::manifest(path.as_str(), e.to_string()))?
    } else {
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::manifest(path.as_str(), e.to_string()))?
    };

    manifest.validate(path)?;
    Ok(manifest)
}

/// Find the manifest file inside an adapter directory, if any
pub(crate) async fn manifest_file_in(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    for name in MANIFEST_FILE_NAMES {
        let candidate = dir.join(name);
        if tokio::fs::metadata(&candidate)
            .await
            .is_ok_and(|meta| meta.is_file())
        {
            return Some(candidate);
        }
    }
    None
}
