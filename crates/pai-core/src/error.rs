//! Error types for pai-core

use thiserror::Error;

/// Result type alias using pai-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for PAI provider resolution
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete provider configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A named adapter is not discoverable or has no registered constructor
    #[error("Adapter not found: '{adapter}' for domain '{domain}'")]
    AdapterNotFound { domain: String, adapter: String },

    /// Missing or malformed adapter manifest
    #[error("Invalid adapter manifest {path}: {message}")]
    Manifest { path: String, message: String },

    /// Adapter could not authenticate against its backend
    #[error("Authentication failed for adapter '{adapter}': {message}")]
    Authentication { adapter: String, message: String },

    /// Adapter backend call failed
    #[error("Provider error from adapter '{adapter}': {message}")]
    Provider {
        adapter: String,
        message: String,
        code: Option<String>,
    },

    /// Adapter reported itself unhealthy
    #[error("Adapter '{adapter}' is unhealthy: {message}")]
    Unhealthy { adapter: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a configuration error for a missing required field
    pub fn missing_field(context: impl AsRef<str>, field: &str) -> Self {
        Self::configuration(format!(
            "{} is missing required field '{}'",
            context.as_ref(),
            field
        ))
    }

    /// Create an adapter not found error
    pub fn adapter_not_found(domain: impl Into<String>, adapter: impl Into<String>) -> Self {
        Self::AdapterNotFound {
            domain: domain.into(),
            adapter: adapter.into(),
        }
    }

    /// Create a manifest error
    pub fn manifest(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Create a provider error with an optional vendor/transport code
    pub fn provider(
        adapter: impl Into<String>,
        message: impl Into<String>,
        code: Option<String>,
    ) -> Self {
        Self::Provider {
            adapter: adapter.into(),
            message: message.into(),
            code,
        }
    }

    /// Create an unhealthy adapter error
    pub fn unhealthy(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unhealthy {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Stable kind name, used when classifying errors for retry
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Configuration { .. } => "ConfigurationError",
            Error::AdapterNotFound { .. } => "AdapterNotFoundError",
            Error::Manifest { .. } => "ManifestError",
            Error::Authentication { .. } => "AuthenticationError",
            Error::Provider { .. } => "ProviderError",
            Error::Unhealthy { .. } => "UnhealthyError",
            Error::YamlParse(_) => "YamlParseError",
            Error::JsonParse(_) => "JsonParseError",
            Error::Io(_) => "IoError",
        }
    }

    /// Code attached by the adapter, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Provider { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    /// Whether this is an adapter-not-found error
    pub fn is_adapter_not_found(&self) -> bool {
        matches!(self, Error::AdapterNotFound { .. })
    }
}
