//! Provider configuration document types
//!
//! Mirrors the layout of `providers.yaml`:
//!
//! ```yaml
//! domains:
//!   secrets:
//!     primary: file
//!     fallback: env
//!     adapters:
//!       file:
//!         path: ~/.pai/secrets.yaml
//! ```

use super::RetryPolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parsed provider configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigDocument {
    /// Domain name -> unvalidated domain section
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub domains: BTreeMap<String, RawDomainConfig>,

    /// Default retry policy for every domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl ConfigDocument {
    /// Whether the document configures nothing
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.retry.is_none()
    }

    /// Names of all configured domains, sorted
    pub fn domain_names(&self) -> Vec<String> {
        self.domains.keys().cloned().collect()
    }

    /// Insert or replace a domain section
    pub fn set_domain(&mut self, name: impl Into<String>, domain: RawDomainConfig) {
        self.domains.insert(name.into(), domain);
    }
}

/// A bare `domains:` or `adapters:` key parses as null; treat it as empty
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A domain section as written in the file, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawDomainConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,

    /// Adapter name -> adapter-specific settings
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub adapters: BTreeMap<String, Value>,

    /// Retry policy override for this domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl RawDomainConfig {
    /// Shorthand for a section with a primary and optional fallback
    pub fn new(primary: impl Into<String>, fallback: Option<&str>) -> Self {
        Self {
            primary: Some(primary.into()),
            fallback: fallback.map(str::to_string),
            ..Self::default()
        }
    }

    /// Attach settings for one adapter
    pub fn with_adapter(mut self, name: impl Into<String>, settings: Value) -> Self {
        self.adapters.insert(name.into(), settings);
        self
    }
}

/// Validated domain configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DomainConfig {
    /// Domain name this section was read from
    pub domain: String,

    /// Adapter used by default
    pub primary: String,

    /// Adapter used when the primary is unavailable
    pub fallback: Option<String>,

    /// Adapter name -> adapter-specific settings
    pub adapters: BTreeMap<String, Value>,

    /// Retry policy override for this domain
    pub retry: Option<RetryPolicy>,
}

impl DomainConfig {
    /// Validate a raw section; `primary` must be present and non-empty
    pub fn from_raw(domain: &str, raw: &RawDomainConfig) -> Result<Self> {
        let primary = raw
            .primary
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::missing_field(format!("domain '{}'", domain), "primary"))?;

        let fallback = raw
            .fallback
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        if let Some(retry) = &raw.retry {
            retry.validate()?;
        }

        Ok(Self {
            domain: domain.to_string(),
            primary: primary.to_string(),
            fallback,
            adapters: raw.adapters.clone(),
            retry: raw.retry.clone(),
        })
    }

    /// Settings for an adapter; an empty object when none are configured
    pub fn adapter_settings(&self, adapter: &str) -> Value {
        match self.adapters.get(adapter) {
            Some(Value::Null) | None => Value::Object(Default::default()),
            Some(value) => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_document() {
        let yaml = r#"
retry:
  max-retries: 1
domains:
  secrets:
    primary: keychain
    fallback: env
    adapters:
      keychain:
        service: pai
      env: ~
"#;
        let doc: ConfigDocument = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(doc.domain_names(), vec!["secrets"]);
        assert_eq!(doc.retry.as_ref().map(|r| r.max_retries), Some(1));

        let domain = DomainConfig::from_raw("secrets", &doc.domains["secrets"]).unwrap();
        assert_eq!(domain.primary, "keychain");
        assert_eq!(domain.fallback.as_deref(), Some("env"));
        assert_eq!(domain.adapter_settings("keychain"), json!({"service": "pai"}));
        assert_eq!(domain.adapter_settings("env"), json!({}));
        assert_eq!(domain.adapter_settings("missing"), json!({}));
    }

    #[test]
    fn test_missing_primary_rejected() {
        let raw = RawDomainConfig {
            fallback: Some("env".to_string()),
            ..Default::default()
        };
        let err = DomainConfig::from_raw("secrets", &raw).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("missing required field 'primary'"));
    }

    #[test]
    fn test_blank_primary_rejected() {
        let raw = RawDomainConfig::new("  ", None);
        assert!(DomainConfig::from_raw("issues", &raw).is_err());
    }

    #[test]
    fn test_invalid_retry_override_rejected() {
        let mut raw = RawDomainConfig::new("linear", None);
        raw.retry = Some(RetryPolicy {
            base_delay_ms: 100,
            max_delay_ms: 10,
            ..RetryPolicy::default()
        });
        assert!(DomainConfig::from_raw("issues", &raw).is_err());
    }

    #[test]
    fn test_empty_document() {
        let doc: ConfigDocument = serde_yaml_ng::from_str("{}").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_bare_keys_are_empty() {
        let doc: ConfigDocument = serde_yaml_ng::from_str("domains:\n").unwrap();
        assert!(doc.is_empty());

        let doc: ConfigDocument =
            serde_yaml_ng::from_str("domains:\n  issues:\n    primary: jira\n    adapters:\n")
                .unwrap();
        let issues = DomainConfig::from_raw("issues", &doc.domains["issues"]).unwrap();
        assert!(issues.adapters.is_empty());
        assert_eq!(issues.adapter_settings("jira"), json!({}));
    }
}
