//! Type definitions for provider configuration and retry policies

mod provider_config;
mod retry_policy;

pub use provider_config::*;
pub use retry_policy::*;
