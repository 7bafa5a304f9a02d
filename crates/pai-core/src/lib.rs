//! # pai-core
//!
//! Core library shared by the PAI packs:
//! - Retry execution with exponential backoff and error classification
//! - Provider configuration (`providers.yaml`) loading and caching
//! - Data model types for domains and retry policies
//! - The error taxonomy used across adapters and providers

pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use retry::with_retry;
pub use utils::get_config_home;
