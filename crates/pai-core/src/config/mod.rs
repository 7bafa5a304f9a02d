//! Provider configuration loading and caching

mod cache;
mod loader;

pub use cache::{CachedConfig, ConfigCache};
pub use loader::{
    default_search_paths, save_config, ConfigLoader, CONFIG_FILE_NAME, CONFIG_OVERRIDE_ENV,
    SYSTEM_CONFIG_PATH,
};
