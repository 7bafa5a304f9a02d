//! Shared utility functions for PAI crates

use crate::error::{Error, Result};
use camino::Utf8PathBuf;

/// Environment variable overriding the PAI configuration home
pub const CONFIG_HOME_ENV: &str = "PAI_CONFIG_HOME";

/// Get the PAI configuration home directory
///
/// Prefers `PAI_CONFIG_HOME` over the platform config directory so that
/// containers and tests can relocate the whole configuration tree.
pub fn get_config_home() -> Result<Utf8PathBuf> {
    if let Ok(home) = std::env::var(CONFIG_HOME_ENV) {
        if !home.is_empty() {
            return Ok(Utf8PathBuf::from(home));
        }
    }

    let dir = dirs::config_dir()
        .ok_or_else(|| Error::configuration("Could not determine configuration directory"))?;
    let dir = Utf8PathBuf::from_path_buf(dir)
        .map_err(|_| Error::configuration("Configuration directory path is not valid UTF-8"))?;

    Ok(dir.join("pai"))
}
