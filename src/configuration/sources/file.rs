use std::path::Path;

use crate::configuration::error::ConfigError;
use crate::configuration::types::Configuration;

/// Loads configuration from a YAML file. Missing fields fall back to their
/// defaults.
#[cfg(feature = "serde_yaml")]
pub fn load_config_file(path: &Path) -> Result<Configuration, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileLoadError(format!("{}: {e}", path.display())))?;
    serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::FileLoadError(format!("{}: {e}", path.display())))
}

#[cfg(not(feature = "serde_yaml"))]
pub fn load_config_file(path: &Path) -> Result<Configuration, ConfigError> {
    Err(ConfigError::FileLoadError(format!(
        "{}: YAML support not compiled in (enable the serde_yaml feature)",
        path.display()
    )))
}
