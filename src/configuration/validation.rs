use std::net::SocketAddr;

use crate::configuration::error::ConfigError;
use crate::configuration::types::Configuration;

/// Validates the merged configuration before the node starts.
pub fn validate(config: &Configuration) -> Result<(), ConfigError> {
    if config.node.id.trim().is_empty() {
        return Err(ConfigError::InvalidConfig("node id must not be empty".into()));
    }
    if config.api.bind_addr.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::InvalidConfig(format!(
            "api bind address '{}' is not a valid socket address",
            config.api.bind_addr
        )));
    }
    if config.consensus.slot_duration_ms == 0 {
        return Err(ConfigError::InvalidConfig(
            "slot duration must be positive".into(),
        ));
    }
    if config.network.sync_interval_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "sync interval must be positive".into(),
        ));
    }
    if config.database.path.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "database path must not be empty".into(),
        ));
    }
    Ok(())
}
