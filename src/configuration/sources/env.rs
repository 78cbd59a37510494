use crate::configuration::error::ConfigError;
use crate::configuration::types::Configuration;

/// Applies `JUL_*` environment variables onto the configuration. Environment
/// wins over the file but loses to CLI flags.
pub fn apply_env_vars(config: &mut Configuration) -> Result<(), ConfigError> {
    if let Ok(id) = std::env::var("JUL_NODE_ID") {
        config.node.id = id;
    }
    if let Ok(addr) = std::env::var("JUL_API_ADDR") {
        config.api.bind_addr = addr;
    }
    if let Ok(path) = std::env::var("JUL_DB_PATH") {
        config.database.path = path;
    }
    if let Ok(ms) = std::env::var("JUL_SLOT_DURATION_MS") {
        config.consensus.slot_duration_ms = ms
            .parse()
            .map_err(|e| ConfigError::EnvVarError(format!("JUL_SLOT_DURATION_MS: {e}")))?;
    }
    if let Ok(secs) = std::env::var("JUL_SYNC_INTERVAL_SECS") {
        config.network.sync_interval_secs = secs
            .parse()
            .map_err(|e| ConfigError::EnvVarError(format!("JUL_SYNC_INTERVAL_SECS: {e}")))?;
    }
    if let Ok(level) = std::env::var("JUL_LOG_LEVEL") {
        config.logging.level = level;
    }
    Ok(())
}
