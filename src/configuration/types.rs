use serde::{Deserialize, Serialize};

/// Represents the main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub node: NodeConfig,
    pub network: NetworkConfig,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub consensus: ConsensusConfig,
    pub logging: LoggingConfig,
}

/// Node identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub id: String,
}

/// Network-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Seconds between periodic chain syncs with peers.
    pub sync_interval_secs: u64,
}

/// Client API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_addr: String,
}

/// Database-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Consensus-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Milliseconds between forging attempts.
    pub slot_duration_ms: u64,
}

/// Logging-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            node: NodeConfig::default(),
            network: NetworkConfig::default(),
            api: ApiConfig::default(),
            database: DatabaseConfig::default(),
            consensus: ConsensusConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig { id: "node-1".to_string() }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig { sync_interval_secs: 30 }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig { bind_addr: "127.0.0.1:8080".to_string() }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig { path: "./data/chaindb".to_string() }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig { slot_duration_ms: 5_000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: "info".to_string() }
    }
}
