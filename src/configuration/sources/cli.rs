use clap::Parser;
use std::path::PathBuf;

use crate::configuration::types::Configuration;

/// Command-line flags for the JUL node.
#[derive(Debug, Parser)]
#[command(name = "jul-node", version, about = "A proof-of-stake JUL ledger node")]
pub struct Cli {
    /// Path to a YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Node identifier announced to peers.
    #[arg(long)]
    pub node_id: Option<String>,

    /// Bind address of the REST API, e.g. 127.0.0.1:8080.
    #[arg(long)]
    pub api_addr: Option<String>,

    /// Directory for the persistent chain database.
    #[arg(long)]
    pub db_path: Option<String>,

    /// Milliseconds between forging attempts.
    #[arg(long)]
    pub slot_duration_ms: Option<u64>,

    /// Seconds between periodic peer syncs.
    #[arg(long)]
    pub sync_interval_secs: Option<u64>,
}

/// Applies CLI flags onto the configuration. CLI wins over every other
/// source.
pub fn apply_cli_args(cli: &Cli, config: &mut Configuration) {
    if let Some(id) = &cli.node_id {
        config.node.id = id.clone();
    }
    if let Some(addr) = &cli.api_addr {
        config.api.bind_addr = addr.clone();
    }
    if let Some(path) = &cli.db_path {
        config.database.path = path.clone();
    }
    if let Some(ms) = cli.slot_duration_ms {
        config.consensus.slot_duration_ms = ms;
    }
    if let Some(secs) = cli.sync_interval_secs {
        config.network.sync_interval_secs = secs;
    }
}
