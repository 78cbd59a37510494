pub mod error;
pub mod sources;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use error::ConfigError;
pub use sources::cli::Cli;
pub use types::*;

use anyhow::{Context, Result};

/// Loads the configuration from all sources with priority CLI > env > file >
/// defaults, then validates the result.
pub fn load_configuration(cli: &Cli) -> Result<types::Configuration> {
    let mut config = match &cli.config {
        Some(path) => sources::file::load_config_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => types::Configuration::default(),
    };
    sources::env::apply_env_vars(&mut config).context("reading environment overrides")?;
    sources::cli::apply_cli_args(cli, &mut config);
    validation::validate(&config).context("validating configuration")?;
    Ok(config)
}
