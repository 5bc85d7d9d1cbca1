//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use donorlink_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "donorlink.toml";

/// Resolve the configuration file to read, if any
///
/// An explicit path must exist; the default file is optional.
fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

/// Load layered configuration: defaults, file, environment, then CLI overrides
pub fn load_config(explicit: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_file(explicit) {
        tracing::debug!("Loading configuration from {}", path.display());
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    config.validate()?;
    tracing::debug!("Dataset: {}", config.dataset.value.display());
    Ok(config)
}
