//! Command implementations

mod cluster;
mod evaluate;
mod find;
mod register;
mod status;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use donorlink_core::config::{CliConfigOverrides, LayeredConfig};
use donorlink_geocode::NominatimGeocoder;
use donorlink_match::{MatchPipeline, MatchSettings};
use donorlink_store::CsvDonorStore;
use std::time::Duration;

/// Pipeline over the CSV dataset and the Nominatim geocoder
pub type CsvPipeline = MatchPipeline<CsvDonorStore, NominatimGeocoder>;

/// Execute a CLI command
pub fn execute(cli: Cli, output: &OutputWriter) -> Result<()> {
    let mut overrides = CliConfigOverrides {
        dataset: cli.dataset.clone(),
        row_policy: cli.row_policy,
        ..Default::default()
    };
    match &cli.command {
        Commands::Find(args) => overrides.threshold_km = args.threshold,
        Commands::Cluster(args) => {
            overrides.cluster_count = args.k;
            overrides.seed = args.seed;
        }
        Commands::Evaluate(args) => {
            overrides.evaluation_min_k = args.min_k;
            overrides.evaluation_max_k = args.max_k;
            overrides.evaluation_features = args.features;
        }
        Commands::Register(_) | Commands::Status => {}
    }
    let config = load_config(cli.config.as_deref(), overrides)?;

    match cli.command {
        Commands::Find(args) => find::execute(args, &config, output),
        Commands::Register(args) => register::execute(args, &config, output, cli.dry_run),
        Commands::Cluster(_) => cluster::execute(&config, output),
        Commands::Evaluate(_) => evaluate::execute(&config, output),
        Commands::Status => status::execute(&config, output),
    }
}

/// Open the configured dataset
pub fn open_store(config: &LayeredConfig) -> Result<CsvDonorStore> {
    let path = &config.dataset.value;
    CsvDonorStore::open(path, config.row_policy.value)
        .with_context(|| format!("Failed to open donor dataset {}", path.display()))
}

/// Build the matching pipeline from configuration
pub fn build_pipeline(config: &LayeredConfig) -> Result<CsvPipeline> {
    let store = open_store(config)?;
    let geocoder = NominatimGeocoder::new(
        config.geocoder_url.value.clone(),
        config.user_agent.value.clone(),
        Duration::from_secs(config.geocoder_timeout_secs.value),
    )?;
    Ok(MatchPipeline::new(store, geocoder, MatchSettings::from_config(config)))
}
