//! Find command implementation

use crate::cli::FindArgs;
use crate::commands::build_pipeline;
use crate::output::{cluster_label, OutputWriter};
use crate::output_types::MatchRow;
use crate::progress::with_spinner;
use anyhow::{Context, Result};
use donorlink_core::config::LayeredConfig;
use donorlink_match::MatchPlan;

pub fn execute(args: FindArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let pipeline = build_pipeline(config)?;

    let plan = match (args.origin, args.location) {
        (Some(origin), _) => MatchPlan::at_coordinates(origin, args.blood_type),
        (None, Some(location)) => MatchPlan::at_location(location, args.blood_type),
        (None, None) => anyhow::bail!("Give a location or --origin LAT,LON"),
    }
    .with_threshold(config.threshold_km.value)
    .with_clustering(!args.no_cluster);

    let result = with_spinner(
        "Searching for donors...",
        || pipeline.find(&plan),
        |result| format!("Found {} donors", result.len()),
        "Search failed",
    )
    .context("Failed to find donors")?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section("Search");
    if let Some(ref location) = result.location {
        output.kv("Location", location);
    }
    output.kv("Origin", format!("{:.5}, {:.5}", result.origin.latitude, result.origin.longitude));
    output.kv("Blood Type", result.blood_type);
    output.kv("Radius", format!("{} km", result.threshold_km));
    output.kv("Donors Considered", result.donors_considered);
    if let Some(k) = result.cluster_count {
        output.kv("Clusters", k);
    }

    output.section("Matches");
    if result.is_empty() {
        output.info(format!(
            "No {} donors found within {} km",
            result.blood_type, result.threshold_km
        ));
        return Ok(());
    }

    output.table(result.matches.iter().map(MatchRow::from).collect());

    if result.cluster_count.is_some() {
        output.section("Clusters");
        for m in &result.matches {
            if let Some(cluster) = m.cluster {
                output.kv(&m.donor.name, cluster_label(cluster));
            }
        }
    }
    Ok(())
}
