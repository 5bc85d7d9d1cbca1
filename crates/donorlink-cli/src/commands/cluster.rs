//! Cluster command implementation

use crate::commands::build_pipeline;
use crate::output::{cluster_label, OutputWriter};
use crate::output_types::AssignmentRow;
use anyhow::{Context, Result};
use donorlink_core::config::LayeredConfig;
use donorlink_store::DonorStore;

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let report = pipeline.cluster().context("Failed to cluster donors")?;

    if output.is_json() {
        return output.result(&report);
    }

    let assignment = &report.assignment;
    output.section("Clustering");
    output.kv("Clusters", assignment.k());
    output.kv("Feature Set", format!("{:?}", report.feature_set));
    output.kv("Inertia", format!("{:.4}", assignment.inertia()));
    output.kv("Iterations", assignment.iterations());
    let unscaled = report.unscaled_columns();
    if !unscaled.is_empty() {
        output.warning(format!("Constant feature columns left unscaled: {}", unscaled.join(", ")));
    }

    output.section("Cluster Sizes");
    for (cluster, donors) in assignment.cluster_sizes().into_iter().enumerate() {
        output.kv(cluster_label(cluster), format!("{} donors", donors));
    }

    output.section("Assignments");
    let donors = pipeline.store().donors()?;
    let rows: Vec<AssignmentRow> = donors
        .iter()
        .zip(assignment.labels())
        .enumerate()
        .map(|(index, (donor, &cluster))| AssignmentRow::new(index, donor, cluster))
        .collect();
    output.table(rows);
    Ok(())
}
