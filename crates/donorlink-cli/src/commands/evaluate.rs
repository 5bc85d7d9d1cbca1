//! Evaluate command implementation

use crate::commands::build_pipeline;
use crate::output::OutputWriter;
use crate::output_types::EvaluationTableRow;
use crate::progress::with_spinner;
use anyhow::{Context, Result};
use donorlink_core::config::LayeredConfig;

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let range = pipeline.settings().evaluation_range.clone();

    let report = with_spinner(
        &format!("Scoring k = {}..{}...", range.start(), range.end()),
        || pipeline.evaluate(),
        |report| format!("Scored {} cluster counts", report.rows.len()),
        "Evaluation failed",
    )
    .context("Failed to evaluate clustering")?;

    if output.is_json() {
        return output.result(&report);
    }

    output.section("Cluster Quality");
    output.kv("Features", report.columns.join(", "));
    output.kv("Generated At", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    output.table(report.rows.iter().map(EvaluationTableRow::from).collect());
    output.info("Lower inertia and Davies-Bouldin, higher silhouette: tighter, better separated clusters");
    Ok(())
}
