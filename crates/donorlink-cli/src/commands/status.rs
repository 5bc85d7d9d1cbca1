//! Status command implementation

use crate::commands::open_store;
use crate::output::OutputWriter;
use crate::output_types::{BloodTypeRow, ConfigEntry, ConfigRow, StatusOutput};
use anyhow::Result;
use donorlink_core::config::LayeredConfig;
use donorlink_store::DonorStore;

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let dataset = &config.dataset.value;
    let store = open_store(config)?;
    let donors = store.donors()?;

    let blood_types = donors
        .count_by_blood_type()
        .into_iter()
        .map(|(blood_type, count)| (blood_type.to_string(), count))
        .collect();
    let inspection = config.to_inspection_map();

    if output.is_json() {
        return output.result(StatusOutput {
            dataset: dataset.display().to_string(),
            dataset_exists: dataset.exists(),
            donor_count: donors.len(),
            quarantined: store.quarantined().to_vec(),
            blood_types,
            config: inspection
                .into_iter()
                .map(|(key, (value, source))| (key, ConfigEntry { value, source }))
                .collect(),
        });
    }

    output.section("Dataset");
    output.kv("Path", dataset.display());
    output.kv("Exists", if dataset.exists() { "✓" } else { "✗ (created on first registration)" });
    output.kv("Donors", donors.len());

    if !store.quarantined().is_empty() {
        output.section("Quarantined Rows");
        for row in store.quarantined() {
            output.warning(format!("line {}: {}", row.line, row.reason));
        }
    }

    output.section("Blood Types");
    output.table(
        blood_types
            .into_iter()
            .map(|(blood_type, donors)| BloodTypeRow { blood_type, donors })
            .collect::<Vec<_>>(),
    );

    output.section("Configuration");
    output.table(
        inspection
            .into_iter()
            .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
            .collect(),
    );
    Ok(())
}
