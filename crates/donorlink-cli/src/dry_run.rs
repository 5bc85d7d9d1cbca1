//! Planned dataset changes for `--dry-run`

use crate::output::OutputWriter;
use donorlink_core::models::DonorRecord;
use serde::Serialize;

/// A change a command would make to the donor dataset
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedChange {
    /// The dataset file would be created with the canonical header
    CreateDataset { path: String },
    /// One donor row would be appended at `index`
    AppendDonor {
        path: String,
        index: usize,
        geocoded: bool,
        donor: DonorRecord,
    },
}

impl PlannedChange {
    fn summary(&self) -> String {
        match self {
            PlannedChange::CreateDataset { path } => format!("Create dataset {}", path),
            PlannedChange::AppendDonor { path, index, .. } => {
                format!("Append donor #{} to {}", index, path)
            }
        }
    }

    fn details(&self) -> Vec<String> {
        match self {
            PlannedChange::CreateDataset { .. } => vec!["Header: canonical donor columns".to_string()],
            PlannedChange::AppendDonor { donor, geocoded, .. } => {
                let activity = &donor.activity;
                vec![
                    format!("Name: {}", donor.name),
                    format!("Age: {}, Gender: {}", donor.age, donor.gender),
                    format!("Blood Type: {}", donor.blood_type),
                    format!(
                        "Location: {} ({:.5}, {:.5}{})",
                        donor.location_text,
                        donor.coordinates.latitude,
                        donor.coordinates.longitude,
                        if *geocoded { ", geocoded" } else { "" }
                    ),
                    format!(
                        "Activity: recency {}, frequency {}, monetary {}, time {}",
                        activity.recency_months,
                        activity.frequency_count,
                        activity.monetary_volume,
                        activity.time_since_first_months
                    ),
                ]
            }
        }
    }
}

/// Print the changes a dry run would have made
pub fn display_plan(output: &OutputWriter, changes: &[PlannedChange]) -> anyhow::Result<()> {
    if output.is_json() {
        return output.result(serde_json::json!({
            "dry_run": true,
            "planned_changes": changes,
        }));
    }

    output.section("Dry Run");
    for (i, change) in changes.iter().enumerate() {
        output.info(format!("{}. {}", i + 1, change.summary()));
        for detail in change.details() {
            output.info(format!("   {}", detail));
        }
    }
    output.info("Dataset left untouched. Run without --dry-run to register.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use donorlink_core::models::{BloodType, Coordinates};

    fn append() -> PlannedChange {
        PlannedChange::AppendDonor {
            path: "donor_dataset.csv".to_string(),
            index: 4,
            geocoded: true,
            donor: DonorRecord::new(
                "Asha Rao",
                34,
                "Female",
                BloodType::OPositive,
                "Indiranagar",
                Coordinates::new(12.9784, 77.6408).unwrap(),
            ),
        }
    }

    #[test]
    fn test_append_summary_and_details() {
        let change = append();
        assert_eq!(change.summary(), "Append donor #4 to donor_dataset.csv");

        let details = change.details();
        assert_eq!(details[0], "Name: Asha Rao");
        assert!(details[3].ends_with(", geocoded)"));
    }

    #[test]
    fn test_change_is_tagged_in_json() {
        let json = serde_json::to_value(append()).unwrap();
        assert_eq!(json["action"], "append_donor");
        assert_eq!(json["donor"]["blood_type"], "O+");

        let create = PlannedChange::CreateDataset { path: "x.csv".to_string() };
        assert_eq!(serde_json::to_value(create).unwrap()["action"], "create_dataset");
    }
}
