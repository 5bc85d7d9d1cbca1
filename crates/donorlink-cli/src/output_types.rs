use donorlink_cluster::EvaluationRow;
use donorlink_core::config::ConfigSource;
use donorlink_core::models::DonorRecord;
use donorlink_match::DonorMatch;
use donorlink_store::QuarantinedRow;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

fn or_dash(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

/// One row of the find results table
#[derive(Debug, Tabled)]
pub struct MatchRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Age")]
    pub age: u32,
    #[tabled(rename = "Gender")]
    pub gender: String,
    #[tabled(rename = "Blood Type")]
    pub blood_type: String,
    #[tabled(rename = "Contact")]
    pub contact: String,
    #[tabled(rename = "Country")]
    pub country: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "District")]
    pub district: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Pincode")]
    pub pincode: String,
    #[tabled(rename = "Distance (km)")]
    pub distance: String,
    #[tabled(rename = "Cluster")]
    pub cluster: String,
}

impl From<&DonorMatch> for MatchRow {
    fn from(m: &DonorMatch) -> Self {
        let donor = &m.donor;
        Self {
            name: donor.name.clone(),
            age: donor.age,
            gender: donor.gender.clone(),
            blood_type: donor.blood_type.to_string(),
            contact: or_dash(&donor.profile.contact_number),
            country: or_dash(&donor.profile.country),
            state: or_dash(&donor.profile.state),
            district: or_dash(&donor.profile.district),
            location: donor.location_text.clone(),
            pincode: or_dash(&donor.profile.pincode),
            distance: format!("{:.2}", m.distance_km),
            cluster: m.cluster.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// One donor's cluster
#[derive(Debug, Tabled)]
pub struct AssignmentRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Blood Type")]
    pub blood_type: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Cluster")]
    pub cluster: usize,
}

impl AssignmentRow {
    pub fn new(index: usize, donor: &DonorRecord, cluster: usize) -> Self {
        Self {
            index,
            name: donor.name.clone(),
            blood_type: donor.blood_type.to_string(),
            location: donor.location_text.clone(),
            cluster,
        }
    }
}

/// Scores for one cluster count
#[derive(Debug, Tabled)]
pub struct EvaluationTableRow {
    #[tabled(rename = "k")]
    pub k: usize,
    #[tabled(rename = "Inertia")]
    pub inertia: String,
    #[tabled(rename = "Silhouette")]
    pub silhouette: String,
    #[tabled(rename = "Davies-Bouldin")]
    pub davies_bouldin: String,
}

impl From<&EvaluationRow> for EvaluationTableRow {
    fn from(row: &EvaluationRow) -> Self {
        let score = |v: Option<f64>| v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "n/a".to_string());
        Self {
            k: row.k,
            inertia: format!("{:.4}", row.inertia),
            silhouette: score(row.silhouette),
            davies_bouldin: score(row.davies_bouldin),
        }
    }
}

/// Donor count of one blood type
#[derive(Debug, Tabled)]
pub struct BloodTypeRow {
    #[tabled(rename = "Blood Type")]
    pub blood_type: String,
    #[tabled(rename = "Donors")]
    pub donors: usize,
}

/// One resolved configuration value
#[derive(Debug, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// Configuration value with its source
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: ConfigSource,
}

/// Output for status command
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub dataset: String,
    pub dataset_exists: bool,
    pub donor_count: usize,
    pub quarantined: Vec<QuarantinedRow>,
    pub blood_types: BTreeMap<String, usize>,
    pub config: BTreeMap<String, ConfigEntry>,
}

/// Output for register command
#[derive(Debug, Serialize)]
pub struct RegisterOutput {
    pub dataset: String,
    pub index: usize,
    pub geocoded: bool,
    pub donor: DonorRecord,
}
