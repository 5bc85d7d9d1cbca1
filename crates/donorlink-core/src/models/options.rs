use serde::{Deserialize, Serialize};

/// Which numeric donor attributes feed clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSet {
    /// Latitude and longitude only
    Spatial,
    /// Coordinates plus the four donation-history features
    Full,
}

impl FeatureSet {
    /// Column names, in extraction order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            FeatureSet::Spatial => &["latitude", "longitude"],
            FeatureSet::Full => &[
                "latitude",
                "longitude",
                "recency_months",
                "frequency_count",
                "monetary_volume",
                "time_since_first_months",
            ],
        }
    }
}

/// How surface distance between two coordinates is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMethod {
    /// Shortest path on the WGS 84 ellipsoid
    #[default]
    Geodesic,
    /// Great-circle distance on a sphere of mean Earth radius
    Haversine,
}

/// What the normalizer does with a zero-variance column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegeneratePolicy {
    /// Fail with `DegenerateFeature`
    Reject,
    /// Mean-centre the column without dividing by its (zero) deviation
    #[default]
    LeaveUnscaled,
}

/// What the store does with a row that fails schema validation at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowPolicy {
    /// Refuse to open the dataset
    #[default]
    Reject,
    /// Exclude the row from the collection but keep it in the file
    Quarantine,
}
