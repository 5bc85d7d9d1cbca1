use chrono::{DateTime, Utc};
use donorlink_cluster::{ClusterAssignment, ColumnStats};
use donorlink_core::models::{
    BloodType, Coordinates, DonorActivity, DonorProfile, DonorRecord, FeatureSet,
};
use serde::Serialize;

/// Default search radius, in kilometres
pub const DEFAULT_THRESHOLD_KM: f64 = 20.0;

/// Where a search is centred
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrigin {
    /// Free text, resolved through the geocoder
    Location(String),
    /// Known coordinates; no geocoding
    Coordinates(Coordinates),
}

/// Donor search request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPlan {
    pub origin: MatchOrigin,
    pub threshold_km: f64,
    pub blood_type: BloodType,
    /// Attach cluster ids to the matches
    pub cluster: bool,
}

impl MatchPlan {
    /// Search around a free-text location
    pub fn at_location(location: impl Into<String>, blood_type: BloodType) -> Self {
        Self {
            origin: MatchOrigin::Location(location.into()),
            threshold_km: DEFAULT_THRESHOLD_KM,
            blood_type,
            cluster: true,
        }
    }

    /// Search around known coordinates
    pub fn at_coordinates(origin: Coordinates, blood_type: BloodType) -> Self {
        Self {
            origin: MatchOrigin::Coordinates(origin),
            threshold_km: DEFAULT_THRESHOLD_KM,
            blood_type,
            cluster: true,
        }
    }

    /// Set the search radius
    pub fn with_threshold(mut self, threshold_km: f64) -> Self {
        self.threshold_km = threshold_km;
        self
    }

    /// Enable or disable clustering
    pub fn with_clustering(mut self, enabled: bool) -> Self {
        self.cluster = enabled;
        self
    }
}

/// One donor retained by a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorMatch {
    /// Position of the donor in the collection
    pub index: usize,
    pub donor: DonorRecord,
    pub distance_km: f64,
    /// Cluster id, when clustering ran
    pub cluster: Option<usize>,
}

/// Outcome of a donor search
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Location text, when the origin was geocoded
    pub location: Option<String>,
    pub origin: Coordinates,
    pub threshold_km: f64,
    pub blood_type: BloodType,
    /// Donors in the collection at search time
    pub donors_considered: usize,
    /// Number of clusters, when clustering ran
    pub cluster_count: Option<usize>,
    /// Retained donors in collection order
    pub matches: Vec<DonorMatch>,
    pub generated_at: DateTime<Utc>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }
}

/// Clustering of the whole collection
#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    pub feature_set: FeatureSet,
    pub assignment: ClusterAssignment,
    /// Per-column standardization statistics
    pub stats: Vec<ColumnStats>,
    pub generated_at: DateTime<Utc>,
}

impl ClusterReport {
    /// Columns that had zero variance and were only mean-centred
    pub fn unscaled_columns(&self) -> Vec<&str> {
        self.stats.iter().filter(|s| !s.scaled).map(|s| s.name.as_str()).collect()
    }
}

/// A donor registration as entered on the form
///
/// Coordinates are optional; when absent the location text is geocoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub blood_type: BloodType,
    pub location_text: String,
    pub coordinates: Option<Coordinates>,
    /// `None` for a donor who has never donated
    pub activity: Option<DonorActivity>,
    pub profile: DonorProfile,
}

impl Registration {
    pub fn new(
        name: impl Into<String>,
        age: u32,
        gender: impl Into<String>,
        blood_type: BloodType,
        location_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            gender: gender.into(),
            blood_type,
            location_text: location_text.into(),
            coordinates: None,
            activity: None,
            profile: DonorProfile::default(),
        }
    }

    /// Use known coordinates instead of geocoding
    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Record a donation history
    pub fn with_activity(mut self, activity: DonorActivity) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn with_profile(mut self, profile: DonorProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Build the donor record at `coordinates`
    pub fn into_record(self, coordinates: Coordinates) -> DonorRecord {
        DonorRecord::new(
            self.name,
            self.age,
            self.gender,
            self.blood_type,
            self.location_text,
            coordinates,
        )
        .with_activity(self.activity.unwrap_or_else(DonorActivity::first_time))
        .with_profile(self.profile)
    }
}

/// A stored registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationOutcome {
    /// Position of the new donor in the collection
    pub index: usize,
    pub record: DonorRecord,
    /// The coordinates came from the geocoder
    pub geocoded: bool,
}
