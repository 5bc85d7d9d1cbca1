use crate::error::{DonorlinkError, Result};
use crate::models::options::FeatureSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Upper bound accepted for a donor's age, matching the registration form.
pub const MAX_DONOR_AGE: u32 = 150;

/// ABO/Rh blood category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    /// All blood types, in the order the registration form lists them
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = DonorlinkError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_uppercase();
        BloodType::ALL
            .iter()
            .copied()
            .find(|bt| bt.as_str() == normalized)
            .ok_or_else(|| DonorlinkError::UnknownBloodType { value: s.to_string() })
    }
}

/// WGS 84 latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create validated coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coords = Self { latitude, longitude };
        coords.validate()?;
        Ok(coords)
    }

    /// Check that both components are finite and inside the geographic range
    pub fn validate(&self) -> Result<()> {
        let reason = if !self.latitude.is_finite() || !self.longitude.is_finite() {
            Some("coordinates must be finite")
        } else if !(-90.0..=90.0).contains(&self.latitude) {
            Some("latitude must be within [-90, 90]")
        } else if !(-180.0..=180.0).contains(&self.longitude) {
            Some("longitude must be within [-180, 180]")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(DonorlinkError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl FromStr for Coordinates {
    type Err = DonorlinkError;

    /// Parse a `"lat,lon"` pair
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DonorlinkError::ConfigInvalid {
            key: "coordinates".to_string(),
            reason: format!("Invalid coordinates '{}'. Use LAT,LON (e.g. 12.97,77.59)", s),
        };

        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;
        Coordinates::new(latitude, longitude)
    }
}

/// Recency/frequency/monetary/time donation history
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DonorActivity {
    /// Months since the last donation
    pub recency_months: f64,
    /// Number of donations made
    pub frequency_count: f64,
    /// Total blood donated, in c.c.
    pub monetary_volume: f64,
    /// Months since the first donation
    pub time_since_first_months: f64,
}

impl DonorActivity {
    pub fn new(
        recency_months: f64,
        frequency_count: f64,
        monetary_volume: f64,
        time_since_first_months: f64,
    ) -> Self {
        Self { recency_months, frequency_count, monetary_volume, time_since_first_months }
    }

    /// History of a donor who has never donated before
    pub fn first_time() -> Self {
        Self::default()
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let fields = [
            ("recency_months", self.recency_months),
            ("frequency_count", self.frequency_count),
            ("monetary_volume", self.monetary_volume),
            ("time_since_first_months", self.time_since_first_months),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a finite, non-negative number (got {})", name, value));
            }
        }
        Ok(())
    }
}

/// Optional contact and health details collected at registration.
///
/// Carried and persisted with the record; never used for matching.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DonorProfile {
    pub medical_conditions: Option<String>,
    pub allergies: Option<String>,
    pub blood_pressure: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub contact_number: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
}

/// A registered blood donor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorRecord {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub blood_type: BloodType,
    /// Free-text location as entered at registration
    pub location_text: String,
    pub coordinates: Coordinates,
    pub activity: DonorActivity,
    #[serde(default)]
    pub profile: DonorProfile,
}

impl DonorRecord {
    /// Create a first-time donor with an empty profile
    pub fn new(
        name: impl Into<String>,
        age: u32,
        gender: impl Into<String>,
        blood_type: BloodType,
        location_text: impl Into<String>,
        coordinates: Coordinates,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            gender: gender.into(),
            blood_type,
            location_text: location_text.into(),
            coordinates,
            activity: DonorActivity::first_time(),
            profile: DonorProfile::default(),
        }
    }

    /// Set the donation history
    pub fn with_activity(mut self, activity: DonorActivity) -> Self {
        self.activity = activity;
        self
    }

    /// Set the contact/health profile
    pub fn with_profile(mut self, profile: DonorProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Validate the record invariants, reporting the reason as text
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.age > MAX_DONOR_AGE {
            return Err(format!("age must be at most {} (got {})", MAX_DONOR_AGE, self.age));
        }
        self.coordinates.validate().map_err(|e| e.to_string())?;
        self.activity.validate()?;
        for (name, value) in [("height_cm", self.profile.height_cm), ("weight_kg", self.profile.weight_kg)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("{} must be a finite, non-negative number (got {})", name, v));
                }
            }
        }
        Ok(())
    }

    /// Numeric clustering features, in [`FeatureSet::columns`] order
    pub fn features(&self, set: FeatureSet) -> Vec<f64> {
        match set {
            FeatureSet::Spatial => vec![self.coordinates.latitude, self.coordinates.longitude],
            FeatureSet::Full => vec![
                self.coordinates.latitude,
                self.coordinates.longitude,
                self.activity.recency_months,
                self.activity.frequency_count,
                self.activity.monetary_volume,
                self.activity.time_since_first_months,
            ],
        }
    }
}

/// Ordered, append-only collection of donors.
///
/// A donor's position is its identity for cluster assignments and matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DonorCollection {
    donors: Vec<DonorRecord>,
}

impl DonorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, validating every record
    pub fn from_records(records: Vec<DonorRecord>) -> Result<Self> {
        let mut collection = Self::new();
        for record in records {
            collection.push(record)?;
        }
        Ok(collection)
    }

    /// Append a validated record, returning its position
    pub fn push(&mut self, record: DonorRecord) -> Result<usize> {
        let row = self.donors.len();
        record.check().map_err(|reason| DonorlinkError::InvalidDonorRecord { row, reason })?;
        self.donors.push(record);
        Ok(row)
    }

    pub fn len(&self) -> usize {
        self.donors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.donors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DonorRecord> {
        self.donors.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DonorRecord> {
        self.donors.iter()
    }

    pub fn as_slice(&self) -> &[DonorRecord] {
        &self.donors
    }

    /// Number of donors per blood type (types with no donors are omitted)
    pub fn count_by_blood_type(&self) -> BTreeMap<BloodType, usize> {
        let mut counts = BTreeMap::new();
        for donor in &self.donors {
            *counts.entry(donor.blood_type).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a DonorCollection {
    type Item = &'a DonorRecord;
    type IntoIter = std::slice::Iter<'a, DonorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.donors.iter()
    }
}
