//! Column schema of the donor dataset file

use donorlink_core::models::{
    BloodType, Coordinates, DonorActivity, DonorProfile, DonorRecord,
};
use serde::Deserialize;

pub const NAMES: &str = "Names";
pub const AGE: &str = "Age";
pub const GENDER: &str = "Gender";
pub const BLOOD_TYPE: &str = "Blood Type";
pub const MEDICAL_CONDITIONS: &str = "Medical Conditions";
pub const ALLERGIES: &str = "Allergies";
pub const BLOOD_PRESSURE: &str = "Blood Pressure";
pub const HEIGHT: &str = "Height (cm)";
pub const WEIGHT: &str = "Weight (kg)";
pub const CONTACT_NUMBER: &str = "Contact Number";
pub const COUNTRY: &str = "Country";
pub const STATE: &str = "State";
pub const DISTRICT: &str = "District";
pub const LOCATION: &str = "Location";
pub const PINCODE: &str = "Pincode";
pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";
pub const RECENCY: &str = "Recency (months)";
pub const FREQUENCY: &str = "Frequency (times)";
pub const MONETARY: &str = "Monetary (c.c. blood)";
pub const TIME: &str = "Time (months)";

/// Header written to a new dataset file
pub const CANONICAL_HEADER: [&str; 21] = [
    NAMES,
    AGE,
    GENDER,
    BLOOD_TYPE,
    MEDICAL_CONDITIONS,
    ALLERGIES,
    BLOOD_PRESSURE,
    HEIGHT,
    WEIGHT,
    CONTACT_NUMBER,
    COUNTRY,
    STATE,
    DISTRICT,
    LOCATION,
    PINCODE,
    LATITUDE,
    LONGITUDE,
    RECENCY,
    FREQUENCY,
    MONETARY,
    TIME,
];

/// Columns every dataset header must contain
pub const REQUIRED_COLUMNS: [&str; 11] = [
    NAMES, AGE, GENDER, BLOOD_TYPE, LOCATION, LATITUDE, LONGITUDE, RECENCY, FREQUENCY, MONETARY,
    TIME,
];

/// Required columns missing from `header`
pub fn missing_columns<'a, I>(header: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = header.into_iter().map(str::trim).collect();
    REQUIRED_COLUMNS.iter().copied().filter(|column| !present.contains(column)).collect()
}

/// One dataset row as text, keyed by header name
#[derive(Debug, Clone, Deserialize)]
pub struct DonorRow {
    #[serde(rename = "Names")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Blood Type")]
    pub blood_type: String,
    #[serde(rename = "Medical Conditions", default)]
    pub medical_conditions: Option<String>,
    #[serde(rename = "Allergies", default)]
    pub allergies: Option<String>,
    #[serde(rename = "Blood Pressure", default)]
    pub blood_pressure: Option<String>,
    #[serde(rename = "Height (cm)", default)]
    pub height_cm: Option<String>,
    #[serde(rename = "Weight (kg)", default)]
    pub weight_kg: Option<String>,
    #[serde(rename = "Contact Number", default)]
    pub contact_number: Option<String>,
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
    #[serde(rename = "State", default)]
    pub state: Option<String>,
    #[serde(rename = "District", default)]
    pub district: Option<String>,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Pincode", default)]
    pub pincode: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
    #[serde(rename = "Recency (months)")]
    pub recency_months: String,
    #[serde(rename = "Frequency (times)")]
    pub frequency_count: String,
    #[serde(rename = "Monetary (c.c. blood)")]
    pub monetary_volume: String,
    #[serde(rename = "Time (months)")]
    pub time_since_first_months: String,
}

fn number(column: &str, value: &str) -> Result<f64, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("'{}' is empty", column));
    }
    value.parse::<f64>().map_err(|_| format!("'{}' is not a number: '{}'", column, value))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn optional_number(column: &str, value: Option<String>) -> Result<Option<f64>, String> {
    optional_text(value).map(|v| number(column, &v)).transpose()
}

impl DonorRow {
    /// Parse into a validated donor record
    pub fn into_record(self) -> Result<DonorRecord, String> {
        let age = self.age.trim();
        // Spreadsheet exports may write whole ages as "34.0"
        let age = age
            .parse::<u32>()
            .ok()
            .or_else(|| {
                age.parse::<f64>()
                    .ok()
                    .filter(|a| a.fract() == 0.0 && *a >= 0.0 && *a <= u32::MAX as f64)
                    .map(|a| a as u32)
            })
            .ok_or_else(|| format!("'{}' is not a whole number: '{}'", AGE, age))?;

        let blood_type: BloodType = self.blood_type.parse().map_err(|e| format!("{}", e))?;
        let coordinates = Coordinates {
            latitude: number(LATITUDE, &self.latitude)?,
            longitude: number(LONGITUDE, &self.longitude)?,
        };
        let activity = DonorActivity::new(
            number(RECENCY, &self.recency_months)?,
            number(FREQUENCY, &self.frequency_count)?,
            number(MONETARY, &self.monetary_volume)?,
            number(TIME, &self.time_since_first_months)?,
        );
        let profile = DonorProfile {
            medical_conditions: optional_text(self.medical_conditions),
            allergies: optional_text(self.allergies),
            blood_pressure: optional_text(self.blood_pressure),
            height_cm: optional_number(HEIGHT, self.height_cm)?,
            weight_kg: optional_number(WEIGHT, self.weight_kg)?,
            contact_number: optional_text(self.contact_number),
            country: optional_text(self.country),
            state: optional_text(self.state),
            district: optional_text(self.district),
            pincode: optional_text(self.pincode),
        };

        let record = DonorRecord::new(
            self.name.trim(),
            age,
            self.gender.trim(),
            blood_type,
            self.location.trim(),
            coordinates,
        )
        .with_activity(activity)
        .with_profile(profile);
        record.check()?;
        Ok(record)
    }
}

/// Text written to `column` for `record`; unknown columns are left empty
pub fn column_value(record: &DonorRecord, column: &str) -> String {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let num = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    let profile = &record.profile;

    match column.trim() {
        NAMES => record.name.clone(),
        AGE => record.age.to_string(),
        GENDER => record.gender.clone(),
        BLOOD_TYPE => record.blood_type.to_string(),
        MEDICAL_CONDITIONS => text(&profile.medical_conditions),
        ALLERGIES => text(&profile.allergies),
        BLOOD_PRESSURE => text(&profile.blood_pressure),
        HEIGHT => num(profile.height_cm),
        WEIGHT => num(profile.weight_kg),
        CONTACT_NUMBER => text(&profile.contact_number),
        COUNTRY => text(&profile.country),
        STATE => text(&profile.state),
        DISTRICT => text(&profile.district),
        LOCATION => record.location_text.clone(),
        PINCODE => text(&profile.pincode),
        LATITUDE => record.coordinates.latitude.to_string(),
        LONGITUDE => record.coordinates.longitude.to_string(),
        RECENCY => record.activity.recency_months.to_string(),
        FREQUENCY => record.activity.frequency_count.to_string(),
        MONETARY => record.activity.monetary_volume.to_string(),
        TIME => record.activity.time_since_first_months.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> DonorRow {
        DonorRow {
            name: "Asha Rao".to_string(),
            age: "34".to_string(),
            gender: "Female".to_string(),
            blood_type: "O+".to_string(),
            medical_conditions: None,
            allergies: Some("  ".to_string()),
            blood_pressure: Some("120/80".to_string()),
            height_cm: Some("162".to_string()),
            weight_kg: None,
            contact_number: Some("9876543210".to_string()),
            country: Some("India".to_string()),
            state: Some("Karnataka".to_string()),
            district: Some("Bengaluru Urban".to_string()),
            location: "Indiranagar, Bengaluru".to_string(),
            pincode: Some("560038".to_string()),
            latitude: "12.9784".to_string(),
            longitude: "77.6408".to_string(),
            recency_months: "2".to_string(),
            frequency_count: "5".to_string(),
            monetary_volume: "1250".to_string(),
            time_since_first_months: "40".to_string(),
        }
    }

    #[test]
    fn test_row_into_record() {
        let record = row().into_record().unwrap();
        assert_eq!(record.name, "Asha Rao");
        assert_eq!(record.age, 34);
        assert_eq!(record.blood_type, BloodType::OPositive);
        assert_eq!(record.coordinates.latitude, 12.9784);
        assert_eq!(record.activity.monetary_volume, 1250.0);
        assert_eq!(record.profile.allergies, None);
        assert_eq!(record.profile.height_cm, Some(162.0));
        assert_eq!(record.profile.pincode.as_deref(), Some("560038"));
    }

    #[test]
    fn test_whole_float_age_accepted() {
        let mut r = row();
        r.age = "34.0".to_string();
        assert_eq!(r.into_record().unwrap().age, 34);

        let mut r = row();
        r.age = "34.5".to_string();
        assert!(r.into_record().is_err());
    }

    #[test]
    fn test_bad_fields_report_column() {
        let mut r = row();
        r.latitude = "north".to_string();
        assert!(r.into_record().unwrap_err().contains(LATITUDE));

        let mut r = row();
        r.recency_months = String::new();
        assert!(r.into_record().unwrap_err().contains(RECENCY));

        let mut r = row();
        r.blood_type = "C+".to_string();
        assert!(r.into_record().is_err());

        let mut r = row();
        r.latitude = "95".to_string();
        assert!(r.into_record().is_err());
    }

    #[test]
    fn test_missing_columns() {
        assert!(missing_columns(CANONICAL_HEADER).is_empty());
        assert_eq!(
            missing_columns(["Names", "Age", "Gender", "Blood Type", "Location"]),
            vec![LATITUDE, LONGITUDE, RECENCY, FREQUENCY, MONETARY, TIME]
        );
    }

    #[test]
    fn test_column_values_cover_canonical_header() {
        let record = row().into_record().unwrap();
        let values: Vec<String> = CANONICAL_HEADER.iter().map(|c| column_value(&record, c)).collect();
        assert_eq!(values[0], "Asha Rao");
        assert_eq!(values[3], "O+");
        assert_eq!(values[5], "");
        assert_eq!(values[15], "12.9784");
        assert_eq!(values[20], "40");
        assert_eq!(column_value(&record, "Favourite Colour"), "");
    }
}
