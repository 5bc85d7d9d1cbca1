//! Integration tests for the CSV donor store

use donorlink_core::error::DonorlinkError;
use donorlink_core::models::{
    BloodType, Coordinates, DonorActivity, DonorProfile, DonorRecord, RowPolicy,
};
use donorlink_store::schema::CANONICAL_HEADER;
use donorlink_store::{CsvDonorStore, DonorStore};
use proptest::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DATASET: &str = "\
Names,Age,Gender,Blood Type,Medical Conditions,Allergies,Blood Pressure,Height (cm),Weight (kg),Contact Number,Country,State,District,Location,Pincode,Latitude,Longitude,Recency (months),Frequency (times),Monetary (c.c. blood),Time (months)
Asha Rao,34,Female,O+,,,120/80,162,58,9876543210,India,Karnataka,Bengaluru Urban,\"Indiranagar, Bengaluru\",560038,12.9784,77.6408,2,5,1250,40
Vikram Singh,41,Male,A-,Asthma,Penicillin,130/85,178,80,9123456780,India,Delhi,New Delhi,Connaught Place,110001,28.6315,77.2167,6,3,750,30
";

const DATASET_WITH_BAD_ROW: &str = "\
Names,Age,Gender,Blood Type,Medical Conditions,Allergies,Blood Pressure,Height (cm),Weight (kg),Contact Number,Country,State,District,Location,Pincode,Latitude,Longitude,Recency (months),Frequency (times),Monetary (c.c. blood),Time (months)
Asha Rao,34,Female,O+,,,120/80,162,58,9876543210,India,Karnataka,Bengaluru Urban,Indiranagar,560038,12.9784,77.6408,2,5,1250,40
Broken Row,abc,Male,Q+,,,,,,,,,,Nowhere,,north,east,,,,
Vikram Singh,41,Male,A-,,,,,,,India,Delhi,New Delhi,Connaught Place,110001,28.6315,77.2167,6,3,750,30
";

fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("donor_dataset.csv");
    fs::write(&path, content).unwrap();
    path
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
}

fn registration() -> DonorRecord {
    DonorRecord::new(
        "Kiran Kumar",
        29,
        "Male",
        BloodType::OPositive,
        "Whitefield, Bengaluru",
        Coordinates::new(12.9698, 77.75).unwrap(),
    )
    .with_activity(DonorActivity::new(1.0, 2.0, 500.0, 14.0))
    .with_profile(DonorProfile {
        contact_number: Some("9000000001".to_string()),
        country: Some("India".to_string()),
        ..DonorProfile::default()
    })
}

#[test]
fn test_open_reads_every_row() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, DATASET);

    let store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
    let donors = store.donors().unwrap();
    assert_eq!(donors.len(), 2);

    let asha = donors.get(0).unwrap();
    assert_eq!(asha.location_text, "Indiranagar, Bengaluru");
    assert_eq!(asha.blood_type, BloodType::OPositive);
    assert_eq!(asha.profile.medical_conditions, None);

    let vikram = donors.get(1).unwrap();
    assert_eq!(vikram.profile.allergies.as_deref(), Some("Penicillin"));
    assert_eq!(vikram.activity.frequency_count, 3.0);
    assert!(store.quarantined().is_empty());
}

#[test]
fn test_registration_appends_exactly_one_row() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, DATASET);
    let before = lines(&path);

    let mut store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
    let index = store.append(registration()).unwrap();
    store.flush().unwrap();
    assert_eq!(index, 2);

    let after = lines(&path);
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
    assert!(after.last().unwrap().starts_with("Kiran Kumar,29,Male,O+,"));

    let reopened = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
    assert_eq!(reopened.donors().unwrap().len(), 3);
    assert_eq!(reopened.donors().unwrap().get(2).unwrap(), &registration());
}

#[test]
fn test_reject_policy_names_the_line() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, DATASET_WITH_BAD_ROW);

    match CsvDonorStore::open(&path, RowPolicy::Reject) {
        Err(DonorlinkError::InvalidDonorRecord { row, .. }) => assert_eq!(row, 3),
        other => panic!("Expected InvalidDonorRecord, got {:?}", other),
    }
}

#[test]
fn test_quarantine_policy_keeps_bad_rows_in_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, DATASET_WITH_BAD_ROW);
    let before = lines(&path);

    let mut store = CsvDonorStore::open(&path, RowPolicy::Quarantine).unwrap();
    assert_eq!(store.donors().unwrap().len(), 2);
    assert_eq!(store.quarantined().len(), 1);
    assert_eq!(store.quarantined()[0].line, 3);

    store.append(registration()).unwrap();
    store.close().unwrap();

    let after = lines(&path);
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
}

#[test]
fn test_crlf_dataset_reports_file_lines() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, &DATASET_WITH_BAD_ROW.replace('\n', "\r\n"));

    match CsvDonorStore::open(&path, RowPolicy::Reject) {
        Err(DonorlinkError::InvalidDonorRecord { row, .. }) => assert_eq!(row, 3),
        other => panic!("Expected InvalidDonorRecord, got {:?}", other),
    }

    let store = CsvDonorStore::open(&path, RowPolicy::Quarantine).unwrap();
    assert_eq!(store.donors().unwrap().len(), 2);
    assert_eq!(store.quarantined()[0].line, 3);
}

#[test]
fn test_ragged_row_is_quarantined() {
    let dir = TempDir::new().unwrap();
    let content = format!("{}Short,row\n", DATASET);
    let path = write(&dir, &content);

    let store = CsvDonorStore::open(&path, RowPolicy::Quarantine).unwrap();
    assert_eq!(store.donors().unwrap().len(), 2);
    assert!(store.quarantined()[0].reason.contains("expected 21 fields"));
}

#[test]
fn test_extra_columns_survive_rewrite() {
    let dir = TempDir::new().unwrap();
    let header = format!("{},Notes", CANONICAL_HEADER.join(","));
    let row = "Asha Rao,34,Female,O+,,,,,,,,,,Indiranagar,,12.9784,77.6408,2,5,1250,40,regular";
    let path = write(&dir, &format!("{}\n{}\n", header, row));

    let mut store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
    assert_eq!(store.header().last().map(String::as_str), Some("Notes"));
    store.append(registration()).unwrap();
    store.flush().unwrap();

    let after = lines(&path);
    assert_eq!(after[0], header);
    assert_eq!(after[1], row);
    assert!(after[2].ends_with(",14,"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_appended_donors_read_back(
        names in prop::collection::vec("[A-Z][a-z]{2,10}( [A-Z][a-z]{2,10})?", 1..6),
        lat in -60.0f64..60.0,
        lon in -170.0f64..170.0,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("donors.csv");

        let mut store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
        for name in &names {
            let record = DonorRecord::new(
                name.as_str(),
                40,
                "Female",
                BloodType::ANegative,
                "Somewhere, Earth",
                Coordinates::new(lat, lon).unwrap(),
            );
            store.append(record).unwrap();
        }
        store.close().unwrap();

        let reopened = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
        let donors = reopened.donors().unwrap();
        prop_assert_eq!(donors.len(), names.len());
        for (donor, name) in donors.iter().zip(&names) {
            prop_assert_eq!(&donor.name, name);
            prop_assert_eq!(donor.coordinates.latitude, lat);
            prop_assert_eq!(donor.coordinates.longitude, lon);
        }
    }
}
