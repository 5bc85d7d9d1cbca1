//! Matching flows over in-memory and CSV stores with a fixed geocoder

use donorlink_core::config::{CliConfigOverrides, LayeredConfig};
use donorlink_core::error::DonorlinkError;
use donorlink_core::models::{
    BloodType, Coordinates, DonorActivity, DonorCollection, DonorRecord, FeatureSet, RowPolicy,
};
use donorlink_geocode::FixedGeocoder;
use donorlink_match::{MatchPipeline, MatchPlan, MatchSettings, Registration};
use donorlink_store::{CsvDonorStore, DonorStore, MemoryDonorStore};
use proptest::prelude::*;
use tempfile::TempDir;

fn at(lat: f64, lon: f64) -> Coordinates {
    Coordinates::new(lat, lon).unwrap()
}

fn geocoder() -> FixedGeocoder {
    FixedGeocoder::new()
        .with_place("Bengaluru", at(12.97, 77.59))
        .with_place("Mysuru", at(12.2958, 76.6394))
        .with_place("Whitefield, Bengaluru", at(12.9698, 77.75))
}

fn donor(name: &str, blood_type: BloodType, lat: f64, lon: f64, i: usize) -> DonorRecord {
    DonorRecord::new(name, 25 + i as u32, "Female", blood_type, "synthetic", at(lat, lon))
        .with_activity(DonorActivity::new(i as f64, (i % 4) as f64 + 1.0, 350.0 * ((i % 4) as f64 + 1.0), 12.0 + i as f64))
}

/// Twelve donors across Bengaluru and Mysuru, every third one O+
fn karnataka() -> DonorCollection {
    let mut records = Vec::new();
    for i in 0..12 {
        let blood_type = if i % 3 == 0 { BloodType::OPositive } else { BloodType::BNegative };
        let (lat, lon) = if i < 6 {
            (12.95 + i as f64 * 0.01, 77.58 + i as f64 * 0.01)
        } else {
            (12.28 + i as f64 * 0.005, 76.62 + i as f64 * 0.005)
        };
        records.push(donor(&format!("Donor {}", i), blood_type, lat, lon, i));
    }
    DonorCollection::from_records(records).unwrap()
}

#[test]
fn test_empty_collection_yields_empty_result() {
    let pipeline = MatchPipeline::new(MemoryDonorStore::new(), geocoder(), MatchSettings::default());

    let result = pipeline.find(&MatchPlan::at_location("Bengaluru", BloodType::OPositive)).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.donors_considered, 0);
    assert_eq!(result.cluster_count, None);
}

#[test]
fn test_single_donor_at_origin_matches_at_zero_distance() {
    let donors = DonorCollection::from_records(vec![donor("Asha", BloodType::OPositive, 12.97, 77.59, 0)])
        .unwrap();
    let pipeline =
        MatchPipeline::new(MemoryDonorStore::with_donors(donors), geocoder(), MatchSettings::default());

    let plan = MatchPlan::at_coordinates(at(12.97, 77.59), BloodType::OPositive)
        .with_threshold(5.0)
        .with_clustering(false);
    let result = pipeline.find(&plan).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.matches[0].index, 0);
    assert_eq!(result.matches[0].distance_km, 0.0);
    assert_eq!(result.matches[0].cluster, None);
}

#[test]
fn test_find_geocodes_clusters_and_filters() {
    let pipeline =
        MatchPipeline::new(MemoryDonorStore::with_donors(karnataka()), geocoder(), MatchSettings::default());

    let result = pipeline.find(&MatchPlan::at_location("Bengaluru", BloodType::OPositive)).unwrap();

    assert_eq!(result.location.as_deref(), Some("Bengaluru"));
    assert_eq!(result.donors_considered, 12);
    assert_eq!(result.cluster_count, Some(3));
    // O+ donors in Bengaluru are 0 and 3
    let indices: Vec<usize> = result.matches.iter().map(|m| m.index).collect();
    assert_eq!(indices, vec![0, 3]);
    for m in &result.matches {
        assert!(m.distance_km <= 20.0);
        assert_eq!(m.donor.blood_type, BloodType::OPositive);
        assert!(m.cluster.unwrap() < 3);
    }
}

#[test]
fn test_find_reports_geocoding_failures() {
    let pipeline = MatchPipeline::new(MemoryDonorStore::with_donors(karnataka()), geocoder(), MatchSettings::default());
    let err = pipeline.find(&MatchPlan::at_location("Atlantis", BloodType::APositive)).unwrap_err();
    assert!(matches!(err, DonorlinkError::LocationNotFound { .. }));

    let slow = FixedGeocoder::new().timing_out(10);
    let pipeline = MatchPipeline::new(MemoryDonorStore::with_donors(karnataka()), slow, MatchSettings::default());
    let err = pipeline.find(&MatchPlan::at_location("Bengaluru", BloodType::APositive)).unwrap_err();
    assert!(matches!(err, DonorlinkError::GeocodingTimeout { timeout_secs: 10, .. }));
}

#[test]
fn test_find_with_fewer_donors_than_clusters() {
    let donors = DonorCollection::from_records(vec![
        donor("Asha", BloodType::OPositive, 12.97, 77.59, 0),
        donor("Ravi", BloodType::OPositive, 12.98, 77.60, 1),
    ])
    .unwrap();
    let pipeline =
        MatchPipeline::new(MemoryDonorStore::with_donors(donors), geocoder(), MatchSettings::default());
    let plan = MatchPlan::at_location("Bengaluru", BloodType::OPositive);

    assert!(matches!(
        pipeline.find(&plan),
        Err(DonorlinkError::InvalidClusterCount { k: 3, donors: 2 })
    ));
    assert_eq!(pipeline.find(&plan.with_clustering(false)).unwrap().len(), 2);
}

#[test]
fn test_invalid_threshold_is_rejected() {
    let pipeline = MatchPipeline::new(MemoryDonorStore::new(), geocoder(), MatchSettings::default());
    let plan = MatchPlan::at_location("Bengaluru", BloodType::OPositive).with_threshold(-1.0);
    assert!(matches!(pipeline.find(&plan), Err(DonorlinkError::InvalidThreshold { .. })));
}

#[test]
fn test_cluster_covers_every_donor() {
    let pipeline =
        MatchPipeline::new(MemoryDonorStore::with_donors(karnataka()), geocoder(), MatchSettings::default());
    let report = pipeline.cluster().unwrap();

    assert_eq!(report.feature_set, FeatureSet::Full);
    assert_eq!(report.assignment.len(), 12);
    assert_eq!(report.assignment.cluster_sizes().iter().sum::<usize>(), 12);
    assert!(report.unscaled_columns().is_empty());
}

#[test]
fn test_evaluate_uses_configured_range() {
    let mut config = LayeredConfig::with_defaults();
    config.update_from_cli(CliConfigOverrides {
        evaluation_min_k: Some(2),
        evaluation_max_k: Some(4),
        ..Default::default()
    });
    let settings = MatchSettings::from_config(&config);
    let pipeline = MatchPipeline::new(MemoryDonorStore::with_donors(karnataka()), geocoder(), settings);

    let report = pipeline.evaluate().unwrap();
    let ks: Vec<usize> = report.rows.iter().map(|r| r.k).collect();
    assert_eq!(ks, vec![2, 3, 4]);
    assert_eq!(report.columns, vec!["latitude", "longitude"]);
}

#[test]
fn test_evaluate_empty_collection() {
    let pipeline = MatchPipeline::new(MemoryDonorStore::new(), geocoder(), MatchSettings::default());
    assert!(matches!(pipeline.evaluate(), Err(DonorlinkError::InsufficientData { .. })));
}

#[test]
fn test_register_geocodes_and_flushes() {
    let mut pipeline = MatchPipeline::new(MemoryDonorStore::new(), geocoder(), MatchSettings::default());

    let outcome = pipeline
        .register(Registration::new("Kiran", 29, "Male", BloodType::AbNegative, "Whitefield, Bengaluru"))
        .unwrap();
    assert_eq!(outcome.index, 0);
    assert!(outcome.geocoded);
    assert_eq!(outcome.record.coordinates, at(12.9698, 77.75));
    assert_eq!(outcome.record.activity, DonorActivity::first_time());

    let store = pipeline.into_store();
    assert_eq!(store.donors().unwrap().len(), 1);
    assert_eq!(store.flushes(), 1);
}

#[test]
fn test_register_with_coordinates_skips_geocoder() {
    let geocoder = FixedGeocoder::new().timing_out(10);
    let mut pipeline = MatchPipeline::new(MemoryDonorStore::new(), geocoder, MatchSettings::default());

    let outcome = pipeline
        .register(
            Registration::new("Meera", 33, "Female", BloodType::APositive, "Unlisted village")
                .with_coordinates(at(13.1, 77.4)),
        )
        .unwrap();
    assert!(!outcome.geocoded);
    assert_eq!(pipeline.store().donors().unwrap().len(), 1);
}

#[test]
fn test_register_on_closed_store_fails() {
    let mut store = MemoryDonorStore::new();
    store.close().unwrap();
    let mut pipeline = MatchPipeline::new(store, geocoder(), MatchSettings::default());

    let registration = Registration::new("Meera", 33, "Female", BloodType::APositive, "Bengaluru")
        .with_coordinates(at(13.1, 77.4));
    let err = pipeline.prepare_registration(registration.clone()).unwrap_err();
    assert!(matches!(err, DonorlinkError::StoreClosed));

    let err = pipeline.register(registration).unwrap_err();
    assert!(matches!(err, DonorlinkError::StoreClosed));
}

#[test]
fn test_register_unknown_location_stores_nothing() {
    let mut pipeline = MatchPipeline::new(MemoryDonorStore::new(), geocoder(), MatchSettings::default());
    let err = pipeline
        .register(Registration::new("Kiran", 29, "Male", BloodType::AbNegative, "Atlantis"))
        .unwrap_err();
    assert!(matches!(err, DonorlinkError::LocationNotFound { .. }));
    assert!(pipeline.store().donors().unwrap().is_empty());
}

#[test]
fn test_register_appends_one_row_to_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("donor_dataset.csv");

    let mut store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
    for record in karnataka().iter() {
        store.append(record.clone()).unwrap();
    }
    store.close().unwrap();
    let before: Vec<String> = std::fs::read_to_string(&path).unwrap().lines().map(String::from).collect();

    let store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
    let mut pipeline = MatchPipeline::new(store, geocoder(), MatchSettings::default());
    pipeline
        .register(Registration::new("Kiran", 29, "Male", BloodType::OPositive, "Mysuru"))
        .unwrap();
    pipeline.into_store().close().unwrap();

    let after: Vec<String> = std::fs::read_to_string(&path).unwrap().lines().map(String::from).collect();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_find_keeps_exactly_the_near_matching_donors(
        threshold_km in 0.0f64..150.0,
        blood in 0usize..8,
    ) {
        let blood_type = BloodType::ALL[blood];
        let donors = karnataka();
        let pipeline = MatchPipeline::new(
            MemoryDonorStore::with_donors(donors.clone()),
            geocoder(),
            MatchSettings::default(),
        );

        let plan = MatchPlan::at_coordinates(at(12.97, 77.59), blood_type)
            .with_threshold(threshold_km)
            .with_clustering(false);
        let result = pipeline.find(&plan).unwrap();

        let mut expected = Vec::new();
        for (index, donor) in donors.iter().enumerate() {
            let distance = donorlink_geo::geodesic_km(&at(12.97, 77.59), &donor.coordinates);
            if donor.blood_type == blood_type && distance <= threshold_km {
                expected.push(index);
            }
        }
        let got: Vec<usize> = result.matches.iter().map(|m| m.index).collect();
        prop_assert_eq!(got, expected);
        prop_assert!(result.matches.iter().all(|m| m.cluster.is_none()));
    }
}
