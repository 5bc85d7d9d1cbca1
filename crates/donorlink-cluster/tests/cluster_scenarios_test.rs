//! End-to-end clustering scenarios over donor records

use donorlink_cluster::{evaluate, kmeans, normalize, FeatureMatrix, KMeansConfig};
use donorlink_core::models::{
    BloodType, Coordinates, DegeneratePolicy, DonorActivity, DonorCollection, DonorRecord, FeatureSet,
};

fn donor(i: usize, lat: f64, lon: f64) -> DonorRecord {
    DonorRecord::new(
        format!("Donor {}", i),
        20 + (i as u32 % 40),
        if i % 2 == 0 { "Female" } else { "Male" },
        BloodType::ALL[i % BloodType::ALL.len()],
        "synthetic",
        Coordinates::new(lat, lon).unwrap(),
    )
    .with_activity(DonorActivity::new(
        (i % 12) as f64,
        (i % 7) as f64 + 1.0,
        ((i % 7) as f64 + 1.0) * 250.0,
        (i % 30) as f64 + 12.0,
    ))
}

/// Two well-separated groups of donors: around Bengaluru and around Delhi
fn two_city_collection() -> DonorCollection {
    let mut records = Vec::new();
    for i in 0..15 {
        let dx = (i % 5) as f64 * 0.02;
        let dy = (i / 5) as f64 * 0.02;
        records.push(donor(i, 12.90 + dx, 77.55 + dy));
        records.push(donor(i + 15, 28.60 + dx, 77.15 + dy));
    }
    DonorCollection::from_records(records).unwrap()
}

#[test]
fn test_ten_donors_three_clusters_full_features() {
    let records: Vec<DonorRecord> =
        (0..10).map(|i| donor(i, 12.0 + i as f64 * 0.3, 77.0 + (i % 3) as f64 * 0.4)).collect();
    let collection = DonorCollection::from_records(records).unwrap();

    let matrix = FeatureMatrix::from_donors(collection.as_slice(), FeatureSet::Full);
    let normalized = normalize(&matrix, DegeneratePolicy::Reject).unwrap();
    let assignment = kmeans(&normalized.matrix, &KMeansConfig::default()).unwrap();

    assert_eq!(assignment.len(), 10);
    assert!(assignment.labels().iter().all(|&label| label <= 2));
}

#[test]
fn test_clustering_is_reproducible_for_a_seed() {
    let collection = two_city_collection();
    let matrix = FeatureMatrix::from_donors(collection.as_slice(), FeatureSet::Full);
    let normalized = normalize(&matrix, DegeneratePolicy::LeaveUnscaled).unwrap();

    let config = KMeansConfig::default().with_seed(7);
    let first = kmeans(&normalized.matrix, &config).unwrap();
    let second = kmeans(&normalized.matrix, &config).unwrap();

    assert_eq!(first.labels(), second.labels());
    assert_eq!(first.centroids(), second.centroids());
}

#[test]
fn test_quality_scores_favour_the_true_group_count() {
    let collection = two_city_collection();
    let matrix = FeatureMatrix::from_donors(collection.as_slice(), FeatureSet::Spatial);

    let report = evaluate(&matrix, 2..=4, &KMeansConfig::default()).unwrap();
    let k2 = report.row(2).unwrap();
    let k3 = report.row(3).unwrap();
    let k4 = report.row(4).unwrap();

    assert!(k2.inertia > k3.inertia, "inertia should drop from k=2 to k=3");
    assert!(k2.silhouette.unwrap() > k4.silhouette.unwrap());
    assert!(k2.davies_bouldin.unwrap() < k4.davies_bouldin.unwrap());
}

#[test]
fn test_two_groups_are_split_by_city() {
    let collection = two_city_collection();
    let matrix = FeatureMatrix::from_donors(collection.as_slice(), FeatureSet::Spatial);
    let assignment = kmeans(&matrix, &KMeansConfig::default().with_k(2)).unwrap();

    // Records alternate Bengaluru, Delhi
    let bengaluru = assignment.label(0).unwrap();
    let delhi = assignment.label(1).unwrap();
    assert_ne!(bengaluru, delhi);
    for (i, &label) in assignment.labels().iter().enumerate() {
        assert_eq!(label, if i % 2 == 0 { bengaluru } else { delhi });
    }
}
