use chrono::Utc;
use donorlink_cluster::{evaluate, kmeans, normalize, EvaluationReport, FeatureMatrix, KMeansConfig};
use donorlink_core::config::LayeredConfig;
use donorlink_core::error::{DonorlinkError, Result};
use donorlink_core::models::{
    DegeneratePolicy, DistanceMethod, DonorQuery, DonorRecord, FeatureSet,
};
use donorlink_geo::filter_donors;
use donorlink_geocode::Geocoder;
use donorlink_store::DonorStore;
use std::ops::RangeInclusive;

use crate::models::{
    ClusterReport, DonorMatch, MatchOrigin, MatchPlan, MatchResult, Registration,
    RegistrationOutcome,
};

/// Algorithm settings shared by the matching flows
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    pub kmeans: KMeansConfig,
    pub degenerate: DegeneratePolicy,
    pub distance_method: DistanceMethod,
    /// Features clustered when matching
    pub feature_set: FeatureSet,
    pub evaluation_range: RangeInclusive<usize>,
    /// Features scored by `evaluate`; `Spatial` is scored on raw coordinates
    pub evaluation_features: FeatureSet,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            kmeans: KMeansConfig::default(),
            degenerate: DegeneratePolicy::default(),
            distance_method: DistanceMethod::default(),
            feature_set: FeatureSet::Full,
            evaluation_range: 2..=9,
            evaluation_features: FeatureSet::Spatial,
        }
    }
}

impl MatchSettings {
    /// Build settings from resolved configuration
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            kmeans: KMeansConfig::default()
                .with_k(config.cluster_count.value)
                .with_seed(config.seed.value)
                .with_max_iterations(config.max_iterations.value)
                .with_n_init(config.n_init.value),
            degenerate: config.degenerate_features.value,
            distance_method: config.distance_method.value,
            feature_set: FeatureSet::Full,
            evaluation_range: config.evaluation_min_k.value..=config.evaluation_max_k.value,
            evaluation_features: config.evaluation_features.value,
        }
    }
}

/// Matching pipeline over a donor store and a geocoder
pub struct MatchPipeline<S, G>
where
    S: DonorStore,
    G: Geocoder,
{
    store: S,
    geocoder: G,
    settings: MatchSettings,
}

impl<S, G> MatchPipeline<S, G>
where
    S: DonorStore,
    G: Geocoder,
{
    /// Create a new matching pipeline
    pub fn new(store: S, geocoder: G, settings: MatchSettings) -> Self {
        Self { store, geocoder, settings }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back, e.g. to close it
    pub fn into_store(self) -> S {
        self.store
    }

    /// Find donors of the requested blood type near the plan's origin
    ///
    /// The whole collection is clustered first (unless the plan disables it)
    /// so every match carries its cluster id. An empty collection yields an
    /// empty result without clustering.
    pub fn find(&self, plan: &MatchPlan) -> Result<MatchResult> {
        let (location, origin) = match &plan.origin {
            MatchOrigin::Location(text) => (Some(text.clone()), self.geocoder.resolve(text)?),
            MatchOrigin::Coordinates(coords) => (None, *coords),
        };
        let query = DonorQuery::new(origin, plan.threshold_km, plan.blood_type)?;

        let donors = self.store.donors()?.as_slice();
        let labels = if plan.cluster && !donors.is_empty() {
            let report = self.cluster_records(donors)?;
            Some((report.assignment.k(), report.assignment.labels().to_vec()))
        } else {
            None
        };

        let matches: Vec<DonorMatch> = filter_donors(donors, &query, self.settings.distance_method)?
            .into_iter()
            .map(|nearby| DonorMatch {
                index: nearby.index,
                donor: nearby.donor.clone(),
                distance_km: nearby.distance_km,
                cluster: labels.as_ref().map(|(_, labels)| labels[nearby.index]),
            })
            .collect();

        tracing::info!(
            "Found {} {} donors within {} km of ({}, {})",
            matches.len(),
            plan.blood_type,
            plan.threshold_km,
            origin.latitude,
            origin.longitude
        );

        Ok(MatchResult {
            location,
            origin,
            threshold_km: plan.threshold_km,
            blood_type: plan.blood_type,
            donors_considered: donors.len(),
            cluster_count: labels.map(|(k, _)| k),
            matches,
            generated_at: Utc::now(),
        })
    }

    /// Cluster the whole collection on the matching feature set
    pub fn cluster(&self) -> Result<ClusterReport> {
        let donors = self.store.donors()?.as_slice();
        self.cluster_records(donors)
    }

    fn cluster_records(&self, donors: &[DonorRecord]) -> Result<ClusterReport> {
        let matrix = FeatureMatrix::from_donors(donors, self.settings.feature_set);
        let normalized = normalize(&matrix, self.settings.degenerate)?;
        let assignment = kmeans(&normalized.matrix, &self.settings.kmeans)?;

        tracing::debug!(
            k = assignment.k(),
            inertia = assignment.inertia(),
            iterations = assignment.iterations(),
            "clustered {} donors",
            donors.len()
        );

        Ok(ClusterReport {
            feature_set: self.settings.feature_set,
            assignment,
            stats: normalized.stats,
            generated_at: Utc::now(),
        })
    }

    /// Score K-means over the configured range of cluster counts
    pub fn evaluate(&self) -> Result<EvaluationReport> {
        let donors = self.store.donors()?.as_slice();
        if donors.is_empty() {
            return Err(DonorlinkError::InsufficientData {
                reason: "cannot evaluate clustering of an empty donor collection".to_string(),
            });
        }

        let matrix = FeatureMatrix::from_donors(donors, self.settings.evaluation_features);
        let matrix = match self.settings.evaluation_features {
            FeatureSet::Spatial => matrix,
            FeatureSet::Full => normalize(&matrix, self.settings.degenerate)?.matrix,
        };
        evaluate(&matrix, self.settings.evaluation_range.clone(), &self.settings.kmeans)
    }

    /// Resolve where a registration will be stored, without storing it
    pub fn prepare_registration(&self, registration: Registration) -> Result<(DonorRecord, bool)> {
        let row = self.store.donors()?.len();
        let (coordinates, geocoded) = match registration.coordinates {
            Some(coords) => (coords, false),
            None => (self.geocoder.resolve(&registration.location_text)?, true),
        };
        let record = registration.into_record(coordinates);
        record.check().map_err(|reason| DonorlinkError::InvalidDonorRecord { row, reason })?;
        Ok((record, geocoded))
    }

    /// Register a donor: geocode if needed, append and flush
    pub fn register(&mut self, registration: Registration) -> Result<RegistrationOutcome> {
        let (record, geocoded) = self.prepare_registration(registration)?;
        let index = self.store.append(record.clone())?;
        self.store.flush()?;

        tracing::info!("Registered donor #{} ({}, {})", index, record.name, record.blood_type);
        Ok(RegistrationOutcome { index, record, geocoded })
    }
}
