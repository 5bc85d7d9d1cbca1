use crate::distance::distance_km;
use donorlink_core::error::Result;
use donorlink_core::models::{DistanceMethod, DonorQuery, DonorRecord};
use serde::Serialize;

/// A donor annotated with its distance from a query origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearbyDonor<'a> {
    /// Position of the donor in the collection
    pub index: usize,

    pub donor: &'a DonorRecord,

    /// Surface distance from the query origin, in kilometers
    pub distance_km: f64,
}

/// Measure the distance from the query origin to every donor, in collection order
pub fn measure_donors<'a>(
    donors: &'a [DonorRecord],
    query: &DonorQuery,
    method: DistanceMethod,
) -> Vec<NearbyDonor<'a>> {
    donors
        .iter()
        .enumerate()
        .map(|(index, donor)| NearbyDonor {
            index,
            donor,
            distance_km: distance_km(&query.origin, &donor.coordinates, method),
        })
        .collect()
}

/// Check whether a measured donor satisfies the query's distance and blood type
pub fn satisfies_query(candidate: &NearbyDonor<'_>, query: &DonorQuery) -> bool {
    candidate.distance_km <= query.threshold_km && candidate.donor.blood_type == query.blood_type
}

/// Keep the donors within `query.threshold_km` whose blood type matches.
///
/// Relative order of the collection is preserved. An empty result is a
/// normal outcome.
pub fn filter_donors<'a>(
    donors: &'a [DonorRecord],
    query: &DonorQuery,
    method: DistanceMethod,
) -> Result<Vec<NearbyDonor<'a>>> {
    query.validate()?;

    Ok(measure_donors(donors, query, method)
        .into_iter()
        .filter(|candidate| satisfies_query(candidate, query))
        .collect())
}
