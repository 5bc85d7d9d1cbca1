pub mod donor;
pub mod options;
pub mod query;

pub use donor::{BloodType, Coordinates, DonorActivity, DonorCollection, DonorProfile, DonorRecord};
pub use options::{DegeneratePolicy, DistanceMethod, FeatureSet, RowPolicy};
pub use query::DonorQuery;
