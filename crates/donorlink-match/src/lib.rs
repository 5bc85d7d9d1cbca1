//! Donorlink Match - Donor matching use cases
//!
//! This crate orchestrates geocoding, clustering, distance filtering and
//! storage into the find, cluster, evaluate and register flows.

pub mod models;
pub mod pipeline;

pub use models::{
    ClusterReport, DonorMatch, MatchOrigin, MatchPlan, MatchResult, Registration,
    RegistrationOutcome,
};
pub use pipeline::{MatchPipeline, MatchSettings};
