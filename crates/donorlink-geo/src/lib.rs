//! Donorlink Geo - Surface distance and proximity filtering
//!
//! This crate measures distances between donor coordinates on the Earth's
//! surface and selects the donors near a requester.

pub mod distance;
pub mod filter;

pub use distance::{distance_km, geodesic_km, haversine_km};
pub use filter::{filter_donors, NearbyDonor};
