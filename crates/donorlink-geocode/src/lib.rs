//! Donorlink Geocode - Location text to coordinates
//!
//! This crate defines the geocoding port and its adapters: a live
//! Nominatim client and a fixed in-memory table for offline use and tests.

pub mod fixed;
pub mod nominatim;
pub mod ports;

// Re-export main types
pub use fixed::FixedGeocoder;
pub use nominatim::NominatimGeocoder;
pub use ports::Geocoder;
